//! Utilization-threshold scaling.
//!
//! Adds a host once the share of unit slots serving live sessions exceeds a
//! configured fraction. Idle warm units do not count as utilized.

use crate::traits::*;

/// Scale up when `active_sessions / capacity` exceeds a fraction.
pub struct UtilizationThreshold {
    scale_up_utilization: f64,
}

impl UtilizationThreshold {
    pub fn new(scale_up_utilization: f64) -> Self {
        Self {
            scale_up_utilization,
        }
    }
}

impl Default for UtilizationThreshold {
    fn default() -> Self {
        Self::new(TriggerParams::default().scale_up_utilization)
    }
}

impl ScalingTrigger for UtilizationThreshold {
    fn evaluate(&mut self, view: &CapacityView) -> ScalingDecision {
        if view.utilization() > self.scale_up_utilization {
            ScalingDecision::AddHost
        } else {
            ScalingDecision::Hold
        }
    }

    fn name(&self) -> &str {
        "utilization"
    }
}
