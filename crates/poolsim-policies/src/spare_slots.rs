//! Spare-slot threshold scaling.
//!
//! Adds a host once the number of unit slots that could still take a new
//! unit drops below a threshold. Unlike [`UtilizationThreshold`], warm and
//! provisioning units count against the remaining room.
//!
//! [`UtilizationThreshold`]: crate::UtilizationThreshold

use crate::traits::*;

/// Scale up when available unit slots fall below a count.
pub struct SpareSlotThreshold {
    min_spare_slots: u32,
}

impl SpareSlotThreshold {
    pub fn new(min_spare_slots: u32) -> Self {
        Self { min_spare_slots }
    }
}

impl Default for SpareSlotThreshold {
    fn default() -> Self {
        Self::new(TriggerParams::default().spare_slot_threshold)
    }
}

impl ScalingTrigger for SpareSlotThreshold {
    fn evaluate(&mut self, view: &CapacityView) -> ScalingDecision {
        if view.available_unit_slots() < self.min_spare_slots {
            ScalingDecision::AddHost
        } else {
            ScalingDecision::Hold
        }
    }

    fn name(&self) -> &str {
        "spare_slots"
    }
}
