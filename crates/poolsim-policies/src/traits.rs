//! Scaling trigger trait definitions.
//!
//! All proactive scaling strategies implement the [`ScalingTrigger`] trait,
//! which receives a read-only [`CapacityView`] and decides whether the pool
//! should start growing by one host.

use serde::{Deserialize, Serialize};

/// Read-only snapshot of pool capacity, provided to scaling triggers.
///
/// Carries only the counters a trigger needs, not the simulation's event
/// bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityView {
    pub running_hosts: u32,
    pub standby_hosts: u32,
    pub pending_hosts: u32,
    pub warm_units: u32,
    pub pending_units: u32,
    pub active_sessions: u32,
    pub units_per_host: u32,
    pub max_hosts: u32,
}

impl CapacityView {
    /// Unit slots on hosts that are currently running.
    pub fn total_unit_capacity(&self) -> u32 {
        self.running_hosts.saturating_mul(self.units_per_host)
    }

    /// Unit slots claimed by sessions, idle warm units, or provisioning units.
    pub fn used_unit_slots(&self) -> u32 {
        self.active_sessions + self.warm_units + self.pending_units
    }

    /// Unit slots still free for a new unit.
    pub fn available_unit_slots(&self) -> u32 {
        self.total_unit_capacity()
            .saturating_sub(self.used_unit_slots())
    }

    /// Fraction of unit capacity serving live sessions.
    ///
    /// A pool with no capacity is treated as fully utilized.
    pub fn utilization(&self) -> f64 {
        let total = self.total_unit_capacity();
        if total == 0 {
            return 1.0;
        }
        self.active_sessions as f64 / total as f64
    }
}

/// Decision returned by a scaling trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalingDecision {
    /// Leave host count unchanged.
    Hold,
    /// Start one more host (standby promotion or cold provisioning).
    AddHost,
}

/// Threshold parameters shared by the built-in triggers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TriggerParams {
    /// Utilization fraction above which the utilization trigger fires.
    pub scale_up_utilization: f64,
    /// Spare unit slots below which the spare-slot trigger fires.
    pub spare_slot_threshold: u32,
}

impl Default for TriggerParams {
    fn default() -> Self {
        Self {
            scale_up_utilization: 0.7,
            spare_slot_threshold: 2,
        }
    }
}

/// The proactive scaling trait.
///
/// The simulator calls [`ScalingTrigger::evaluate`] on every periodic check
/// and after every request arrival. Whether a host is actually added is
/// still up to the caller: it skips scaling while a host is already
/// provisioning or when the host ceiling is reached.
pub trait ScalingTrigger: Send + Sync {
    /// Decide whether capacity should grow.
    fn evaluate(&mut self, view: &CapacityView) -> ScalingDecision;

    /// Human-readable name for reports.
    fn name(&self) -> &str;
}
