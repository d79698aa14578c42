//! Capacity state of the simulated pool.
//!
//! [`CapacityState`] holds every occupancy counter the allocation cascade
//! and the scaling controller read and mutate. It is a plain value owned by
//! the engine and handed to handlers by `&mut`, so independent runs never
//! share state.

use crate::config::CapacitySection;
use poolsim_policies::CapacityView;
use serde::{Deserialize, Serialize};

/// Occupancy counters for hosts and units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityState {
    /// Hosts able to run units.
    pub running_hosts: u32,
    /// Dormant hosts that can be promoted faster than a cold host.
    pub standby_hosts: u32,
    /// Hosts currently provisioning.
    pub pending_hosts: u32,
    /// Idle units ready for instant assignment.
    pub warm_units: u32,
    /// Units currently starting, for a request or for the warm pool.
    pub pending_units: u32,
    /// Units serving a live session.
    pub active_sessions: u32,
    /// Unit slots per host.
    pub units_per_host: u32,
    /// Ceiling on running plus pending hosts.
    pub max_hosts: u32,
    /// Standby pool target.
    pub standby_target: u32,
    /// Warm pool target.
    pub warm_target: u32,
}

impl CapacityState {
    /// Initial state for a run.
    ///
    /// The warm pool starts at its target, clamped to the slots that exist
    /// on the initial hosts.
    pub fn new(capacity: &CapacitySection) -> Self {
        let initial_slots = capacity.initial_hosts.saturating_mul(capacity.units_per_host);
        Self {
            running_hosts: capacity.initial_hosts,
            standby_hosts: capacity.standby_pool_size,
            pending_hosts: 0,
            warm_units: capacity.warm_pool_size.min(initial_slots),
            pending_units: 0,
            active_sessions: 0,
            units_per_host: capacity.units_per_host,
            max_hosts: capacity.max_hosts,
            standby_target: capacity.standby_pool_size,
            warm_target: capacity.warm_pool_size,
        }
    }

    /// Unit slots on running hosts.
    pub fn total_unit_capacity(&self) -> u32 {
        self.running_hosts.saturating_mul(self.units_per_host)
    }

    /// Slots claimed by active, warm and provisioning units.
    pub fn used_unit_slots(&self) -> u32 {
        self.active_sessions + self.warm_units + self.pending_units
    }

    /// Slots free for a new unit.
    pub fn available_unit_slots(&self) -> u32 {
        self.total_unit_capacity()
            .saturating_sub(self.used_unit_slots())
    }

    /// Hosts that may still be added without crossing the ceiling.
    pub fn headroom_hosts(&self) -> u32 {
        self.max_hosts
            .saturating_sub(self.running_hosts + self.pending_hosts)
    }

    /// Fraction of capacity serving sessions; 1.0 when there is none.
    pub fn utilization(&self) -> f64 {
        self.view().utilization()
    }

    /// Read-only view for scaling triggers.
    pub fn view(&self) -> CapacityView {
        CapacityView {
            running_hosts: self.running_hosts,
            standby_hosts: self.standby_hosts,
            pending_hosts: self.pending_hosts,
            warm_units: self.warm_units,
            pending_units: self.pending_units,
            active_sessions: self.active_sessions,
            units_per_host: self.units_per_host,
            max_hosts: self.max_hosts,
        }
    }

    /// Check the occupancy invariants, describing the first violation.
    pub fn check_invariants(&self) -> Result<(), String> {
        if self.used_unit_slots() > self.total_unit_capacity() {
            return Err(format!(
                "unit slots over-committed: active={} warm={} pending={} > capacity={}",
                self.active_sessions,
                self.warm_units,
                self.pending_units,
                self.total_unit_capacity(),
            ));
        }
        if self.running_hosts + self.pending_hosts > self.max_hosts {
            return Err(format!(
                "host ceiling exceeded: running={} pending={} > max={}",
                self.running_hosts, self.pending_hosts, self.max_hosts,
            ));
        }
        if self.standby_hosts > self.standby_target {
            return Err(format!(
                "standby pool above target: {} > {}",
                self.standby_hosts, self.standby_target,
            ));
        }
        Ok(())
    }
}
