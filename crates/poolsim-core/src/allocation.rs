//! Allocation cascade: resolve one request to a capacity tier.
//!
//! Tiers are tried in strict priority order and the first match wins:
//!
//! 1. an idle warm unit,
//! 2. a free unit slot on a running host,
//! 3. a standby host promoted to running,
//! 4. a cold-provisioned host,
//! 5. the backlog, when the host ceiling leaves no other option.
//!
//! [`allocate`] mutates the [`CapacityState`] and returns the events the
//! driver must schedule. It never fails: a busier pool only means a longer
//! wait.

use crate::capacity::CapacityState;
use crate::config::LatencySection;
use crate::event::{Deferred, SimEvent};
use serde::{Deserialize, Serialize};

/// Capacity tier a request was served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationTier {
    WarmUnit,
    SpareSlot,
    StandbyHost,
    ColdHost,
    Backlogged,
}

impl AllocationTier {
    /// All tiers in cascade order.
    pub const ALL: [AllocationTier; 5] = [
        AllocationTier::WarmUnit,
        AllocationTier::SpareSlot,
        AllocationTier::StandbyHost,
        AllocationTier::ColdHost,
        AllocationTier::Backlogged,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            AllocationTier::WarmUnit => "warm_unit",
            AllocationTier::SpareSlot => "spare_slot",
            AllocationTier::StandbyHost => "standby_host",
            AllocationTier::ColdHost => "cold_host",
            AllocationTier::Backlogged => "backlogged",
        }
    }
}

/// Outcome of allocating one request.
#[derive(Debug, Clone, PartialEq)]
pub struct Allocation {
    pub tier: AllocationTier,
    /// Wait before the unit is usable. `None` while the request sits in the
    /// backlog; its wait is only known once a unit frees up.
    pub wait_secs: Option<f64>,
    /// Events to schedule relative to the current time.
    pub follow_ups: Vec<Deferred>,
}

/// Run the cascade for `request_id`.
///
/// `active_sessions` is incremented here only for the warm-unit tier; the
/// other tiers increment it when their `UnitReadyForRequest` event fires.
pub fn allocate(
    state: &mut CapacityState,
    latency: &LatencySection,
    request_id: u64,
) -> Allocation {
    if state.warm_units > 0 {
        state.warm_units -= 1;
        state.active_sessions += 1;
        return Allocation {
            tier: AllocationTier::WarmUnit,
            wait_secs: Some(latency.warm_assign_secs),
            follow_ups: Vec::new(),
        };
    }

    if state.available_unit_slots() > 0 {
        state.pending_units += 1;
        return Allocation {
            tier: AllocationTier::SpareSlot,
            wait_secs: Some(latency.new_unit_secs),
            follow_ups: vec![Deferred::new(
                latency.new_unit_secs,
                SimEvent::UnitReadyForRequest { request_id },
            )],
        };
    }

    if state.headroom_hosts() == 0 {
        return Allocation {
            tier: AllocationTier::Backlogged,
            wait_secs: None,
            follow_ups: Vec::new(),
        };
    }

    let (tier, host_secs) = if state.standby_hosts > 0 {
        state.standby_hosts -= 1;
        (AllocationTier::StandbyHost, latency.standby_host_secs)
    } else {
        (AllocationTier::ColdHost, latency.cold_host_secs)
    };
    state.pending_hosts += 1;

    let from_standby = tier == AllocationTier::StandbyHost;
    let wait = host_secs + latency.new_unit_secs;
    let mut follow_ups = vec![
        Deferred::new(
            host_secs,
            SimEvent::HostReady {
                reserved_for: Some(request_id),
                from_standby,
            },
        ),
        Deferred::new(wait, SimEvent::UnitReadyForRequest { request_id }),
    ];
    if from_standby {
        follow_ups.push(Deferred::new(
            latency.standby_restock_delay_secs,
            SimEvent::StandbyReplenish,
        ));
    }

    Allocation {
        tier,
        wait_secs: Some(wait),
        follow_ups,
    }
}
