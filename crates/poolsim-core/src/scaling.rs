//! Replenishment and proactive scaling.
//!
//! The [`ScalingController`] keeps the warm-unit pool and the standby-host
//! pool near their targets and asks the configured [`ScalingTrigger`]
//! whether to grow ahead of demand. It never rolls anything back: requests
//! that would overshoot capacity are simply not issued.

use crate::capacity::CapacityState;
use crate::config::{ConfigError, LatencySection, SimConfig};
use crate::event::{Deferred, SimEvent};
use log::debug;
use poolsim_policies::{trigger_by_name, ScalingDecision, ScalingTrigger};

/// Background capacity manager for one run.
pub struct ScalingController {
    trigger: Box<dyn ScalingTrigger>,
    /// Hosts started by the trigger rather than by the cascade.
    proactive_hosts: u64,
}

impl ScalingController {
    pub fn new(trigger: Box<dyn ScalingTrigger>) -> Self {
        Self {
            trigger,
            proactive_hosts: 0,
        }
    }

    /// Build the controller for the trigger named in `config`.
    pub fn from_config(config: &SimConfig) -> Result<Self, ConfigError> {
        let trigger = trigger_by_name(&config.scaling.trigger, &config.trigger_params())
            .ok_or_else(|| {
                ConfigError::Validation(format!(
                    "Unknown scaling trigger: {}",
                    config.scaling.trigger
                ))
            })?;
        Ok(Self::new(trigger))
    }

    pub fn trigger_name(&self) -> &str {
        self.trigger.name()
    }

    /// Hosts added proactively so far.
    pub fn proactive_hosts(&self) -> u64 {
        self.proactive_hosts
    }

    /// Start units to bring the warm pool back to target.
    ///
    /// Units already provisioning count toward the target, and no more
    /// units are started than there are free slots.
    pub fn replenish_warm_units(
        &self,
        state: &mut CapacityState,
        latency: &LatencySection,
    ) -> Vec<Deferred> {
        let needed = state
            .warm_target
            .saturating_sub(state.warm_units + state.pending_units);
        let to_start = needed.min(state.available_unit_slots());
        if to_start > 0 {
            debug!(
                "replenishing {} warm unit(s) (warm={}, pending={})",
                to_start, state.warm_units, state.pending_units
            );
        }
        state.pending_units += to_start;
        (0..to_start)
            .map(|_| Deferred::new(latency.new_unit_secs, SimEvent::WarmUnitReady))
            .collect()
    }

    /// Ask the trigger whether to add a host, and start one if so.
    ///
    /// Skipped while any host is provisioning or when the ceiling is
    /// reached. A standby host is preferred over a cold one.
    pub fn check_proactive_scaling(
        &mut self,
        state: &mut CapacityState,
        latency: &LatencySection,
    ) -> Vec<Deferred> {
        if state.pending_hosts > 0 || state.headroom_hosts() == 0 {
            return Vec::new();
        }
        if self.trigger.evaluate(&state.view()) == ScalingDecision::Hold {
            return Vec::new();
        }

        self.proactive_hosts += 1;
        state.pending_hosts += 1;
        if state.standby_hosts > 0 {
            state.standby_hosts -= 1;
            debug!(
                "{}: promoting standby host (spare slots={})",
                self.trigger.name(),
                state.available_unit_slots()
            );
            vec![
                Deferred::new(
                    latency.standby_host_secs,
                    SimEvent::HostReady {
                        reserved_for: None,
                        from_standby: true,
                    },
                ),
                Deferred::new(latency.standby_restock_delay_secs, SimEvent::StandbyReplenish),
            ]
        } else {
            debug!(
                "{}: cold-provisioning host (spare slots={})",
                self.trigger.name(),
                state.available_unit_slots()
            );
            vec![Deferred::new(
                latency.cold_host_secs,
                SimEvent::HostReady {
                    reserved_for: None,
                    from_standby: false,
                },
            )]
        }
    }

    /// Refill the standby pool to its target in one step.
    pub fn restock_standby(&self, state: &mut CapacityState) {
        if state.standby_hosts < state.standby_target {
            debug!(
                "restocking standby pool {} -> {}",
                state.standby_hosts, state.standby_target
            );
            state.standby_hosts = state.standby_target;
        }
    }
}
