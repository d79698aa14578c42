//! Purely reactive scaling: never grow ahead of demand.
//!
//! Hosts are only added by the allocation cascade when a request finds no
//! warm unit and no spare slot. Useful as a baseline when comparing
//! proactive policies.

use crate::traits::*;

/// Trigger that always holds.
#[derive(Debug, Default)]
pub struct ReactiveOnly;

impl ReactiveOnly {
    pub fn new() -> Self {
        Self
    }
}

impl ScalingTrigger for ReactiveOnly {
    fn evaluate(&mut self, _view: &CapacityView) -> ScalingDecision {
        ScalingDecision::Hold
    }

    fn name(&self) -> &str {
        "reactive_only"
    }
}
