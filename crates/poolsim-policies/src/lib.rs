//! Proactive scaling triggers for poolsim.
//!
//! This crate provides the [`ScalingTrigger`] trait and the built-in
//! strategies the simulator can be configured with:
//!
//! | Trigger | Fires when | Models |
//! |---------|------------|--------|
//! | [`UtilizationThreshold`] | active / capacity > fraction | Target-tracking autoscaling |
//! | [`SpareSlotThreshold`] | free unit slots < count | Capacity-provider headroom |
//! | [`ReactiveOnly`] | never | Scale only on demand misses |

pub mod reactive_only;
pub mod spare_slots;
pub mod traits;
pub mod utilization;

pub use reactive_only::ReactiveOnly;
pub use spare_slots::SpareSlotThreshold;
pub use traits::*;
pub use utilization::UtilizationThreshold;

/// Create a scaling trigger by name.
pub fn trigger_by_name(name: &str, params: &TriggerParams) -> Option<Box<dyn ScalingTrigger>> {
    match name {
        "utilization" => Some(Box::new(UtilizationThreshold::new(
            params.scale_up_utilization,
        ))),
        "spare_slots" => Some(Box::new(SpareSlotThreshold::new(
            params.spare_slot_threshold,
        ))),
        "reactive_only" => Some(Box::new(ReactiveOnly::new())),
        _ => None,
    }
}

/// List all available built-in trigger names.
pub fn available_triggers() -> Vec<&'static str> {
    vec!["utilization", "spare_slots", "reactive_only"]
}
