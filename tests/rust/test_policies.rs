/// Integration tests for the scaling triggers inside full runs.
use poolsim_core::config::SimConfig;
use poolsim_core::run_simulation;
use poolsim_policies::*;

fn loaded_config(trigger: &str) -> SimConfig {
    let mut config = SimConfig::default();
    config.simulation.duration_hours = 2.0;
    config.capacity.units_per_host = 4;
    config.capacity.initial_hosts = 1;
    config.capacity.max_hosts = 40;
    config.capacity.standby_pool_size = 2;
    config.scaling.trigger = trigger.to_string();
    config.scaling.scale_up_utilization = 0.5;
    config.scaling.spare_slot_threshold = 3;
    config.workload.requests_per_minute = 10.0;
    config
}

#[test]
fn test_all_triggers_run() {
    for name in available_triggers() {
        let result = run_simulation(loaded_config(name), 42).unwrap();
        assert_eq!(result.trigger, name);
        assert!(result.total_requests > 0, "{} saw no requests", name);
    }
}

#[test]
fn test_reactive_only_never_scales_ahead() {
    let result = run_simulation(loaded_config("reactive_only"), 42).unwrap();
    assert_eq!(result.proactive_hosts, 0);

    // Every extra host was started by a request that needed it.
    let grown = (result.peak_running_hosts - 1) as u64;
    assert!(grown <= result.tiers.standby_host + result.tiers.cold_host);
}

#[test]
fn test_proactive_triggers_add_hosts() {
    for name in ["utilization", "spare_slots"] {
        let result = run_simulation(loaded_config(name), 42).unwrap();
        assert!(result.proactive_hosts > 0, "{} never scaled", name);
    }
}

#[test]
fn test_triggers_see_same_workload() {
    let a = run_simulation(loaded_config("utilization"), 9).unwrap();
    let b = run_simulation(loaded_config("reactive_only"), 9).unwrap();
    assert_eq!(a.total_requests, b.total_requests);
}

#[test]
fn test_trigger_by_name() {
    let params = TriggerParams::default();
    for name in available_triggers() {
        let trigger = trigger_by_name(name, &params);
        assert!(trigger.is_some(), "trigger {} not found", name);
        assert_eq!(trigger.unwrap().name(), name);
    }
    assert!(trigger_by_name("nonexistent", &params).is_none());
}

#[test]
fn test_utilization_trigger_thresholds() {
    let mut trigger = UtilizationThreshold::new(0.7);
    let view = CapacityView {
        running_hosts: 2,
        standby_hosts: 0,
        pending_hosts: 0,
        warm_units: 0,
        pending_units: 0,
        active_sessions: 6,
        units_per_host: 4,
        max_hosts: 10,
    };
    // 6 / 8 = 0.75
    assert_eq!(trigger.evaluate(&view), ScalingDecision::AddHost);

    let calmer = CapacityView {
        active_sessions: 5,
        ..view
    };
    assert_eq!(trigger.evaluate(&calmer), ScalingDecision::Hold);
}
