/// Integration tests for the simulation engine.
use poolsim_core::config::SimConfig;
use poolsim_core::{AllocationTier, DriverState, SimulationEngine, SimulationResult};

fn burst_config() -> SimConfig {
    SimConfig::from_str(
        r#"
[simulation]
name = "burst"
seed = 42
duration_hours = 1.0

[latency]
warm_assign_secs = 0.26
new_unit_secs = 10.0

[capacity]
units_per_host = 7
initial_hosts = 1
warm_pool_size = 2

[workload]
requests_per_minute = 0.0
"#,
    )
    .unwrap()
}

fn busy_config() -> SimConfig {
    SimConfig::from_str(
        r#"
[simulation]
name = "busy"
duration_hours = 2.0

[latency]
warm_assign_secs = 0.26

[capacity]
units_per_host = 4
initial_hosts = 1
max_hosts = 30
warm_pool_size = 3
standby_pool_size = 2

[workload]
requests_per_minute = 20.0
"#,
    )
    .unwrap()
}

fn assert_invariants(result: &SimulationResult, units_per_host: u32, max_hosts: u32) {
    for snap in &result.snapshots {
        let used = snap.active_sessions + snap.warm_units + snap.pending_units;
        assert!(
            used <= snap.running_hosts * units_per_host,
            "over-committed at {}s: {:?}",
            snap.time_secs,
            snap
        );
        assert!(snap.running_hosts <= max_hosts);
        assert!(snap.running_hosts + snap.pending_hosts <= max_hosts);
    }
}

#[test]
fn test_burst_of_three_requests() {
    let mut engine = SimulationEngine::new(burst_config(), 42).unwrap();
    engine.load_arrivals(&[5.0, 5.0, 5.0]);
    let result = engine.run();

    assert_eq!(engine.state(), DriverState::Drained);
    assert_eq!(result.total_requests, 3);
    let waits = result.wait_times();
    assert_eq!(waits[0], 0.26);
    assert_eq!(waits[1], 0.26);
    assert_eq!(waits[2], 10.0);
    assert_eq!(result.requests[2].tier, AllocationTier::SpareSlot);
}

#[test]
fn test_invariants_hold_at_every_snapshot() {
    let _ = env_logger::builder().is_test(true).try_init();
    let result = poolsim_core::run_simulation(busy_config(), 3).unwrap();

    assert!(result.total_requests > 0);
    assert!(!result.snapshots.is_empty());
    assert_invariants(&result, 4, 30);
}

#[test]
fn test_invariants_with_tight_ceiling() {
    let mut config = busy_config();
    config.capacity.max_hosts = 2;
    let result = poolsim_core::run_simulation(config, 11).unwrap();

    assert!(result.tiers.backlogged > 0, "ceiling should force a backlog");
    assert_invariants(&result, 4, 2);
    assert!(result.peak_running_hosts <= 2);
}

#[test]
fn test_warm_tier_wait_is_exact() {
    let result = poolsim_core::run_simulation(busy_config(), 5).unwrap();
    let warm: Vec<_> = result
        .requests
        .iter()
        .filter(|r| r.tier == AllocationTier::WarmUnit)
        .collect();

    assert!(!warm.is_empty());
    for r in warm {
        assert_eq!(r.wait_secs, 0.26);
    }
}

#[test]
fn test_same_seed_is_bit_identical() {
    let a = poolsim_core::run_simulation(busy_config(), 99).unwrap();
    let b = poolsim_core::run_simulation(busy_config(), 99).unwrap();

    assert_eq!(a.wait_times(), b.wait_times());
    assert_eq!(a.snapshots, b.snapshots);
    assert_eq!(a.events_processed, b.events_processed);
}

#[test]
fn test_different_seeds_differ() {
    let a = poolsim_core::run_simulation(busy_config(), 1).unwrap();
    let b = poolsim_core::run_simulation(busy_config(), 2).unwrap();

    let arrivals = |r: &SimulationResult| -> Vec<f64> {
        r.requests.iter().map(|q| q.arrival_secs).collect()
    };
    assert_ne!(arrivals(&a), arrivals(&b));
}

#[test]
fn test_zero_rate_is_empty() {
    let mut config = busy_config();
    config.workload.requests_per_minute = 0.0;
    let result = poolsim_core::run_simulation(config, 1).unwrap();

    assert!(result.is_empty());
    assert_eq!(result.wait.count, 0);
    assert_eq!(result.wait.p99, 0.0);
    assert_eq!(result.instant_ratio, 0.0);
}

#[test]
fn test_zero_duration_is_empty() {
    let mut config = busy_config();
    config.simulation.duration_hours = 0.0;
    let mut engine = SimulationEngine::new(config, 1).unwrap();
    let result = engine.run();

    assert!(result.is_empty());
    assert_eq!(result.events_processed, 0);
    assert!(result.snapshots.is_empty());
}

#[test]
fn test_arrivals_stop_at_horizon() {
    let result = poolsim_core::run_simulation(busy_config(), 8).unwrap();
    for r in &result.requests {
        assert!(r.arrival_secs <= 2.0 * 3600.0);
    }
    for snap in &result.snapshots {
        assert!(snap.time_secs <= 2.0 * 3600.0);
    }
}

#[test]
fn test_tier_counts_cover_all_arrivals() {
    let result = poolsim_core::run_simulation(busy_config(), 21).unwrap();
    assert_eq!(result.tiers.total(), result.total_requests);
    assert_eq!(
        result.requests.len() as u64 + result.unserved_requests,
        result.total_requests
    );
}

#[test]
fn test_result_serializes_to_json() {
    let result = poolsim_core::run_simulation(busy_config(), 4).unwrap();
    let json = serde_json::to_string(&result).unwrap();
    assert!(json.contains("\"warm_unit\""));
    assert!(json.contains("\"busy\""));

    let back: SimulationResult = serde_json::from_str(&json).unwrap();
    assert_eq!(back.total_requests, result.total_requests);
    assert_eq!(back.tiers, result.tiers);
}
