/// Scenario tests: saturation, warm-pool sizing and the reference policies.
use poolsim_core::config::{SessionKind, SimConfig};
use poolsim_core::{compare_policies, reference_policies, run_simulation, run_trials};

fn saturating_config() -> SimConfig {
    let mut config = SimConfig::default();
    config.simulation.name = "saturation".to_string();
    config.simulation.duration_hours = 0.5;
    config.latency.new_unit_secs = 10.0;
    config.latency.standby_host_secs = 15.0;
    config.latency.cold_host_secs = 180.0;
    config.capacity.units_per_host = 4;
    config.capacity.initial_hosts = 1;
    config.capacity.max_hosts = 2000;
    config.capacity.warm_pool_size = 2;
    config.capacity.standby_pool_size = 1;
    config.workload.requests_per_minute = 120.0;
    config.workload.session.distribution = SessionKind::Exponential;
    config.workload.session.mean_secs = 1800.0;
    config
}

fn light_config(warm_pool_size: u32) -> SimConfig {
    let mut config = SimConfig::default();
    config.simulation.duration_hours = 4.0;
    config.capacity.units_per_host = 7;
    config.capacity.initial_hosts = 2;
    config.capacity.max_hosts = 10;
    config.capacity.warm_pool_size = warm_pool_size;
    config.workload.requests_per_minute = 0.5;
    config.workload.session.mean_secs = 600.0;
    config
}

#[test]
fn test_saturation_reaches_cold_tier() {
    let result = run_simulation(saturating_config(), 42).unwrap();

    assert!(result.tiers.cold_host > 0, "expected cold provisioning");
    assert!(result.tiers.standby_host > 0, "standby pool should be used");
    assert!(
        result.wait.p99 >= 180.0,
        "p99 wait {} below cold start latency",
        result.wait.p99
    );
    assert!(result.peak_running_hosts > 1);
}

#[test]
fn test_more_warm_units_never_hurt_on_average() {
    let cold = run_trials(&light_config(0), 100, 10).unwrap();
    let warm = run_trials(&light_config(4), 100, 10).unwrap();

    assert!(
        warm.mean_wait <= cold.mean_wait,
        "warm pool of 4 waited {} vs {} without",
        warm.mean_wait,
        cold.mean_wait
    );
    assert!(warm.instant_ratio >= cold.instant_ratio);
}

#[test]
fn test_warm_pool_cost_tradeoff() {
    let summaries = compare_policies(
        &[
            ("none".to_string(), light_config(0)),
            ("four".to_string(), light_config(4)),
        ],
        7,
        3,
    )
    .unwrap();

    assert_eq!(summaries[0].policy, "none");
    assert_eq!(summaries[1].policy, "four");
    for s in &summaries {
        assert_eq!(s.trials, 3);
        assert!(s.monthly_cost > 0.0);
        assert!(s.avg_running_hosts >= 2.0);
    }
}

#[test]
fn test_reference_policies_run() {
    let policies: Vec<_> = reference_policies()
        .into_iter()
        .map(|(name, mut config)| {
            config.simulation.duration_hours = 1.0;
            (name, config)
        })
        .collect();
    let summaries = compare_policies(&policies, 42, 2).unwrap();

    assert_eq!(summaries.len(), policies.len());
    for (summary, (name, _)) in summaries.iter().zip(&policies) {
        assert_eq!(&summary.policy, name);
        assert!(summary.total_requests > 0.0, "{} saw no requests", name);
        assert!(summary.instant_ratio >= 0.0 && summary.instant_ratio <= 1.0);
    }
}

#[test]
fn test_host_ceiling_backlogs_requests() {
    let mut config = saturating_config();
    config.capacity.max_hosts = 3;
    let result = run_simulation(config, 42).unwrap();

    assert!(result.tiers.backlogged > 0);
    assert!(result.peak_running_hosts <= 3);
    // Sessions outlast the horizon, so most backlogged requests stay unserved.
    assert!(result.unserved_requests > 0);
}

#[test]
fn test_backlog_is_served_in_arrival_order() {
    use poolsim_core::{AllocationTier, ScriptedStream, SimulationEngine};

    let mut config = SimConfig::default();
    config.simulation.duration_hours = 1.0;
    config.capacity.units_per_host = 2;
    config.capacity.initial_hosts = 1;
    config.capacity.max_hosts = 2;
    config.capacity.warm_pool_size = 0;
    config.capacity.standby_pool_size = 0;
    config.scaling.trigger = "reactive_only".to_string();
    config.workload.requests_per_minute = 0.0;

    let stream = ScriptedStream::new(vec![], vec![3000.0]);
    let mut engine = SimulationEngine::with_stream(config, Box::new(stream)).unwrap();
    engine.load_arrivals(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 200.0]);
    let result = engine.run();

    // Two spare slots on the first host, then one cold host hits the ceiling.
    assert_eq!(result.tiers.spare_slot, 2);
    assert_eq!(result.tiers.cold_host, 1);
    assert_eq!(result.tiers.backlogged, 4);

    let backlogged: Vec<_> = result
        .requests
        .iter()
        .filter(|r| r.tier == AllocationTier::Backlogged)
        .collect();
    let ids: Vec<u64> = backlogged.iter().map(|r| r.request_id).collect();
    assert_eq!(ids, vec![3, 4, 5, 6]);

    // The free slot on the cold host goes to the head of the queue.
    assert!((backlogged[0].wait_secs - 189.0).abs() < 1e-6);
    // The rest take units returned by ending sessions, in arrival order,
    // including the request that arrived after the host was ready.
    let grant_times: Vec<f64> = backlogged
        .iter()
        .map(|r| r.arrival_secs + r.wait_secs)
        .collect();
    assert!((grant_times[1] - 3011.0).abs() < 1e-6);
    assert!((grant_times[2] - 3012.0).abs() < 1e-6);
    assert!((grant_times[3] - 3193.0).abs() < 1e-6);
    assert_eq!(result.unserved_requests, 0);
}

#[test]
fn test_unserved_waits_are_reported() {
    let mut config = saturating_config();
    config.capacity.max_hosts = 3;
    let result = run_simulation(config, 42).unwrap();

    assert_eq!(result.unserved_wait.count, result.unserved_requests);
    assert!(result.unserved_wait.max <= 0.5 * 3600.0);
    assert!(result.unserved_wait.max > 0.0);
}
