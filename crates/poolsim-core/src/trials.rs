//! Repeated seeded trials and policy comparison.
//!
//! Independent runs are spread over the rayon thread pool; a single run is
//! never split. Summaries are plain means over the trials.

use crate::config::{ConfigError, SessionKind, SimConfig};
use crate::engine::SimulationEngine;
use crate::metrics::SimulationResult;
use log::info;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Run one simulation to completion.
pub fn run_simulation(config: SimConfig, seed: u64) -> Result<SimulationResult, ConfigError> {
    let mut engine = SimulationEngine::new(config, seed)?;
    Ok(engine.run())
}

/// Means over a set of seeded runs of one policy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrialSummary {
    pub policy: String,
    pub trials: u32,
    pub total_requests: f64,
    pub warm_unit: f64,
    pub spare_slot: f64,
    pub standby_host: f64,
    pub cold_host: f64,
    pub backlogged: f64,
    pub instant_ratio: f64,
    pub mean_wait: f64,
    pub p50_wait: f64,
    pub p95_wait: f64,
    pub p99_wait: f64,
    pub max_wait: f64,
    pub avg_running_hosts: f64,
    pub monthly_cost: f64,
    pub unserved_requests: f64,
}

impl TrialSummary {
    /// Average a set of results. Empty input gives a zeroed summary.
    pub fn from_results(policy: &str, results: &[SimulationResult]) -> Self {
        let n = results.len();
        if n == 0 {
            return Self {
                policy: policy.to_string(),
                ..Self::default()
            };
        }
        let mean = |f: &dyn Fn(&SimulationResult) -> f64| -> f64 {
            results.iter().map(f).sum::<f64>() / n as f64
        };

        Self {
            policy: policy.to_string(),
            trials: n as u32,
            total_requests: mean(&|r| r.total_requests as f64),
            warm_unit: mean(&|r| r.tiers.warm_unit as f64),
            spare_slot: mean(&|r| r.tiers.spare_slot as f64),
            standby_host: mean(&|r| r.tiers.standby_host as f64),
            cold_host: mean(&|r| r.tiers.cold_host as f64),
            backlogged: mean(&|r| r.tiers.backlogged as f64),
            instant_ratio: mean(&|r| r.instant_ratio),
            mean_wait: mean(&|r| r.wait.mean),
            p50_wait: mean(&|r| r.wait.p50),
            p95_wait: mean(&|r| r.wait.p95),
            p99_wait: mean(&|r| r.wait.p99),
            max_wait: mean(&|r| r.wait.max),
            avg_running_hosts: mean(&|r| r.avg_running_hosts),
            monthly_cost: mean(&|r| r.monthly_cost),
            unserved_requests: mean(&|r| r.unserved_requests as f64),
        }
    }
}

/// Run `trials` seeds starting at `base_seed` in parallel and average them.
pub fn run_trials(
    config: &SimConfig,
    base_seed: u64,
    trials: u32,
) -> Result<TrialSummary, ConfigError> {
    config.validate()?;
    info!(
        "running {} trial(s) of '{}' from seed {}",
        trials, config.simulation.name, base_seed
    );

    let results: Vec<SimulationResult> = (0..trials as u64)
        .into_par_iter()
        .map(|i| run_simulation(config.clone(), base_seed + i))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(TrialSummary::from_results(&config.simulation.name, &results))
}

/// Run every named policy under the same seeds, preserving input order.
pub fn compare_policies(
    policies: &[(String, SimConfig)],
    base_seed: u64,
    trials: u32,
) -> Result<Vec<TrialSummary>, ConfigError> {
    policies
        .par_iter()
        .map(|(name, config)| {
            let mut summary = run_trials(config, base_seed, trials)?;
            summary.policy = name.clone();
            Ok(summary)
        })
        .collect()
}

/// Named strategies from the capacity-planning and multi-user studies.
///
/// The first five sweep the warm-unit pool on the default profile; the
/// last four use the multi-user profile with utilization-based scaling.
pub fn reference_policies() -> Vec<(String, SimConfig)> {
    let mut policies = Vec::new();

    let sweeps = [
        ("A: no warm units", 0, 2),
        ("B: 2 warm units", 2, 2),
        ("C: 3 warm units", 3, 2),
        ("D: 4 warm units", 4, 2),
        ("E: 5 warm units + 3 standby", 5, 3),
    ];
    for (name, warm, standby) in sweeps {
        let mut config = SimConfig::default();
        config.simulation.name = name.to_string();
        config.capacity.warm_pool_size = warm;
        config.capacity.standby_pool_size = standby;
        policies.push((name.to_string(), config));
    }

    let multi_user = [
        ("conservative", 0.7, 2, 3),
        ("aggressive", 0.5, 3, 5),
        ("hybrid", 0.6, 2, 4),
        ("minimal", 0.8, 1, 2),
    ];
    for (name, utilization, standby, warm) in multi_user {
        let mut config = multi_user_profile();
        config.simulation.name = name.to_string();
        config.scaling.scale_up_utilization = utilization;
        config.capacity.standby_pool_size = standby;
        config.capacity.warm_pool_size = warm;
        policies.push((name.to_string(), config));
    }

    policies
}

/// Measured latencies and workload of the multi-user study.
fn multi_user_profile() -> SimConfig {
    let mut config = SimConfig::default();
    config.latency.warm_assign_secs = 0.26;
    config.latency.new_unit_secs = 3.0;
    config.latency.standby_host_secs = 22.0;
    config.latency.cold_host_secs = 180.0;
    config.capacity.units_per_host = 4;
    config.capacity.initial_hosts = 1;
    config.capacity.max_hosts = 50;
    config.scaling.trigger = "utilization".to_string();
    config.workload.requests_per_minute = 3.0;
    config.workload.session.distribution = SessionKind::Gaussian;
    config.workload.session.mean_secs = 1800.0;
    config.workload.session.std_secs = 600.0;
    config.workload.session.min_secs = 60.0;
    config
}
