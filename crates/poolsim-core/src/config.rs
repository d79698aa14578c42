//! TOML configuration parsing for poolsim.
//!
//! Defines the complete policy schema for a simulation run: stage latencies,
//! pool shape, scaling thresholds, workload, cost rates and reporting
//! thresholds. Every field has a default, so an empty document describes
//! the reference policy.

use poolsim_policies::{available_triggers, TriggerParams};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    Validation(String),
}

/// Top-level simulation configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimConfig {
    #[serde(default)]
    pub simulation: SimulationSection,
    #[serde(default)]
    pub latency: LatencySection,
    #[serde(default)]
    pub capacity: CapacitySection,
    #[serde(default)]
    pub scaling: ScalingSection,
    #[serde(default)]
    pub workload: WorkloadSection,
    #[serde(default)]
    pub cost: CostSection,
    #[serde(default)]
    pub statistics: StatisticsSection,
}

/// General simulation parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationSection {
    /// Human-readable policy name, carried into results.
    #[serde(default = "default_sim_name")]
    pub name: String,
    /// Random seed used when the caller does not pass one.
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Simulated horizon in hours.
    #[serde(default = "default_duration_hours")]
    pub duration_hours: f64,
    /// Interval between periodic scaling/replenishment checks.
    #[serde(default = "default_check_interval")]
    pub check_interval_secs: f64,
}

fn default_sim_name() -> String {
    "warm-pool".to_string()
}
fn default_seed() -> u64 {
    42
}
fn default_duration_hours() -> f64 {
    8.0
}
fn default_check_interval() -> f64 {
    10.0
}

impl Default for SimulationSection {
    fn default() -> Self {
        Self {
            name: default_sim_name(),
            seed: default_seed(),
            duration_hours: default_duration_hours(),
            check_interval_secs: default_check_interval(),
        }
    }
}

/// Time-to-availability of each capacity tier, in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LatencySection {
    /// Handing an idle warm unit to a request.
    #[serde(default)]
    pub warm_assign_secs: f64,
    /// Starting a new unit on a host with a free slot.
    #[serde(default = "default_new_unit")]
    pub new_unit_secs: f64,
    /// Waking a standby host.
    #[serde(default = "default_standby_host")]
    pub standby_host_secs: f64,
    /// Provisioning a host from scratch.
    #[serde(default = "default_cold_host")]
    pub cold_host_secs: f64,
    /// Delay before the standby pool is restocked after a promotion.
    #[serde(default = "default_restock_delay")]
    pub standby_restock_delay_secs: f64,
}

fn default_new_unit() -> f64 {
    10.0
}
fn default_standby_host() -> f64 {
    15.0
}
fn default_cold_host() -> f64 {
    180.0
}
fn default_restock_delay() -> f64 {
    30.0
}

impl Default for LatencySection {
    fn default() -> Self {
        Self {
            warm_assign_secs: 0.0,
            new_unit_secs: default_new_unit(),
            standby_host_secs: default_standby_host(),
            cold_host_secs: default_cold_host(),
            standby_restock_delay_secs: default_restock_delay(),
        }
    }
}

/// Pool shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapacitySection {
    /// Unit slots per host.
    #[serde(default = "default_units_per_host")]
    pub units_per_host: u32,
    /// Hosts running at time zero.
    #[serde(default = "default_initial_hosts")]
    pub initial_hosts: u32,
    /// Ceiling on running plus provisioning hosts.
    #[serde(default = "default_max_hosts")]
    pub max_hosts: u32,
    /// Target number of idle pre-started units.
    #[serde(default = "default_warm_pool_size")]
    pub warm_pool_size: u32,
    /// Target number of dormant standby hosts.
    #[serde(default = "default_standby_pool_size")]
    pub standby_pool_size: u32,
}

fn default_units_per_host() -> u32 {
    7
}
fn default_initial_hosts() -> u32 {
    1
}
fn default_max_hosts() -> u32 {
    50
}
fn default_warm_pool_size() -> u32 {
    2
}
fn default_standby_pool_size() -> u32 {
    2
}

impl Default for CapacitySection {
    fn default() -> Self {
        Self {
            units_per_host: default_units_per_host(),
            initial_hosts: default_initial_hosts(),
            max_hosts: default_max_hosts(),
            warm_pool_size: default_warm_pool_size(),
            standby_pool_size: default_standby_pool_size(),
        }
    }
}

/// Proactive scaling policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScalingSection {
    /// Trigger name: "spare_slots", "utilization" or "reactive_only".
    #[serde(default = "default_trigger")]
    pub trigger: String,
    /// Utilization fraction for the "utilization" trigger.
    #[serde(default = "default_scale_up_utilization")]
    pub scale_up_utilization: f64,
    /// Free unit slots for the "spare_slots" trigger.
    #[serde(default = "default_spare_slot_threshold")]
    pub spare_slot_threshold: u32,
}

fn default_trigger() -> String {
    "spare_slots".to_string()
}
fn default_scale_up_utilization() -> f64 {
    0.7
}
fn default_spare_slot_threshold() -> u32 {
    2
}

impl Default for ScalingSection {
    fn default() -> Self {
        Self {
            trigger: default_trigger(),
            scale_up_utilization: default_scale_up_utilization(),
            spare_slot_threshold: default_spare_slot_threshold(),
        }
    }
}

impl From<&ScalingSection> for TriggerParams {
    fn from(s: &ScalingSection) -> Self {
        TriggerParams {
            scale_up_utilization: s.scale_up_utilization,
            spare_slot_threshold: s.spare_slot_threshold,
        }
    }
}

/// Request arrivals and session lengths.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkloadSection {
    /// Poisson arrival rate in requests per minute.
    #[serde(default = "default_requests_per_minute")]
    pub requests_per_minute: f64,
    #[serde(default)]
    pub session: SessionSection,
}

fn default_requests_per_minute() -> f64 {
    5.0
}

impl Default for WorkloadSection {
    fn default() -> Self {
        Self {
            requests_per_minute: default_requests_per_minute(),
            session: SessionSection::default(),
        }
    }
}

/// Shape of the session-duration distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionKind {
    Exponential,
    Gaussian,
}

/// Session-duration distribution parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSection {
    #[serde(default = "default_session_kind")]
    pub distribution: SessionKind,
    #[serde(default = "default_session_mean")]
    pub mean_secs: f64,
    /// Standard deviation; only used by the gaussian distribution.
    #[serde(default = "default_session_std")]
    pub std_secs: f64,
    /// Floor applied to every drawn duration.
    #[serde(default = "default_session_min")]
    pub min_secs: f64,
}

fn default_session_kind() -> SessionKind {
    SessionKind::Exponential
}
fn default_session_mean() -> f64 {
    30.0 * 60.0
}
fn default_session_std() -> f64 {
    10.0 * 60.0
}
fn default_session_min() -> f64 {
    60.0
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            distribution: default_session_kind(),
            mean_secs: default_session_mean(),
            std_secs: default_session_std(),
            min_secs: default_session_min(),
        }
    }
}

/// Cost model for the monthly estimate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostSection {
    /// Hourly cost of a running host.
    #[serde(default = "default_running_hourly")]
    pub running_host_hourly: f64,
    /// Hourly cost of a dormant standby host (storage only).
    #[serde(default = "default_standby_hourly")]
    pub standby_host_hourly: f64,
    /// Hours per month the pool is operated.
    #[serde(default = "default_billing_hours")]
    pub billing_hours_per_month: f64,
}

fn default_running_hourly() -> f64 {
    0.0208
}
fn default_standby_hourly() -> f64 {
    0.0008
}
fn default_billing_hours() -> f64 {
    // 8 operated hours a day, 30 days
    240.0
}

impl Default for CostSection {
    fn default() -> Self {
        Self {
            running_host_hourly: default_running_hourly(),
            standby_host_hourly: default_standby_hourly(),
            billing_hours_per_month: default_billing_hours(),
        }
    }
}

/// Reporting thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatisticsSection {
    /// Waits above each of these (seconds) are reported as a fraction.
    #[serde(default = "default_wait_thresholds")]
    pub wait_thresholds_secs: Vec<f64>,
}

fn default_wait_thresholds() -> Vec<f64> {
    vec![1.0, 5.0, 20.0]
}

impl Default for StatisticsSection {
    fn default() -> Self {
        Self {
            wait_thresholds_secs: default_wait_thresholds(),
        }
    }
}

impl SimConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Simulated horizon in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.simulation.duration_hours * 3600.0
    }

    /// Arrival rate in requests per second.
    pub fn arrival_rate_per_sec(&self) -> f64 {
        self.workload.requests_per_minute / 60.0
    }

    /// Threshold parameters for the scaling trigger.
    pub fn trigger_params(&self) -> TriggerParams {
        (&self.scaling).into()
    }

    /// Validate configuration consistency.
    ///
    /// Called by [`SimConfig::from_str`] and again before every run, so a
    /// programmatically built config cannot start a run in an invalid state.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let sim = &self.simulation;
        non_negative("duration_hours", sim.duration_hours)?;
        positive("check_interval_secs", sim.check_interval_secs)?;

        let lat = &self.latency;
        non_negative("warm_assign_secs", lat.warm_assign_secs)?;
        non_negative("new_unit_secs", lat.new_unit_secs)?;
        non_negative("standby_host_secs", lat.standby_host_secs)?;
        non_negative("cold_host_secs", lat.cold_host_secs)?;
        non_negative("standby_restock_delay_secs", lat.standby_restock_delay_secs)?;

        let cap = &self.capacity;
        if cap.units_per_host == 0 {
            return Err(ConfigError::Validation(
                "units_per_host must be > 0".to_string(),
            ));
        }
        if cap.max_hosts == 0 {
            return Err(ConfigError::Validation("max_hosts must be > 0".to_string()));
        }
        if cap.max_hosts.checked_mul(cap.units_per_host).is_none() {
            return Err(ConfigError::Validation(format!(
                "max_hosts ({}) x units_per_host ({}) exceeds the slot limit of {}",
                cap.max_hosts,
                cap.units_per_host,
                u32::MAX,
            )));
        }
        if cap.max_hosts < cap.initial_hosts {
            return Err(ConfigError::Validation(format!(
                "max_hosts ({}) must be >= initial_hosts ({})",
                cap.max_hosts, cap.initial_hosts,
            )));
        }

        let scaling = &self.scaling;
        if !available_triggers().contains(&scaling.trigger.as_str()) {
            return Err(ConfigError::Validation(format!(
                "Unknown scaling trigger: {}. Available: {:?}",
                scaling.trigger,
                available_triggers(),
            )));
        }
        if !(0.0..=1.0).contains(&scaling.scale_up_utilization) {
            return Err(ConfigError::Validation(format!(
                "scale_up_utilization must be within [0, 1], got {}",
                scaling.scale_up_utilization,
            )));
        }

        let workload = &self.workload;
        non_negative("requests_per_minute", workload.requests_per_minute)?;
        positive("session.mean_secs", workload.session.mean_secs)?;
        non_negative("session.std_secs", workload.session.std_secs)?;
        positive("session.min_secs", workload.session.min_secs)?;

        let cost = &self.cost;
        non_negative("running_host_hourly", cost.running_host_hourly)?;
        non_negative("standby_host_hourly", cost.standby_host_hourly)?;
        non_negative("billing_hours_per_month", cost.billing_hours_per_month)?;

        for threshold in &self.statistics.wait_thresholds_secs {
            non_negative("wait_thresholds_secs", *threshold)?;
        }
        Ok(())
    }
}

fn non_negative(field: &str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::Validation(format!(
            "{} must be a finite value >= 0, got {}",
            field, value,
        )));
    }
    Ok(())
}

fn positive(field: &str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ConfigError::Validation(format!(
            "{} must be a finite value > 0, got {}",
            field, value,
        )));
    }
    Ok(())
}
