/// Integration tests for configuration loading.
use poolsim_core::config::{ConfigError, SessionKind, SimConfig};

const FULL_CONFIG: &str = r#"
[simulation]
name = "multi-user-hybrid"
seed = 7
duration_hours = 8.0
check_interval_secs = 10.0

[latency]
warm_assign_secs = 0.26
new_unit_secs = 3.0
standby_host_secs = 22.0
cold_host_secs = 180.0
standby_restock_delay_secs = 30.0

[capacity]
units_per_host = 4
initial_hosts = 1
max_hosts = 50
warm_pool_size = 4
standby_pool_size = 2

[scaling]
trigger = "utilization"
scale_up_utilization = 0.6

[workload]
requests_per_minute = 3.0

[workload.session]
distribution = "gaussian"
mean_secs = 1800.0
std_secs = 600.0
min_secs = 60.0

[cost]
running_host_hourly = 0.0208
standby_host_hourly = 0.0008
billing_hours_per_month = 240.0

[statistics]
wait_thresholds_secs = [1.0, 2.0, 5.0]
"#;

#[test]
fn test_full_config_roundtrip_through_file() {
    let tmp_path = std::env::temp_dir().join("poolsim_test_config.toml");
    std::fs::write(&tmp_path, FULL_CONFIG).unwrap();

    let config = SimConfig::from_file(&tmp_path).unwrap();
    assert_eq!(config.simulation.name, "multi-user-hybrid");
    assert_eq!(config.latency.standby_host_secs, 22.0);
    assert_eq!(config.capacity.warm_pool_size, 4);
    assert_eq!(config.scaling.trigger, "utilization");
    assert_eq!(config.workload.session.distribution, SessionKind::Gaussian);
    assert_eq!(config.statistics.wait_thresholds_secs, vec![1.0, 2.0, 5.0]);
    assert!((config.arrival_rate_per_sec() - 0.05).abs() < 1e-12);

    // Cleanup
    let _ = std::fs::remove_file(&tmp_path);
}

#[test]
fn test_missing_file_is_io_error() {
    let path = std::path::Path::new("does/not/exist.toml");
    assert!(matches!(SimConfig::from_file(path), Err(ConfigError::Io(_))));
}

#[test]
fn test_empty_document_is_reference_policy() {
    let config = SimConfig::from_str("").unwrap();
    assert_eq!(config.capacity.units_per_host, 7);
    assert_eq!(config.latency.cold_host_secs, 180.0);
    assert_eq!(config.workload.session.distribution, SessionKind::Exponential);
    assert_eq!(config.scaling.trigger, "spare_slots");
}

#[test]
fn test_bad_section_type_is_parse_error() {
    let result = SimConfig::from_str("[capacity]\nunits_per_host = \"many\"\n");
    assert!(matches!(result, Err(ConfigError::Parse(_))));
}

#[test]
fn test_invalid_values_are_validation_errors() {
    let cases = [
        "[capacity]\ninitial_hosts = 5\nmax_hosts = 2\n",
        "[scaling]\nscale_up_utilization = 1.5\n",
        "[scaling]\ntrigger = \"predictive\"\n",
        "[latency]\ncold_host_secs = -1.0\n",
        "[workload]\nrequests_per_minute = -3.0\n",
        "[workload.session]\nmin_secs = 0.0\n",
        "[statistics]\nwait_thresholds_secs = [-1.0]\n",
    ];
    for doc in cases {
        let result = SimConfig::from_str(doc);
        assert!(
            matches!(result, Err(ConfigError::Validation(_))),
            "expected validation error for {:?}",
            doc
        );
    }
}

#[test]
fn test_validation_message_names_field() {
    let err = SimConfig::from_str("[simulation]\ncheck_interval_secs = 0.0\n").unwrap_err();
    assert!(err.to_string().contains("check_interval_secs"));
}

#[test]
fn test_config_runs_after_load() {
    let mut config = SimConfig::from_str(FULL_CONFIG).unwrap();
    config.simulation.duration_hours = 1.0;
    let result = poolsim_core::run_simulation(config, 1).unwrap();
    assert_eq!(result.policy, "multi-user-hybrid");
    assert_eq!(result.wait_exceedance.len(), 3);
}
