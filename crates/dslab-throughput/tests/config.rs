use std::io::Write;

use dslab_throughput::capacity::CapacityFailurePolicy;
use dslab_throughput::config::bench_config::{ConfigFormat, DEFAULT_TEST_HOURS, DEFAULT_TOTAL_NODES};
use dslab_throughput::config::ConfigError;
use dslab_throughput::{BenchmarkConfig, SchedulerConfig};

const JSON_CONFIG: &str = r#"{
    "total_test_hours": 2,
    "total_nodes": 32,
    "queue_name": "kshcnormal",
    "seed": 17,
    "jobs": [
        {"nodes": 1, "count": 100, "durations": [{"minutes": 5, "ratio": 0.5}, {"minutes": 10, "ratio": 0.5}]},
        {"nodes": 8, "count": 10, "durations": [{"minutes": 60, "ratio": 1}]}
    ],
    "scheduler": {"pacing_delay": 0.5, "on_capacity_error": "backoff"}
}"#;

const YAML_CONFIG: &str = r#"
queue_name: debug
jobs:
  - nodes: 2
    count: 4
    durations:
      - minutes: 15
        ratio: 1.0
"#;

#[test]
fn test_json_config() {
    let config = BenchmarkConfig::parse(JSON_CONFIG, ConfigFormat::Json).unwrap();
    assert_eq!(config.total_test_hours, 2.);
    assert_eq!(config.total_nodes, 32);
    assert_eq!(config.queue_name, "kshcnormal");
    assert_eq!(config.seed, Some(17));
    assert_eq!(config.jobs.len(), 2);
    assert_eq!(config.jobs[0].variant_counts(), vec![50, 50]);
    assert_eq!(config.window_seconds(), 7200.);
    assert_eq!(config.scheduler.pacing_delay, 0.5);
    assert_eq!(config.scheduler.backoff_min, 5.);
    assert_eq!(config.scheduler.on_capacity_error, CapacityFailurePolicy::Backoff);
}

#[test]
fn test_yaml_config_defaults() {
    let config = BenchmarkConfig::parse(YAML_CONFIG, ConfigFormat::Yaml).unwrap();
    assert_eq!(config.total_test_hours, DEFAULT_TEST_HOURS);
    assert_eq!(config.total_nodes, DEFAULT_TOTAL_NODES);
    assert_eq!(config.queue_name, "debug");
    assert_eq!(config.seed, None);
    assert_eq!(config.scheduler, SchedulerConfig::default());
}

#[test]
fn test_config_from_file() {
    let mut file = tempfile::Builder::new().suffix(".yml").tempfile().unwrap();
    file.write_all(YAML_CONFIG.as_bytes()).unwrap();
    let config = BenchmarkConfig::from_file(file.path()).unwrap();
    assert_eq!(config.jobs[0].nodes, 2);

    assert!(matches!(
        BenchmarkConfig::from_file("/nonexistent/bench.json"),
        Err(ConfigError::Read { .. })
    ));
}

#[test]
fn test_missing_queue() {
    let config = r#"{"jobs": [{"nodes": 1, "count": 1, "durations": [{"minutes": 5, "ratio": 1}]}]}"#;
    assert!(matches!(
        BenchmarkConfig::parse(config, ConfigFormat::Json),
        Err(ConfigError::MissingQueue)
    ));

    let config = r#"{"queue_name": "  ", "jobs": [{"nodes": 1, "count": 1, "durations": [{"minutes": 5, "ratio": 1}]}]}"#;
    assert!(matches!(
        BenchmarkConfig::parse(config, ConfigFormat::Json),
        Err(ConfigError::MissingQueue)
    ));
}

#[test]
fn test_empty_job_mix() {
    assert!(matches!(
        BenchmarkConfig::parse(r#"{"queue_name": "normal", "jobs": []}"#, ConfigFormat::Json),
        Err(ConfigError::EmptyJobMix)
    ));
    assert!(matches!(
        BenchmarkConfig::parse(r#"{"queue_name": "normal"}"#, ConfigFormat::Json),
        Err(ConfigError::EmptyJobMix)
    ));
}

#[test]
fn test_invalid_values() {
    let negative_ratio = r#"{"queue_name": "normal", "jobs": [{"nodes": 1, "count": 1, "durations": [{"minutes": 5, "ratio": -1}]}]}"#;
    assert!(matches!(
        BenchmarkConfig::parse(negative_ratio, ConfigFormat::Json),
        Err(ConfigError::Invalid { field, .. }) if field == "jobs[0].durations[0].ratio"
    ));

    let zero_nodes = r#"{"queue_name": "normal", "total_nodes": 0, "jobs": [{"nodes": 1, "count": 1, "durations": [{"minutes": 5, "ratio": 1}]}]}"#;
    assert!(matches!(
        BenchmarkConfig::parse(zero_nodes, ConfigFormat::Json),
        Err(ConfigError::Invalid { field, .. }) if field == "total_nodes"
    ));

    let negative_hours = r#"{"queue_name": "normal", "total_test_hours": -1, "jobs": [{"nodes": 1, "count": 1, "durations": [{"minutes": 5, "ratio": 1}]}]}"#;
    assert!(BenchmarkConfig::parse(negative_hours, ConfigFormat::Json).is_err());

    let bad_backoff = r#"{"queue_name": "normal", "jobs": [{"nodes": 1, "count": 1, "durations": [{"minutes": 5, "ratio": 1}]}], "scheduler": {"backoff_min": 30}}"#;
    assert!(BenchmarkConfig::parse(bad_backoff, ConfigFormat::Json).is_err());

    assert!(matches!(
        BenchmarkConfig::parse("{", ConfigFormat::Json),
        Err(ConfigError::Json(_))
    ));
}

#[test]
fn test_zero_hours_is_allowed() {
    let config = r#"{"queue_name": "normal", "total_test_hours": 0, "jobs": [{"nodes": 1, "count": 1, "durations": [{"minutes": 5, "ratio": 1}]}]}"#;
    let config = BenchmarkConfig::parse(config, ConfigFormat::Json).unwrap();
    assert_eq!(config.window_seconds(), 0.);
}

#[test]
fn test_config_format() {
    use std::path::Path;
    assert_eq!(ConfigFormat::from_path(Path::new("bench.YAML")), ConfigFormat::Yaml);
    assert_eq!(ConfigFormat::from_path(Path::new("bench.yml")), ConfigFormat::Yaml);
    assert_eq!(ConfigFormat::from_path(Path::new("bench.json")), ConfigFormat::Json);
    assert_eq!(ConfigFormat::from_path(Path::new("bench")), ConfigFormat::Json);
}

#[test]
fn test_window_must_fit_into_duration() {
    let config = r#"{"queue_name": "normal", "total_test_hours": 1e300, "jobs": [{"nodes": 1, "count": 1, "durations": [{"minutes": 5, "ratio": 1}]}]}"#;
    assert!(matches!(
        BenchmarkConfig::parse(config, ConfigFormat::Json),
        Err(ConfigError::Invalid { field, .. }) if field == "total_test_hours"
    ));

    let config = r#"{"queue_name": "normal", "total_test_hours": 8760, "jobs": [{"nodes": 1, "count": 1, "durations": [{"minutes": 5, "ratio": 1}]}]}"#;
    assert!(BenchmarkConfig::parse(config, ConfigFormat::Json).is_ok());
}
