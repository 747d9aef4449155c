//! Tests for configuration validation

use prometheus_cpu_sched::config::scheduler::{ENV_CPU_TOKENS, ENV_TICK_INTERVAL_MS};
use prometheus_cpu_sched::SchedulerConfig;

#[test]
fn test_default_config_validation() {
    let valid = SchedulerConfig::default();
    assert!(valid.validate().is_ok());
}

#[test]
fn test_config_invalid_cpu_tokens() {
    let invalid = SchedulerConfig::default().with_cpu_tokens(0);
    assert!(invalid.validate().is_err());
}

#[test]
fn test_config_invalid_time_slice() {
    let invalid = SchedulerConfig::default().with_time_slice_ticks(0);
    assert!(invalid.validate().is_err());
}

#[test]
fn test_config_invalid_tick_interval() {
    let invalid = SchedulerConfig::default().with_tick_interval_ms(0);
    assert!(invalid.validate().is_err());
}

#[test]
fn test_config_invalid_bounds() {
    assert!(SchedulerConfig::default().with_max_ticks(Some(0)).validate().is_err());
    assert!(SchedulerConfig::default().with_idler_period(Some(0)).validate().is_err());
}

#[test]
fn test_scheduler_config_from_json() {
    let json = r#"{
        "cpu_tokens": 2,
        "time_slice_ticks": 4,
        "tick_interval_ms": 10,
        "max_ticks": 35,
        "idler_period": null
    }"#;

    let config = SchedulerConfig::from_json_str(json).unwrap();
    assert_eq!(config.cpu_tokens, 2);
    assert_eq!(config.time_slice_ticks, 4);
    assert_eq!(config.max_ticks, Some(35));
    assert_eq!(config.idler_period, None);
    assert_eq!(config.audit_capacity, 0);
}

#[test]
fn test_scheduler_config_from_partial_json() {
    let config = SchedulerConfig::from_json_str(r#"{ "cpu_tokens": 3 }"#).unwrap();
    assert_eq!(config.cpu_tokens, 3);
    assert_eq!(config.time_slice_ticks, 3);
    assert_eq!(config.idler_period, Some(5));
}

#[test]
fn test_scheduler_config_rejects_invalid_json() {
    assert!(SchedulerConfig::from_json_str("{ not json").is_err());
    assert!(SchedulerConfig::from_json_str(r#"{ "cpu_tokens": 0 }"#).is_err());
}

#[test]
fn test_scheduler_config_json_roundtrip_keeps_values() {
    let config = SchedulerConfig::default().with_cpu_tokens(4).with_max_ticks(Some(100));
    let json = serde_json::to_string(&config).unwrap();
    assert_eq!(SchedulerConfig::from_json_str(&json).unwrap(), config);
}

#[test]
fn test_scheduler_config_from_lookup() {
    let config = SchedulerConfig::from_lookup(|key| match key {
        k if k == ENV_CPU_TOKENS => Some("2".to_string()),
        k if k == ENV_TICK_INTERVAL_MS => Some("25".to_string()),
        _ => None,
    })
    .unwrap();
    assert_eq!(config.cpu_tokens, 2);
    assert_eq!(config.tick_interval_ms, 25);
}
