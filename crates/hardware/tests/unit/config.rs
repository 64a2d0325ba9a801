//! Configuration Tests.
//!
//! Defaults, JSON loading (both naming styles), and the validation errors that stop a run
//! before the first cycle.

use std::io::Write;

use firestorm_core::common::{ConfigError, SimError};
use firestorm_core::config::{Config, MemoryController, ReplacementPolicy};
use pretty_assertions::assert_eq;
use rstest::rstest;

// ══════════════════════════════════════════════════════════
// 1. Defaults
// ══════════════════════════════════════════════════════════

#[test]
fn defaults_describe_firestorm() {
    let config = Config::default();
    assert_eq!(config.pipeline.fetch_width, 8);
    assert_eq!(config.pipeline.decode_width, 8);
    assert_eq!(config.pipeline.commit_width, 7);
    assert_eq!(config.resources.num_rob_entries, 330);
    assert_eq!(config.resources.num_iq_entries, 120);
    assert_eq!(config.lsq.lq_entries, 130);
    assert_eq!(config.lsq.sq_entries, 60);
    assert_eq!(config.lsq.cache_store_ports, 200);
    assert_eq!(config.cache.l1_d.policy, ReplacementPolicy::Lru);
    assert!(config.validate().is_ok());
}

#[test]
fn serialized_defaults_load_back_unchanged() {
    let config = Config::default();
    let json = serde_json::to_string(&config).unwrap();
    assert_eq!(Config::from_json_str(&json).unwrap(), config);
}

// ══════════════════════════════════════════════════════════
// 2. JSON loading
// ══════════════════════════════════════════════════════════

#[test]
fn parameter_names_accept_both_styles() {
    let json = r#"{
        "general": { "numThreads": 2 },
        "lsq": { "LQEntries": 32, "SQEntries": 16, "LSQCheckLoads": false, "cacheStorePorts": 4 },
        "memory": { "controller": "Simple" }
    }"#;
    let config = Config::from_json_str(json).unwrap();
    assert_eq!(config.general.num_threads, 2);
    assert_eq!(config.lsq.lq_entries, 32);
    assert_eq!(config.lsq.sq_entries, 16);
    assert!(!config.lsq.check_loads);
    assert_eq!(config.lsq.cache_store_ports, 4);
    assert_eq!(config.memory.controller, MemoryController::Simple);
    assert_eq!(config.pipeline.fetch_width, 8);
}

#[test]
fn loads_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{ "pipeline": {{ "commit_width": 4 }} }}"#).unwrap();
    let config = Config::from_file(file.path()).unwrap();
    assert_eq!(config.pipeline.commit_width, 4);
}

#[test]
fn malformed_file_reports_its_path() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{{ not json").unwrap();
    match Config::from_file(file.path()) {
        Err(SimError::Parse { path, .. }) => assert_eq!(path, file.path()),
        other => panic!("expected a parse error, got {other:?}"),
    }
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = Config::from_file(dir.path().join("absent.json"));
    assert!(matches!(result, Err(SimError::Io { .. })));
}

// ══════════════════════════════════════════════════════════
// 3. Validation
// ══════════════════════════════════════════════════════════

#[rstest]
#[case::zero_commit_width(r#"{ "pipeline": { "commit_width": 0 } }"#, "pipeline.commit_width")]
#[case::zero_fetch_width(r#"{ "pipeline": { "fetch_width": 0 } }"#, "pipeline.fetch_width")]
#[case::zero_lq(r#"{ "lsq": { "lq_entries": 0 } }"#, "lsq.lq_entries")]
#[case::zero_store_ports(r#"{ "lsq": { "cache_store_ports": 0 } }"#, "lsq.cache_store_ports")]
#[case::zero_clear_period(r#"{ "lsq": { "store_set_clear_period": 0 } }"#, "lsq.store_set_clear_period")]
fn zero_sizes_are_rejected(#[case] json: &str, #[case] field: &str) {
    match Config::from_json_str(json) {
        Err(SimError::Config(ConfigError::Zero { field: f })) => assert_eq!(f, field),
        other => panic!("expected {field} to be rejected, got {other:?}"),
    }
}

#[rstest]
#[case::zero_delay(r#"{ "pipeline": { "iew_to_commit_delay": 0 } }"#, "pipeline.iew_to_commit_delay")]
#[case::delay_beyond_buffer(
    r#"{ "pipeline": { "commit_to_fetch_delay": 21 } }"#,
    "pipeline.commit_to_fetch_delay"
)]
#[case::too_many_threads(r#"{ "general": { "num_threads": 9 } }"#, "general.num_threads")]
fn out_of_range_values_are_rejected(#[case] json: &str, #[case] field: &str) {
    match Config::from_json_str(json) {
        Err(SimError::Config(ConfigError::OutOfRange { field: f, .. })) => assert_eq!(f, field),
        other => panic!("expected {field} to be rejected, got {other:?}"),
    }
}

#[test]
fn register_files_must_hold_every_thread() {
    let mut config = Config::default();
    config.general.num_threads = 3;
    assert_eq!(
        config.validate(),
        Err(ConfigError::TooFewPhysRegs {
            class: "vec_pred",
            phys: 32,
            arch: 16,
            threads: 3,
        })
    );
}

#[test]
fn cache_geometry_must_be_power_of_two() {
    let mut config = Config::default();
    config.lsq.ssit_size = 1000;
    assert!(matches!(
        config.validate(),
        Err(ConfigError::NotPowerOfTwo {
            field: "lsq.ssit_size",
            value: 1000
        })
    ));
}

#[test]
fn rob_banks_must_divide_entries() {
    let mut config = Config::default();
    config.resources.num_robs = 4;
    assert!(matches!(
        config.validate(),
        Err(ConfigError::Inconsistent(_))
    ));
    config.resources.num_robs = 2;
    assert!(config.validate().is_ok());
}

#[test]
fn functional_units_must_cover_every_class() {
    let json = r#"{ "fu_pool": { "kind": "Custom", "units": [
        { "name": "IntALU", "count": 2, "ops": [ { "op_class": "IntAlu", "latency": 1, "issue_latency": 1 } ] }
    ] } }"#;
    assert!(matches!(
        Config::from_json_str(json),
        Err(SimError::Config(ConfigError::MissingCapability(_)))
    ));
}

#[test]
fn errors_name_the_field() {
    let err = Config::from_json_str(r#"{ "pipeline": { "squash_width": 0 } }"#).unwrap_err();
    assert_eq!(
        err.to_string(),
        "invalid configuration: pipeline.squash_width must be greater than zero"
    );
}
