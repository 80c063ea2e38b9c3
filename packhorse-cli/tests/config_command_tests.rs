//! Integration tests for `packhorse config` command.
//!
//! Tests config validation and display functionality with real TOML files.

use std::fs;
use tempfile::TempDir;

#[tokio::test]
async fn test_config_validate_valid_toml() {
    // Given: A valid config file
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config_path = temp_dir.path().join("packhorse.toml");

    let valid_config = r#"
[general]
log_level = "info"
log_format = "json"

[archive]
max_depth = 3
max_entries = 1000
max_entry_size = 1048576

[output]
format = "cyclonedx-json"
"#;

    fs::write(&config_path, valid_config).expect("should write config");

    // When: Loading the config
    let result = packhorse_core::config::PackhorseConfig::load(&config_path).await;

    // Then: Should succeed
    assert!(result.is_ok(), "valid config should load successfully");
    let config = result.expect("load succeeded");
    assert_eq!(config.archive.max_depth, 3);
    assert_eq!(config.output.format, "cyclonedx-json");
}

#[tokio::test]
async fn test_config_validate_malformed_toml() {
    // Given: A malformed TOML file
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config_path = temp_dir.path().join("bad.toml");

    let malformed_config = r#"
[general
log_level = "info"
"#;

    fs::write(&config_path, malformed_config).expect("should write bad config");

    // When: Loading the config
    let result = packhorse_core::config::PackhorseConfig::load(&config_path).await;

    // Then: Should fail
    assert!(result.is_err(), "malformed TOML should fail to load");
}

#[tokio::test]
async fn test_config_validate_rejects_invalid_values() {
    // Given: Well-formed TOML with an out-of-range value
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config_path = temp_dir.path().join("packhorse.toml");

    fs::write(&config_path, "[archive]\nmax_entries = 0\n").expect("should write config");

    // When: Loading the config
    let result = packhorse_core::config::PackhorseConfig::load(&config_path).await;

    // Then: Validation should reject it
    assert!(result.is_err(), "zero max_entries should fail validation");
}

#[tokio::test]
async fn test_config_missing_file_reports_not_found() {
    let result =
        packhorse_core::config::PackhorseConfig::load("/nonexistent/dir/packhorse.toml").await;
    assert!(matches!(
        result,
        Err(packhorse_core::error::PackhorseError::Config(
            packhorse_core::error::ConfigError::FileNotFound { .. }
        ))
    ));
}
