//! Integration test: Configuration utilities
//!
//! Tests the bin_common configuration loading functionality.

use hyperlink_realtime::bin_common::{load_config_from_env, ConfigType};
use hyperlink_realtime::hyperlink::SupervisorConfig;
use std::env;

#[test]
fn test_supervisor_config_path_from_env() {
    env::remove_var("HYPERLINK_CONFIG_PATH");
    let config_path = load_config_from_env(ConfigType::Supervisor);
    assert_eq!(config_path.to_str().unwrap(), "config/hyperlink.yaml");

    env::set_var("HYPERLINK_CONFIG_PATH", "/etc/hyperlink/custom.yaml");
    let config_path = load_config_from_env(ConfigType::Supervisor);
    assert_eq!(config_path.to_str().unwrap(), "/etc/hyperlink/custom.yaml");
    env::remove_var("HYPERLINK_CONFIG_PATH");
}

#[test]
fn test_custom_config() {
    let custom = ConfigType::Custom("custom/path.yaml".to_string());
    let config_path = load_config_from_env(custom);

    assert_eq!(config_path.to_str().unwrap(), "custom/path.yaml");
}

#[test]
fn test_config_type_env_var_names() {
    assert_eq!(ConfigType::Supervisor.env_var_name(), "HYPERLINK_CONFIG_PATH");
}

#[test]
fn test_shipped_config_loads() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config/hyperlink.yaml");
    let config = SupervisorConfig::load(path).unwrap();

    assert_eq!(config.poll_interval_ms, 2000);
    assert_eq!(config.error_backoff_ms, 3000);
    assert_eq!(config.reconnect_delay_ms, 3000);
    assert_eq!(config.log_level, "info");
}
