//! Configuration loading and validation tests
//!
//! Tests focus on BEHAVIOR of configuration loading, validation, and error
//! handling, not implementation details of TOML parsing.

use std::io::Write;
use telemetryd::config::{ConfigError, DeviceConfig};
use tempfile::NamedTempFile;

#[test]
fn test_config_loads_successfully_from_valid_toml() {
    let mut temp_file = NamedTempFile::new().unwrap();
    writeln!(
        temp_file,
        r#"
[device]
id = "esp32-kitchen"

[mqtt]
broker_url = "mqtts://broker.example.com:8883"
username_env = "MQTT_USER"
password_env = "MQTT_PASS"

[telemetry]
default_interval_ms = 10000
"#
    )
    .unwrap();

    let config = DeviceConfig::load_from_file(temp_file.path()).unwrap();

    assert_eq!(config.device.id, "esp32-kitchen");
    assert_eq!(config.mqtt.broker_url, "mqtts://broker.example.com:8883");
    assert_eq!(config.mqtt.username_env, Some("MQTT_USER".to_string()));
    assert_eq!(config.mqtt.password_env, Some("MQTT_PASS".to_string()));
    assert_eq!(config.telemetry.default_interval_ms, 10000);
}

#[test]
fn test_config_defaults_applied_for_omitted_sections() {
    let mut temp_file = NamedTempFile::new().unwrap();
    writeln!(
        temp_file,
        r#"
[device]
id = "minimal-device"

[mqtt]
broker_url = "mqtt://localhost:1883"
"#
    )
    .unwrap();

    let config = DeviceConfig::load_from_file(temp_file.path()).unwrap();

    assert_eq!(config.telemetry.default_interval_ms, 5000);
    assert_eq!(config.telemetry.cycle_delay_ms, 1000);
    assert_eq!(config.telemetry.debounce_delay_ms, 200);
    assert_eq!(config.mqtt.handshake_timeout_ms, 5000);
    assert_eq!(config.mqtt.retry_delay_ms, 100);
}

#[test]
fn test_config_rejects_invalid_device_id() {
    let mut temp_file = NamedTempFile::new().unwrap();
    writeln!(
        temp_file,
        r#"
[device]
id = "bad device!"

[mqtt]
broker_url = "mqtt://localhost:1883"
"#
    )
    .unwrap();

    let result = DeviceConfig::load_from_file(temp_file.path());
    assert!(matches!(result, Err(ConfigError::InvalidDeviceId(_))));
}

#[test]
fn test_config_rejects_out_of_bounds_interval() {
    let mut temp_file = NamedTempFile::new().unwrap();
    writeln!(
        temp_file,
        r#"
[device]
id = "fast-device"

[mqtt]
broker_url = "mqtt://localhost:1883"

[telemetry]
default_interval_ms = 100
"#
    )
    .unwrap();

    let result = DeviceConfig::load_from_file(temp_file.path());
    assert!(matches!(result, Err(ConfigError::InvalidConfig(_))));
}

#[test]
fn test_config_rejects_malformed_toml() {
    let mut temp_file = NamedTempFile::new().unwrap();
    writeln!(temp_file, "this is not [valid toml").unwrap();

    let result = DeviceConfig::load_from_file(temp_file.path());
    assert!(matches!(result, Err(ConfigError::TomlParse(_))));
}

#[test]
fn test_config_missing_file_reports_read_error() {
    let result = DeviceConfig::load_from_file(std::path::Path::new(
        "/nonexistent/telemetryd.toml",
    ));
    assert!(matches!(result, Err(ConfigError::FileRead(_))));
}
