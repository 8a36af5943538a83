//! Device configuration loaded from a TOML file
//!
//! Broker credentials are never stored in the file itself; the config names
//! environment variables and the values are resolved at connect time. All
//! other settings are either compile-time constants or runtime-mutable
//! in-memory state.

use crate::supervisor::scheduler::{MAX_INTERVAL_MS, MIN_INTERVAL_MS};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Top-level configuration for one telemetry device
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeviceConfig {
    pub device: DeviceSection,
    pub mqtt: MqttSection,
    #[serde(default)]
    pub telemetry: TelemetrySection,
}

/// Device identity section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeviceSection {
    /// Device identifier (must match [a-zA-Z0-9._-]+); doubles as the MQTT
    /// client id and the topic namespace component
    pub id: String,
}

/// MQTT broker section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MqttSection {
    /// Broker URL with protocol and port (mqtt:// or mqtts://)
    pub broker_url: String,
    /// Environment variable containing the username
    pub username_env: Option<String>,
    /// Environment variable containing the password
    pub password_env: Option<String>,
    /// Upper bound on one broker handshake attempt in milliseconds
    #[serde(default = "default_handshake_timeout_ms")]
    pub handshake_timeout_ms: u64,
    /// Fixed delay between failed connection attempts in milliseconds
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

/// Telemetry cadence section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TelemetrySection {
    /// Initial publish interval in milliseconds; remotely reconfigurable
    /// within [MIN_INTERVAL_MS, MAX_INTERVAL_MS] while running
    #[serde(default = "default_interval_ms")]
    pub default_interval_ms: u64,
    /// Delay between supervisory cycles in milliseconds
    #[serde(default = "default_cycle_delay_ms")]
    pub cycle_delay_ms: u64,
    /// Debounce delay after a button press in milliseconds
    #[serde(default = "default_debounce_delay_ms")]
    pub debounce_delay_ms: u64,
}

impl Default for TelemetrySection {
    fn default() -> Self {
        Self {
            default_interval_ms: default_interval_ms(),
            cycle_delay_ms: default_cycle_delay_ms(),
            debounce_delay_ms: default_debounce_delay_ms(),
        }
    }
}

fn default_handshake_timeout_ms() -> u64 {
    5000
}

fn default_retry_delay_ms() -> u64 {
    100
}

fn default_interval_ms() -> u64 {
    5000
}

fn default_cycle_delay_ms() -> u64 {
    1000
}

fn default_debounce_delay_ms() -> u64 {
    200
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),
    #[error("Invalid device ID format: {0}")]
    InvalidDeviceId(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl DeviceConfig {
    /// Load configuration from a TOML file and validate it
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: DeviceConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate identity and cadence settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_device_id(&self.device.id)?;

        let interval = self.telemetry.default_interval_ms;
        if !(MIN_INTERVAL_MS..=MAX_INTERVAL_MS).contains(&interval) {
            return Err(ConfigError::InvalidConfig(format!(
                "default_interval_ms {interval} outside [{MIN_INTERVAL_MS}, {MAX_INTERVAL_MS}]"
            )));
        }

        if self.telemetry.cycle_delay_ms == 0 {
            return Err(ConfigError::InvalidConfig(
                "cycle_delay_ms must be greater than 0".to_string(),
            ));
        }

        if self.mqtt.retry_delay_ms == 0 {
            return Err(ConfigError::InvalidConfig(
                "retry_delay_ms must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Helper to get an optional environment variable
    fn get_env_var_optional(env_var_name: Option<&String>) -> Option<String> {
        env_var_name.and_then(|name| std::env::var(name).ok())
    }

    /// Get the MQTT username from its environment variable
    pub fn get_mqtt_username(&self) -> Option<String> {
        Self::get_env_var_optional(self.mqtt.username_env.as_ref())
    }

    /// Get the MQTT password from its environment variable
    pub fn get_mqtt_password(&self) -> Option<String> {
        Self::get_env_var_optional(self.mqtt.password_env.as_ref())
    }

    /// Create a test configuration for unit testing
    #[cfg(test)]
    pub fn test_config() -> Self {
        let toml_content = r#"
[device]
id = "test-device"

[mqtt]
broker_url = "mqtt://localhost:1883"
"#;
        toml::from_str(toml_content).expect("Test config should parse")
    }
}

/// Validate device ID format
pub fn validate_device_id(device_id: &str) -> Result<(), ConfigError> {
    let valid_chars = device_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-');

    if device_id.is_empty() || !valid_chars {
        return Err(ConfigError::InvalidDeviceId(format!(
            "Device ID '{device_id}' must match pattern [a-zA-Z0-9._-]+"
        )));
    }

    Ok(())
}
