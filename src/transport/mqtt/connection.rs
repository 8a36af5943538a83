//! Pure connection plumbing for the MQTT link
//!
//! Option construction, credential resolution, and the transport error type
//! live here; the impure event-loop handling is in `client.rs`.

use crate::config::MqttSection;
use crate::protocol::topics::{DeviceTopics, DOWN_ANNOUNCEMENT};
use rumqttc::v5::mqttbytes::v5::LastWill;
use rumqttc::v5::{mqttbytes::QoS, MqttOptions};
use rumqttc::Transport as RumqttcTransport;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// MQTT transport errors
#[derive(Debug, Error)]
pub enum MqttError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Publishing failed")]
    PublishFailed(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("Subscription failed")]
    SubscriptionFailed(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("Invalid broker URL: {0}")]
    InvalidBrokerUrl(String),
    #[error("Not connected")]
    NotConnected,
    #[error("Handshake timed out after {0:?}")]
    HandshakeTimeout(Duration),
}

/// Build MQTT options from config, using the device identity as client id
///
/// Enables TLS for `mqtts://` URLs and installs a Last Will that announces
/// `"down"` on the device's up topic if the session dies uncleanly.
pub fn configure_mqtt_options(
    device_id: &str,
    config: &MqttSection,
) -> Result<MqttOptions, MqttError> {
    let url = Url::parse(&config.broker_url)
        .map_err(|_| MqttError::InvalidBrokerUrl(config.broker_url.clone()))?;

    let host = url
        .host_str()
        .ok_or_else(|| MqttError::InvalidBrokerUrl(config.broker_url.clone()))?;
    let port = url
        .port()
        .unwrap_or(if url.scheme() == "mqtts" { 8883 } else { 1883 });

    // The device identity doubles as the session client id
    let mut mqtt_options = MqttOptions::new(device_id, host, port);

    if url.scheme() == "mqtts" {
        let transport = RumqttcTransport::tls_with_default_config();
        mqtt_options.set_transport(transport);
    }

    // Credentials come from the environment, never from the config file
    if let Some(username_env) = &config.username_env {
        if let Ok(username) = std::env::var(username_env) {
            let password = config
                .password_env
                .as_ref()
                .and_then(|env_name| std::env::var(env_name).ok())
                .unwrap_or_default();
            mqtt_options.set_credentials(&username, &password);
        }
    }

    mqtt_options.set_keep_alive(Duration::from_secs(60));

    let topics = DeviceTopics::for_device(device_id);
    let lwt = LastWill::new(
        topics.up(),
        DOWN_ANNOUNCEMENT,
        QoS::AtLeastOnce,
        false,
        None,
    );
    mqtt_options.set_last_will(lwt);

    Ok(mqtt_options)
}
