//! MQTT implementation of the transport capability

mod client;
mod connection;

pub use client::MqttLink;
pub use connection::{configure_mqtt_options, MqttError};
