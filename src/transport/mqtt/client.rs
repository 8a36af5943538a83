//! Impure I/O for the MQTT link
//!
//! `MqttLink` owns the rumqttc client and event loop on the supervisor's
//! own task. There is no background task: `connect()` drives the event loop
//! until the broker acknowledges the session (bounded by the handshake
//! timeout), and `poll()` drives it within a small per-cycle budget,
//! surfacing at most one inbound message.

use super::connection::{configure_mqtt_options, MqttError};
use crate::config::MqttSection;
use crate::transport::{InboundMessage, Transport};
use rumqttc::v5::mqttbytes::v5::Packet;
use rumqttc::v5::{mqttbytes::QoS, AsyncClient, Event, EventLoop};
use std::time::Duration;
use tracing::{debug, warn};

/// Budget for driving the event loop during one supervisory cycle
const POLL_BUDGET: Duration = Duration::from_millis(100);

/// MQTT transport handle for one device session
pub struct MqttLink {
    device_id: String,
    config: MqttSection,
    client: Option<AsyncClient>,
    event_loop: Option<EventLoop>,
    connected: bool,
}

impl MqttLink {
    pub fn new(device_id: &str, config: MqttSection) -> Self {
        Self {
            device_id: device_id.to_string(),
            config,
            client: None,
            event_loop: None,
            connected: false,
        }
    }

    /// QoS selection: retained messages get at-least-once, transient
    /// telemetry is fire-and-forget
    fn qos_for(retain: bool) -> QoS {
        if retain {
            QoS::AtLeastOnce
        } else {
            QoS::AtMostOnce
        }
    }

    fn client(&self) -> Result<&AsyncClient, MqttError> {
        if !self.connected {
            return Err(MqttError::NotConnected);
        }
        self.client.as_ref().ok_or(MqttError::NotConnected)
    }

    /// Drive the event loop until ConnAck, a failure, or the deadline
    async fn wait_for_connack(
        event_loop: &mut EventLoop,
        timeout: Duration,
    ) -> Result<(), MqttError> {
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                return Err(MqttError::HandshakeTimeout(timeout));
            }

            match tokio::time::timeout(remaining, event_loop.poll()).await {
                Ok(Ok(Event::Incoming(Packet::ConnAck(_)))) => return Ok(()),
                Ok(Ok(event)) => {
                    debug!(?event, "event before ConnAck");
                }
                Ok(Err(e)) => return Err(MqttError::ConnectionFailed(e.to_string())),
                Err(_) => return Err(MqttError::HandshakeTimeout(timeout)),
            }
        }
    }

    fn mark_disconnected(&mut self, reason: &str) {
        if self.connected {
            warn!(device_id = %self.device_id, reason, "MQTT session lost");
        }
        self.connected = false;
    }
}

#[async_trait::async_trait]
impl Transport for MqttLink {
    type Error = MqttError;

    async fn connect(&mut self) -> Result<(), MqttError> {
        let mqtt_options = configure_mqtt_options(&self.device_id, &self.config)?;

        // A fresh client and event loop per attempt; a half-open previous
        // session must not leak into the new one
        let (client, mut event_loop) = AsyncClient::new(mqtt_options, 10);

        let timeout = Duration::from_millis(self.config.handshake_timeout_ms);
        Self::wait_for_connack(&mut event_loop, timeout).await?;

        self.client = Some(client);
        self.event_loop = Some(event_loop);
        self.connected = true;
        debug!(device_id = %self.device_id, "MQTT session established");
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), MqttError> {
        if let Some(client) = self.client.take() {
            let _ = client.disconnect().await;
        }
        self.event_loop = None;
        self.connected = false;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    async fn subscribe(&mut self, topic: &str) -> Result<(), MqttError> {
        let client = self.client()?;
        client
            .subscribe(topic, QoS::AtLeastOnce)
            .await
            .map_err(|e| MqttError::SubscriptionFailed(Box::new(e)))
    }

    async fn publish(
        &mut self,
        topic: &str,
        payload: Vec<u8>,
        retain: bool,
    ) -> Result<(), MqttError> {
        let client = self.client()?;
        client
            .publish(topic, Self::qos_for(retain), retain, payload)
            .await
            .map_err(|e| MqttError::PublishFailed(Box::new(e)))
    }

    async fn poll(&mut self) -> Result<Option<InboundMessage>, MqttError> {
        let event_loop = match self.event_loop.as_mut() {
            Some(event_loop) if self.connected => event_loop,
            _ => return Err(MqttError::NotConnected),
        };

        match tokio::time::timeout(POLL_BUDGET, event_loop.poll()).await {
            Ok(Ok(Event::Incoming(Packet::Publish(publish)))) => Ok(Some(InboundMessage {
                topic: String::from_utf8_lossy(&publish.topic).to_string(),
                payload: publish.payload.to_vec(),
            })),
            Ok(Ok(Event::Incoming(Packet::Disconnect(_)))) => {
                self.mark_disconnected("broker disconnect");
                Ok(None)
            }
            Ok(Ok(event)) => {
                debug!(?event, "MQTT event");
                Ok(None)
            }
            Ok(Err(e)) => {
                self.mark_disconnected(&e.to_string());
                Ok(None)
            }
            // No pending work within the budget
            Err(_) => Ok(None),
        }
    }
}
