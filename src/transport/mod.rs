//! Transport layer for the broker session
//!
//! This module provides the transport abstraction the supervisor consumes
//! and the MQTT implementation behind it. Inbound delivery is an explicit
//! poll step returning zero-or-one pending message per cycle, so the config
//! handler never runs re-entrantly inside the transport's own machinery.

pub mod mqtt;

/// One message received on a subscribed topic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub topic: String,
    pub payload: Vec<u8>,
}

/// Capability surface the supervisor calls into
///
/// Implementations own link establishment, TLS, and the wire protocol; the
/// supervisor only sees connect/subscribe/publish/poll.
#[async_trait::async_trait]
pub trait Transport: Send {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Establish the link and broker session; one bounded attempt
    async fn connect(&mut self) -> Result<(), Self::Error>;

    /// Tear the session down
    async fn disconnect(&mut self) -> Result<(), Self::Error>;

    /// O(1) liveness probe; must be safe to call every cycle
    fn is_connected(&self) -> bool;

    /// Subscribe to a topic on the current session
    async fn subscribe(&mut self, topic: &str) -> Result<(), Self::Error>;

    /// Publish a payload; fire-and-forget beyond the transport's own QoS
    async fn publish(
        &mut self,
        topic: &str,
        payload: Vec<u8>,
        retain: bool,
    ) -> Result<(), Self::Error>;

    /// Drive pending transport work and surface at most one inbound message
    async fn poll(&mut self) -> Result<Option<InboundMessage>, Self::Error>;
}

/// Type alias for the MQTT transport
pub type MqttTransport = mqtt::MqttLink;
