//! Mock implementations for testing
//!
//! Provides mock Transport and Peripherals implementations so the supervisor
//! core can be exercised without a broker or hardware.

use crate::device::{Peripherals, SensorSnapshot};
use crate::error::SupervisorError;
use crate::transport::{InboundMessage, Transport};
use std::collections::VecDeque;

/// Mock transport recording every interaction
#[derive(Debug, Default)]
pub struct MockTransport {
    connected: bool,
    /// Number of connect attempts observed
    pub connect_calls: u32,
    /// Scripted connect outcomes; when empty, connects succeed
    pub connect_failures: u32,
    /// Topics subscribed to, in order
    pub subscriptions: Vec<String>,
    /// (topic, payload, retain) for every publish
    pub published: Vec<(String, Vec<u8>, bool)>,
    /// Messages surfaced by successive poll calls
    pub inbound: VecDeque<InboundMessage>,
    /// When true, every publish fails
    pub fail_publish: bool,
    /// When true, the next liveness probe reports loss
    pub drop_connection: bool,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mock that fails the first `n` connect attempts
    pub fn failing_connects(n: u32) -> Self {
        Self {
            connect_failures: n,
            ..Default::default()
        }
    }

    /// Queue an inbound message for a later poll
    pub fn push_inbound(&mut self, topic: &str, payload: &[u8]) {
        self.inbound.push_back(InboundMessage {
            topic: topic.to_string(),
            payload: payload.to_vec(),
        });
    }

    /// Payloads published to one topic
    pub fn published_on(&self, topic: &str) -> Vec<Vec<u8>> {
        self.published
            .iter()
            .filter(|(t, _, _)| t == topic)
            .map(|(_, payload, _)| payload.clone())
            .collect()
    }
}

#[async_trait::async_trait]
impl Transport for MockTransport {
    type Error = SupervisorError;

    async fn connect(&mut self) -> Result<(), Self::Error> {
        self.connect_calls += 1;
        if self.connect_failures > 0 {
            self.connect_failures -= 1;
            return Err(SupervisorError::handshake_failure("mock connect failure"));
        }
        self.connected = true;
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), Self::Error> {
        self.connected = false;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected && !self.drop_connection
    }

    async fn subscribe(&mut self, topic: &str) -> Result<(), Self::Error> {
        if !self.connected {
            return Err(SupervisorError::handshake_failure("not connected"));
        }
        self.subscriptions.push(topic.to_string());
        Ok(())
    }

    async fn publish(
        &mut self,
        topic: &str,
        payload: Vec<u8>,
        retain: bool,
    ) -> Result<(), Self::Error> {
        if !self.connected {
            return Err(SupervisorError::publish_failure(topic, "not connected"));
        }
        if self.fail_publish {
            return Err(SupervisorError::publish_failure(topic, "mock publish failure"));
        }
        self.published.push((topic.to_string(), payload, retain));
        Ok(())
    }

    async fn poll(&mut self) -> Result<Option<InboundMessage>, Self::Error> {
        Ok(self.inbound.pop_front())
    }
}

/// Mock peripherals with scripted button presses
#[derive(Debug, Default)]
pub struct MockPeripherals {
    /// Number of indicator pulses observed
    pub pulses: u32,
    /// Number of sensor samples taken
    pub samples: u32,
    /// Scripted button probe results; empty means not pressed
    pub button_script: VecDeque<bool>,
}

impl MockPeripherals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_button_press(mut self) -> Self {
        self.button_script.push_back(true);
        self
    }
}

impl Peripherals for MockPeripherals {
    fn pulse_indicator(&mut self) {
        self.pulses += 1;
    }

    fn sample_sensors(&mut self) -> SensorSnapshot {
        self.samples += 1;
        SensorSnapshot {
            temperature: 20.0 + f64::from(self.samples),
            humidity: 40.0 + f64::from(self.samples),
        }
    }

    fn button_pressed(&mut self) -> bool {
        self.button_script.pop_front().unwrap_or(false)
    }
}
