//! Session lifecycle supervision
//!
//! Owns the connection state machine and the retry-forever policy. The
//! retry gate is explicit state (next allowed attempt time plus an attempt
//! counter) rather than a blocking delay, so the supervisory loop keeps
//! cycling while the session is down.

use crate::error::{SupervisorError, SupervisorResult};
use crate::protocol::topics::{DeviceTopics, UP_ANNOUNCEMENT};
use crate::transport::Transport;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, warn};

/// Broker session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Maintains the broker session across the loop's cycles
#[derive(Debug)]
pub struct SessionSupervisor {
    topics: DeviceTopics,
    state: SessionState,
    retry_delay: Duration,
    next_attempt_at: Option<Instant>,
    attempts: u32,
}

impl SessionSupervisor {
    pub fn new(topics: DeviceTopics, retry_delay: Duration) -> Self {
        Self {
            topics,
            state: SessionState::Disconnected,
            retry_delay,
            next_attempt_at: None,
            attempts: 0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == SessionState::Connected
    }

    /// Connection attempts since the last successful establishment
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Ensure the session is alive; idempotent and safe to call every cycle
    ///
    /// Returns Ok(true) when the session is up, Ok(false) when an attempt
    /// is gated by the retry delay. A failed attempt arms the gate and
    /// surfaces as a non-fatal error; attempts continue indefinitely.
    /// The transport owns both link and broker establishment, so every
    /// `connect` failure is reported uniformly as a handshake failure; the
    /// retry policy does not distinguish the two.
    pub async fn ensure_connected<T: Transport>(
        &mut self,
        transport: &mut T,
    ) -> SupervisorResult<bool> {
        if self.state == SessionState::Connected {
            // O(1) liveness probe
            if transport.is_connected() {
                return Ok(true);
            }
            warn!("transport reports session loss");
            self.state = SessionState::Disconnected;
        }

        if let Some(at) = self.next_attempt_at {
            if Instant::now() < at {
                return Ok(false);
            }
        }

        self.state = SessionState::Connecting;
        self.attempts += 1;

        if let Err(e) = transport.connect().await {
            self.arm_retry();
            return Err(SupervisorError::handshake_failure(e.to_string()));
        }

        // The session only counts once the config subscription and the
        // announcement are in place; a failure here tears the attempt down
        if let Err(e) = transport.subscribe(self.topics.config()).await {
            let _ = transport.disconnect().await;
            self.arm_retry();
            return Err(SupervisorError::handshake_failure(format!(
                "config subscription failed: {e}"
            )));
        }

        if let Err(e) = transport
            .publish(self.topics.up(), UP_ANNOUNCEMENT.as_bytes().to_vec(), false)
            .await
        {
            let _ = transport.disconnect().await;
            self.arm_retry();
            return Err(SupervisorError::handshake_failure(format!(
                "up announcement failed: {e}"
            )));
        }

        info!(
            attempts = self.attempts,
            config_topic = %self.topics.config(),
            "session established"
        );
        self.state = SessionState::Connected;
        self.next_attempt_at = None;
        self.attempts = 0;
        Ok(true)
    }

    fn arm_retry(&mut self) {
        self.state = SessionState::Disconnected;
        self.next_attempt_at = Some(Instant::now() + self.retry_delay);
    }
}
