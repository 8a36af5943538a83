//! Error taxonomy for the connectivity supervisor
//!
//! Every failure is handled locally by the component that detects it; the
//! only variant allowed to escape the supervisory loop is `PayloadTooLarge`,
//! which indicates a configuration or programming defect (the status payload
//! outgrew the transport buffer bound) rather than a transient runtime
//! condition.

use thiserror::Error;

/// Failures the supervisor can encounter during one cycle
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// Network layer unavailable before any broker exchange. The MQTT
    /// transport owns both link and session establishment, so its connect
    /// errors surface as `HandshakeFailure`; this variant is for transports
    /// that can tell the two apart.
    #[error("network link unavailable: {message}")]
    LinkFailure { message: String },

    #[error("broker handshake failed: {message}")]
    HandshakeFailure { message: String },

    #[error("publish failed on {topic}: {message}")]
    PublishFailure { topic: String, message: String },

    #[error("malformed config payload: {message}")]
    MalformedConfig { message: String },

    #[error("config value out of range: {requested_ms}ms not in [{min_ms}, {max_ms}]ms")]
    OutOfRangeConfig {
        requested_ms: u64,
        min_ms: u64,
        max_ms: u64,
    },

    #[error("status payload too large: {size} bytes exceeds limit of {limit}")]
    PayloadTooLarge { size: usize, limit: usize },
}

impl SupervisorError {
    /// Create a link failure error
    pub fn link_failure<S: Into<String>>(message: S) -> Self {
        Self::LinkFailure {
            message: message.into(),
        }
    }

    /// Create a handshake failure error
    pub fn handshake_failure<S: Into<String>>(message: S) -> Self {
        Self::HandshakeFailure {
            message: message.into(),
        }
    }

    /// Create a publish failure error
    pub fn publish_failure<S: Into<String>, T: Into<String>>(topic: S, message: T) -> Self {
        Self::PublishFailure {
            topic: topic.into(),
            message: message.into(),
        }
    }

    /// Create a malformed config error
    pub fn malformed_config<S: Into<String>>(message: S) -> Self {
        Self::MalformedConfig {
            message: message.into(),
        }
    }

    /// True for the one variant the supervisory loop must not swallow
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::PayloadTooLarge { .. })
    }
}

/// Result type for supervisor operations
pub type SupervisorResult<T> = Result<T, SupervisorError>;
