//! Message formats for the config and status topics
//!
//! Both directions are textual JSON. Inbound control messages carry the
//! requested publish cadence in seconds; outbound status messages carry the
//! current sensor snapshot plus device uptime. The status payload is bounded
//! by the transport's message buffer; an oversized payload is a construction
//! error, never a silent truncation.

use crate::device::SensorSnapshot;
use crate::error::SupervisorError;
use serde::{Deserialize, Serialize};

/// Maximum size of a rendered status payload in bytes, matching the
/// transport's message buffer bound
pub const MAX_STATUS_PAYLOAD: usize = 256;

/// Inbound control message requesting a new publish cadence
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConfigCommand {
    /// Requested publish interval in seconds
    pub publish_secs: u64,
}

impl ConfigCommand {
    /// Parse a config command from a raw payload
    pub fn parse(payload: &[u8]) -> Result<Self, SupervisorError> {
        serde_json::from_slice(payload)
            .map_err(|e| SupervisorError::malformed_config(e.to_string()))
    }

    /// Requested interval converted to milliseconds; checked so an absurd
    /// seconds value cannot wrap into the valid range
    pub fn requested_interval_ms(&self) -> Option<u64> {
        self.publish_secs.checked_mul(1000)
    }
}

/// Outbound periodic telemetry record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusPayload {
    pub temperature: f64,
    pub humidity: f64,
    /// Milliseconds since supervisor start
    pub uptime_ms: u64,
}

impl StatusPayload {
    pub fn from_snapshot(snapshot: &SensorSnapshot, uptime_ms: u64) -> Self {
        Self {
            temperature: snapshot.temperature,
            humidity: snapshot.humidity,
            uptime_ms,
        }
    }
}

/// Serialize a status payload, enforcing the transport buffer bound
pub fn render_status_payload(status: &StatusPayload) -> Result<String, SupervisorError> {
    render_with_limit(status, MAX_STATUS_PAYLOAD)
}

/// Serialize against an explicit size limit; a payload at or over the limit
/// is rejected whole, never truncated
pub fn render_with_limit(status: &StatusPayload, limit: usize) -> Result<String, SupervisorError> {
    let rendered = serde_json::to_string(status).map_err(|e| SupervisorError::PublishFailure {
        topic: String::new(),
        message: format!("status serialization failed: {e}"),
    })?;

    if rendered.len() >= limit {
        return Err(SupervisorError::PayloadTooLarge {
            size: rendered.len(),
            limit,
        });
    }

    Ok(rendered)
}
