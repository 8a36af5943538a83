//! Status telemetry emission
//!
//! Builds the bounded status payload from the current sensor snapshot and
//! publishes it on the status topic. Publish failures are reported upward
//! and not retried here; the next scheduled emission is unaffected. An
//! oversized payload is a construction defect and propagates as fatal.

use crate::device::{Peripherals, SensorSnapshot};
use crate::error::{SupervisorError, SupervisorResult};
use crate::protocol::messages::{render_with_limit, StatusPayload, MAX_STATUS_PAYLOAD};
use crate::transport::Transport;
use tracing::debug;

/// Publishes periodic telemetry for one device
#[derive(Debug, Clone)]
pub struct StatusPublisher {
    status_topic: String,
    payload_limit: usize,
}

impl StatusPublisher {
    pub fn new(status_topic: &str) -> Self {
        Self::with_payload_limit(status_topic, MAX_STATUS_PAYLOAD)
    }

    /// Publisher with a non-default payload bound
    pub fn with_payload_limit(status_topic: &str, payload_limit: usize) -> Self {
        Self {
            status_topic: status_topic.to_string(),
            payload_limit,
        }
    }

    /// Build and publish one status record, pulsing the indicator on success
    pub async fn publish_status<T: Transport, P: Peripherals>(
        &self,
        transport: &mut T,
        peripherals: &mut P,
        snapshot: &SensorSnapshot,
        uptime_ms: u64,
    ) -> SupervisorResult<()> {
        let status = StatusPayload::from_snapshot(snapshot, uptime_ms);
        let payload = render_with_limit(&status, self.payload_limit)?;

        debug!(topic = %self.status_topic, payload = %payload, "publishing status");

        transport
            .publish(&self.status_topic, payload.into_bytes(), false)
            .await
            .map_err(|e| SupervisorError::publish_failure(&self.status_topic, e.to_string()))?;

        peripherals.pulse_indicator();
        Ok(())
    }
}
