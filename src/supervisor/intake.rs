//! Inbound control message handling
//!
//! Parses and validates config-topic messages and applies interval updates
//! to the scheduler. Runs synchronously inside the loop's poll step; it
//! never blocks and never performs network I/O.

use super::scheduler::TelemetryScheduler;
use crate::error::SupervisorError;
use crate::protocol::messages::ConfigCommand;
use tracing::{debug, info, warn};

/// Classification of one inbound message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntakeOutcome {
    /// Interval replaced with the given value in milliseconds
    Applied(u64),
    /// Message arrived on a topic we do not handle
    UnknownTopic,
    /// Payload failed to parse as a config command
    Malformed,
    /// Value parsed but fell outside the interval bounds
    OutOfRange,
}

/// Routes inbound messages and applies validated interval updates
#[derive(Debug, Clone)]
pub struct ConfigIntake {
    config_topic: String,
}

impl ConfigIntake {
    pub fn new(config_topic: &str) -> Self {
        Self {
            config_topic: config_topic.to_string(),
        }
    }

    /// Handle one inbound message
    ///
    /// Rejections leave the scheduler untouched; there is no partial update.
    pub fn handle_inbound(
        &self,
        scheduler: &mut TelemetryScheduler,
        topic: &str,
        payload: &[u8],
    ) -> IntakeOutcome {
        if topic != self.config_topic {
            debug!(topic, expected = %self.config_topic, "unknown topic, message ignored");
            return IntakeOutcome::UnknownTopic;
        }

        let command = match ConfigCommand::parse(payload) {
            Ok(command) => command,
            Err(e) => {
                warn!(topic, error = %e, "malformed config payload, ignored");
                return IntakeOutcome::Malformed;
            }
        };

        // Seconds-to-milliseconds overflow means the value cannot be in range
        let requested_ms = match command.requested_interval_ms() {
            Some(ms) => ms,
            None => {
                warn!(
                    publish_secs = command.publish_secs,
                    "requested interval overflows, rejected"
                );
                return IntakeOutcome::OutOfRange;
            }
        };

        match scheduler.apply_interval(requested_ms) {
            Ok(()) => {
                info!(interval_ms = requested_ms, "publish interval updated");
                IntakeOutcome::Applied(requested_ms)
            }
            Err(SupervisorError::OutOfRangeConfig { .. }) => {
                warn!(
                    requested_ms,
                    prior_ms = scheduler.interval_ms(),
                    "requested interval out of range, prior value retained"
                );
                IntakeOutcome::OutOfRange
            }
            Err(e) => {
                warn!(error = %e, "interval update rejected");
                IntakeOutcome::OutOfRange
            }
        }
    }
}
