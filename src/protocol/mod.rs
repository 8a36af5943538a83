//! Wire-facing types: topic construction and message formats

pub mod messages;
pub mod topics;

pub use messages::{render_status_payload, ConfigCommand, StatusPayload, MAX_STATUS_PAYLOAD};
pub use topics::{canonicalize_topic, DeviceTopics, UP_ANNOUNCEMENT};
