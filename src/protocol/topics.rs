//! Topic construction for one device identity
//!
//! Three fixed topics are scoped to a single device: an "up" announcement
//! topic (published once per successful session establishment), a status
//! topic (periodic telemetry), and a config topic (subscribed, inbound
//! only). Topic names are fixed at startup and not reconfigurable.

/// Announcement payload published once per session establishment
pub const UP_ANNOUNCEMENT: &str = "up";

/// Payload the broker publishes on our behalf when the session dies
pub const DOWN_ANNOUNCEMENT: &str = "down";

pub fn canonicalize_topic(topic: &str) -> String {
    if topic.is_empty() {
        return "/".to_string();
    }

    // Single leading slash
    let mut result = if topic.starts_with('/') {
        topic.to_string()
    } else {
        format!("/{topic}")
    };

    // Collapse consecutive slashes
    while result.contains("//") {
        result = result.replace("//", "/");
    }

    // No trailing slash (except for root "/")
    if result.len() > 1 && result.ends_with('/') {
        result.pop();
    }

    result
}

/// The three topics belonging to one device identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceTopics {
    up: String,
    status: String,
    config: String,
}

impl DeviceTopics {
    /// Build the topic set for a device: `/devices/{id}/{up,status,config}`
    pub fn for_device(device_id: &str) -> Self {
        Self {
            up: canonicalize_topic(&format!("/devices/{device_id}/up")),
            status: canonicalize_topic(&format!("/devices/{device_id}/status")),
            config: canonicalize_topic(&format!("/devices/{device_id}/config")),
        }
    }

    /// Topic for the one-time "up" announcement
    pub fn up(&self) -> &str {
        &self.up
    }

    /// Topic for periodic status telemetry
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Topic the device subscribes to for inbound control messages
    pub fn config(&self) -> &str {
        &self.config
    }
}
