//! telemetryd - Connectivity supervisor for a networked telemetry device
//!
//! A single cooperative supervisory loop keeps one device's broker session
//! alive, emits periodic status telemetry, and accepts remote reconfiguration
//! of the reporting interval over the device's config topic.
//!
//! # Overview
//!
//! - Session lifecycle with an explicit retry gate and retry-forever policy
//! - Accumulator-based telemetry scheduling with bounded intervals
//! - Inbound config intake (JSON `publish_secs` commands) with strict
//!   range validation
//! - Bounded status payload construction, oversize treated as fatal
//! - MQTT transport behind a trait seam, mockable for tests

pub mod config;
pub mod device;
pub mod error;
pub mod observability;
pub mod protocol;
pub mod supervisor;
pub mod testing;
pub mod transport;

pub use config::DeviceConfig;
pub use error::{SupervisorError, SupervisorResult};
pub use supervisor::Supervisor;
pub use transport::MqttTransport;
