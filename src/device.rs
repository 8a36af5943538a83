//! Physical I/O capability surface
//!
//! The supervisor never touches hardware directly; LED indication, button
//! sampling, and sensor reads go through the `Peripherals` trait so the core
//! can run against simulated or mock hardware.

use serde::{Deserialize, Serialize};

/// Default temperature reading before the first sensor sample
pub const DEFAULT_TEMPERATURE: f64 = 25.0;

/// Default humidity reading before the first sensor sample
pub const DEFAULT_HUMIDITY: f64 = 50.0;

/// Named numeric readings taken at one instant
///
/// Immutable for the duration of one emission; reads are independent and not
/// required to be coherent across emissions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SensorSnapshot {
    pub temperature: f64,
    pub humidity: f64,
}

impl Default for SensorSnapshot {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            humidity: DEFAULT_HUMIDITY,
        }
    }
}

/// Capability surface for the device's physical I/O
pub trait Peripherals: Send {
    /// Pulse the visual indicator briefly to signal an emission
    fn pulse_indicator(&mut self);

    /// Take a fresh sensor reading
    fn sample_sensors(&mut self) -> SensorSnapshot;

    /// Probe the physical input; true while asserted
    fn button_pressed(&mut self) -> bool;
}

/// Peripherals stand-in for hosts without real hardware
///
/// Sensor samples drift deterministically around the defaults so successive
/// readings are distinguishable in dashboards; the button never asserts.
#[derive(Debug, Default)]
pub struct SimulatedPeripherals {
    sample_count: u64,
    indicator_pulses: u64,
}

impl SimulatedPeripherals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of indicator pulses so far
    pub fn indicator_pulses(&self) -> u64 {
        self.indicator_pulses
    }
}

impl Peripherals for SimulatedPeripherals {
    fn pulse_indicator(&mut self) {
        self.indicator_pulses += 1;
        tracing::debug!(pulses = self.indicator_pulses, "indicator pulse");
    }

    fn sample_sensors(&mut self) -> SensorSnapshot {
        self.sample_count += 1;
        // Small triangular drift around the defaults, period 8 samples
        let phase = (self.sample_count % 8) as f64;
        let drift = if phase < 4.0 { phase } else { 8.0 - phase };
        SensorSnapshot {
            temperature: DEFAULT_TEMPERATURE + drift * 0.5,
            humidity: DEFAULT_HUMIDITY - drift,
        }
    }

    fn button_pressed(&mut self) -> bool {
        false
    }
}
