//! Telemetry scheduling
//!
//! Owns the mutable publish interval and the tick accumulator. The interval
//! is measured in real elapsed wall-clock milliseconds credited per cycle;
//! raw loop-iteration counting is not reproducible under a variable cycle
//! delay.

use crate::error::SupervisorError;

/// Lower bound on the publish interval in milliseconds
pub const MIN_INTERVAL_MS: u64 = 1000;

/// Upper bound on the publish interval in milliseconds
pub const MAX_INTERVAL_MS: u64 = 30_000;

/// Publish interval before any remote reconfiguration
pub const DEFAULT_INTERVAL_MS: u64 = 5000;

/// Decides when the next status emission is due
#[derive(Debug, Clone)]
pub struct TelemetryScheduler {
    interval_ms: u64,
    accumulated_ms: u64,
}

impl Default for TelemetryScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_INTERVAL_MS)
    }
}

impl TelemetryScheduler {
    /// Create a scheduler; out-of-range starting intervals are clamped to
    /// the default (config validation rejects them before we get here)
    pub fn new(interval_ms: u64) -> Self {
        let interval_ms = if (MIN_INTERVAL_MS..=MAX_INTERVAL_MS).contains(&interval_ms) {
            interval_ms
        } else {
            DEFAULT_INTERVAL_MS
        };
        Self {
            interval_ms,
            accumulated_ms: 0,
        }
    }

    /// Current publish interval in milliseconds
    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    /// Progress toward the next emission in milliseconds
    pub fn accumulated_ms(&self) -> u64 {
        self.accumulated_ms
    }

    /// Credit one cycle's elapsed time
    pub fn tick(&mut self, elapsed_ms: u64) {
        self.accumulated_ms = self.accumulated_ms.saturating_add(elapsed_ms);
    }

    /// True when an emission is due; the caller must emit and then `reset`
    pub fn should_emit(&self) -> bool {
        self.accumulated_ms >= self.interval_ms
    }

    /// Clear the accumulator after an emission
    pub fn reset(&mut self) {
        self.accumulated_ms = 0;
    }

    /// Replace the interval; the only mutation path, so a value outside
    /// [MIN_INTERVAL_MS, MAX_INTERVAL_MS] can never be persisted
    pub fn apply_interval(&mut self, interval_ms: u64) -> Result<(), SupervisorError> {
        if !(MIN_INTERVAL_MS..=MAX_INTERVAL_MS).contains(&interval_ms) {
            return Err(SupervisorError::OutOfRangeConfig {
                requested_ms: interval_ms,
                min_ms: MIN_INTERVAL_MS,
                max_ms: MAX_INTERVAL_MS,
            });
        }
        self.interval_ms = interval_ms;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_default_interval() {
        let scheduler = TelemetryScheduler::default();
        assert_eq!(scheduler.interval_ms(), DEFAULT_INTERVAL_MS);
        assert_eq!(scheduler.accumulated_ms(), 0);
        assert!(!scheduler.should_emit());
    }

    #[test]
    fn test_emission_due_at_interval() {
        let mut scheduler = TelemetryScheduler::new(5000);

        scheduler.tick(4999);
        assert!(!scheduler.should_emit());

        scheduler.tick(1);
        assert!(scheduler.should_emit());

        scheduler.reset();
        assert!(!scheduler.should_emit());
        assert_eq!(scheduler.accumulated_ms(), 0);
    }

    #[test]
    fn test_overshoot_still_single_emission() {
        let mut scheduler = TelemetryScheduler::new(1000);
        // A long stall overshoots by many intervals; one reset clears it
        scheduler.tick(10_000);
        assert!(scheduler.should_emit());
        scheduler.reset();
        assert!(!scheduler.should_emit());
    }

    #[test]
    fn test_apply_interval_in_range() {
        let mut scheduler = TelemetryScheduler::default();
        scheduler.apply_interval(10_000).unwrap();
        assert_eq!(scheduler.interval_ms(), 10_000);

        scheduler.apply_interval(MIN_INTERVAL_MS).unwrap();
        assert_eq!(scheduler.interval_ms(), MIN_INTERVAL_MS);

        scheduler.apply_interval(MAX_INTERVAL_MS).unwrap();
        assert_eq!(scheduler.interval_ms(), MAX_INTERVAL_MS);
    }

    #[test]
    fn test_apply_interval_out_of_range_retains_prior() {
        let mut scheduler = TelemetryScheduler::default();

        let result = scheduler.apply_interval(0);
        assert!(matches!(
            result,
            Err(SupervisorError::OutOfRangeConfig { .. })
        ));
        assert_eq!(scheduler.interval_ms(), DEFAULT_INTERVAL_MS);

        let result = scheduler.apply_interval(MAX_INTERVAL_MS + 1);
        assert!(result.is_err());
        assert_eq!(scheduler.interval_ms(), DEFAULT_INTERVAL_MS);
    }

    #[test]
    fn test_accumulator_saturates() {
        let mut scheduler = TelemetryScheduler::new(1000);
        scheduler.tick(u64::MAX);
        scheduler.tick(u64::MAX);
        assert!(scheduler.should_emit());
    }

    #[test]
    fn test_new_clamps_out_of_range_start() {
        let scheduler = TelemetryScheduler::new(0);
        assert_eq!(scheduler.interval_ms(), DEFAULT_INTERVAL_MS);
    }

    proptest! {
        #[test]
        fn interval_never_leaves_bounds(updates in proptest::collection::vec(any::<u64>(), 0..64)) {
            let mut scheduler = TelemetryScheduler::default();
            for update in updates {
                let _ = scheduler.apply_interval(update);
                prop_assert!(scheduler.interval_ms() >= MIN_INTERVAL_MS);
                prop_assert!(scheduler.interval_ms() <= MAX_INTERVAL_MS);
            }
        }

        #[test]
        fn valid_updates_always_apply(interval in MIN_INTERVAL_MS..=MAX_INTERVAL_MS) {
            let mut scheduler = TelemetryScheduler::default();
            prop_assert!(scheduler.apply_interval(interval).is_ok());
            prop_assert_eq!(scheduler.interval_ms(), interval);
        }
    }
}
