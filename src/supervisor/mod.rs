//! The supervisory loop and its context
//!
//! A single cooperative task owns all mutable state: session, scheduler,
//! sensor snapshot, and the transport itself. Each cycle runs session
//! supervision, inbound dispatch, telemetry scheduling, and input sampling
//! in a fixed order, then sleeps the cycle delay.

pub mod intake;
pub mod scheduler;
pub mod session;
pub mod status;

use crate::config::DeviceConfig;
use crate::device::{Peripherals, SensorSnapshot};
use crate::error::SupervisorResult;
use crate::protocol::topics::DeviceTopics;
use crate::transport::Transport;
use intake::ConfigIntake;
use scheduler::TelemetryScheduler;
use session::SessionSupervisor;
use status::StatusPublisher;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::warn;

/// Owns the whole supervisor state; no ambient statics
pub struct Supervisor<T: Transport, P: Peripherals> {
    session: SessionSupervisor,
    scheduler: TelemetryScheduler,
    intake: ConfigIntake,
    publisher: StatusPublisher,
    snapshot: SensorSnapshot,
    transport: T,
    peripherals: P,
    cycle_delay: Duration,
    debounce_delay: Duration,
    started_at: Instant,
    last_tick: Instant,
}

impl<T: Transport, P: Peripherals> Supervisor<T, P> {
    pub fn new(config: &DeviceConfig, transport: T, peripherals: P) -> Self {
        let topics = DeviceTopics::for_device(&config.device.id);
        let now = Instant::now();

        Self {
            session: SessionSupervisor::new(
                topics.clone(),
                Duration::from_millis(config.mqtt.retry_delay_ms),
            ),
            scheduler: TelemetryScheduler::new(config.telemetry.default_interval_ms),
            intake: ConfigIntake::new(topics.config()),
            publisher: StatusPublisher::new(topics.status()),
            snapshot: SensorSnapshot::default(),
            transport,
            peripherals,
            cycle_delay: Duration::from_millis(config.telemetry.cycle_delay_ms),
            debounce_delay: Duration::from_millis(config.telemetry.debounce_delay_ms),
            started_at: now,
            last_tick: now,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn peripherals(&self) -> &P {
        &self.peripherals
    }

    pub fn scheduler(&self) -> &TelemetryScheduler {
        &self.scheduler
    }

    pub fn session(&self) -> &SessionSupervisor {
        &self.session
    }

    pub fn snapshot(&self) -> &SensorSnapshot {
        &self.snapshot
    }

    /// Run the loop until the shutdown channel fires
    ///
    /// Under normal operation this never returns; the only error path is
    /// the fatal payload-bound defect.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) -> SupervisorResult<()> {
        self.last_tick = Instant::now();

        loop {
            if *shutdown.borrow() {
                let _ = self.transport.disconnect().await;
                return Ok(());
            }

            self.run_cycle().await?;

            tokio::select! {
                _ = shutdown.changed() => {}
                _ = tokio::time::sleep(self.cycle_delay) => {}
            }
        }
    }

    /// One supervisory cycle
    pub async fn run_cycle(&mut self) -> SupervisorResult<()> {
        // 1. Session supervision; failures are logged and the loop goes on
        if let Err(e) = self.session.ensure_connected(&mut self.transport).await {
            warn!(error = %e, "session attempt failed");
        }

        // 2. Zero-or-one pending inbound message, dispatched synchronously
        if self.session.is_connected() {
            match self.transport.poll().await {
                Ok(Some(message)) => {
                    self.intake
                        .handle_inbound(&mut self.scheduler, &message.topic, &message.payload);
                }
                Ok(None) => {}
                Err(e) => warn!(error = %e, "transport poll failed"),
            }
        }

        // 3. Credit elapsed wall-clock time and emit if due
        let now = Instant::now();
        let elapsed_ms = now.duration_since(self.last_tick).as_millis() as u64;
        self.last_tick = now;
        self.scheduler.tick(elapsed_ms);

        if self.session.is_connected() && self.scheduler.should_emit() {
            let uptime_ms = self.started_at.elapsed().as_millis() as u64;
            let result = self
                .publisher
                .publish_status(
                    &mut self.transport,
                    &mut self.peripherals,
                    &self.snapshot,
                    uptime_ms,
                )
                .await;

            match result {
                Ok(()) => self.scheduler.reset(),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    // Dropped, not retried; the next fire lands one
                    // interval later
                    warn!(error = %e, "status publish failed");
                    self.scheduler.reset();
                }
            }
        }

        // 4. Physical input: a press refreshes the snapshot, then debounce
        if self.peripherals.button_pressed() {
            self.snapshot = self.peripherals.sample_sensors();
            tokio::time::sleep(self.debounce_delay).await;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::mocks::{MockPeripherals, MockTransport};

    fn test_supervisor(
        transport: MockTransport,
        peripherals: MockPeripherals,
    ) -> Supervisor<MockTransport, MockPeripherals> {
        let config = DeviceConfig::test_config();
        Supervisor::new(&config, transport, peripherals)
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_cycle_establishes_session() {
        let mut supervisor = test_supervisor(MockTransport::new(), MockPeripherals::new());

        supervisor.run_cycle().await.unwrap();

        assert!(supervisor.session().is_connected());
        assert_eq!(supervisor.transport().connect_calls, 1);
        assert_eq!(
            supervisor.transport().subscriptions,
            vec!["/devices/test-device/config"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_emission_after_default_interval() {
        let mut supervisor = test_supervisor(MockTransport::new(), MockPeripherals::new());

        // Default interval is 5000ms with a 1000ms cycle delay
        for _ in 0..5 {
            supervisor.run_cycle().await.unwrap();
            tokio::time::advance(Duration::from_millis(1000)).await;
        }
        supervisor.run_cycle().await.unwrap();

        let statuses = supervisor
            .transport()
            .published_on("/devices/test-device/status");
        assert_eq!(statuses.len(), 1);
        assert_eq!(supervisor.peripherals().pulses, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_publish_while_disconnected() {
        let transport = MockTransport::failing_connects(u32::MAX);
        let mut supervisor = test_supervisor(transport, MockPeripherals::new());

        for _ in 0..20 {
            supervisor.run_cycle().await.unwrap();
            tokio::time::advance(Duration::from_millis(1000)).await;
        }

        // Accumulator is far past the interval but nothing was published
        assert!(supervisor.scheduler().should_emit());
        assert!(supervisor.transport().published.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_update_changes_cadence() {
        let mut transport = MockTransport::new();
        transport.push_inbound("/devices/test-device/config", br#"{"publish_secs": 10}"#);
        let mut supervisor = test_supervisor(transport, MockPeripherals::new());

        // First cycle connects and applies the new 10s interval
        supervisor.run_cycle().await.unwrap();
        assert_eq!(supervisor.scheduler().interval_ms(), 10_000);

        // 5s of progress: the old interval would have fired, the new one
        // must not
        for _ in 0..5 {
            tokio::time::advance(Duration::from_millis(1000)).await;
            supervisor.run_cycle().await.unwrap();
        }
        assert!(supervisor
            .transport()
            .published_on("/devices/test-device/status")
            .is_empty());

        // 5 more seconds reaches 10s and fires
        for _ in 0..5 {
            tokio::time::advance(Duration::from_millis(1000)).await;
            supervisor.run_cycle().await.unwrap();
        }
        assert_eq!(
            supervisor
                .transport()
                .published_on("/devices/test-device/status")
                .len(),
            1
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_publish_failure_defers_to_next_fire() {
        let mut supervisor = test_supervisor(MockTransport::new(), MockPeripherals::new());

        // The session cannot establish while publishes fail (the "up"
        // announcement is part of establishment), so connect first and
        // then break publishing
        supervisor.run_cycle().await.unwrap();
        assert!(supervisor.session().is_connected());

        supervisor.transport.fail_publish = true;
        for _ in 0..5 {
            tokio::time::advance(Duration::from_millis(1000)).await;
            supervisor.run_cycle().await.unwrap();
        }

        // The failed emission reset the accumulator; no per-cycle retries
        assert!(!supervisor.scheduler().should_emit());
        assert_eq!(supervisor.peripherals().pulses, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_oversized_payload_terminates_loop() {
        let mut supervisor = test_supervisor(MockTransport::new(), MockPeripherals::new());
        supervisor.run_cycle().await.unwrap();
        assert!(supervisor.session().is_connected());

        // Shrink the payload bound below anything the record can render to
        supervisor.publisher = StatusPublisher::with_payload_limit("/devices/test-device/status", 10);

        for _ in 0..4 {
            tokio::time::advance(Duration::from_millis(1000)).await;
            supervisor.run_cycle().await.unwrap();
        }

        tokio::time::advance(Duration::from_millis(1000)).await;
        let result = supervisor.run_cycle().await;
        match result {
            Err(e) => assert!(e.is_fatal()),
            Ok(()) => panic!("oversized payload must terminate the cycle"),
        }

        // Nothing truncated reached the status topic
        assert!(supervisor
            .transport()
            .published_on("/devices/test-device/status")
            .is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_button_press_refreshes_snapshot() {
        let peripherals = MockPeripherals::new().with_button_press();
        let mut supervisor = test_supervisor(MockTransport::new(), peripherals);

        let before = *supervisor.snapshot();
        supervisor.run_cycle().await.unwrap();

        assert_ne!(*supervisor.snapshot(), before);
        assert_eq!(supervisor.peripherals().samples, 1);

        // No further presses, no further samples
        supervisor.run_cycle().await.unwrap();
        assert_eq!(supervisor.peripherals().samples, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_stops_on_shutdown() {
        let mut supervisor = test_supervisor(MockTransport::new(), MockPeripherals::new());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let run = supervisor.run(shutdown_rx);
        tokio::pin!(run);

        // Let a few cycles happen, then signal shutdown
        for _ in 0..3 {
            tokio::select! {
                biased;
                result = &mut run => panic!("loop ended early: {result:?}"),
                _ = tokio::time::sleep(Duration::from_millis(1000)) => {}
            }
        }
        shutdown_tx.send(true).unwrap();

        let result = tokio::time::timeout(Duration::from_secs(5), run).await;
        assert!(result.expect("loop should stop on shutdown").is_ok());
    }
}
