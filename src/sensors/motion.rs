// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/roomsense

//! Passive infrared motion sensor
//!
//! The PIR is sampled every 250 ms by a background task that feeds a
//! [`MotionLatch`]. The poll loop consumes the latch once per cycle.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::filters::MotionLatch;
use super::traits::metric_name;
use super::transport::Transport;
use super::{ReadError, Sensor, SensorKind, Signal, SignalValue};
use crate::core::TelemetryBus;

/// Interval between raw PIR samples
pub const SAMPLE_INTERVAL: Duration = Duration::from_millis(250);

/// Back-off after a failed raw read
pub const RETRY_DELAY: Duration = Duration::from_secs(5);

pub struct MotionSensor {
    name: String,
    latch: Arc<MotionLatch>,
    telemetry: Arc<TelemetryBus>,
    movement: bool,
    sampler: Option<JoinHandle<()>>,
}

impl MotionSensor {
    /// Start sampling `transport` until `shutdown` fires or the sensor is dropped
    pub fn spawn(
        name: &str,
        transport: Transport<bool>,
        telemetry: Arc<TelemetryBus>,
        shutdown: broadcast::Receiver<()>,
    ) -> Self {
        let latch = Arc::new(MotionLatch::new());
        let handle = tokio::spawn(sample_loop(
            name.to_string(),
            transport,
            latch.clone(),
            shutdown,
        ));

        let mut sensor = Self::with_latch(name, latch, telemetry);
        sensor.sampler = Some(handle);
        sensor
    }

    /// Sensor over an externally fed latch, without a sampler task
    pub(crate) fn with_latch(name: &str, latch: Arc<MotionLatch>, telemetry: Arc<TelemetryBus>) -> Self {
        Self {
            name: name.to_string(),
            latch,
            telemetry,
            movement: false,
            sampler: None,
        }
    }

    pub fn movement(&self) -> bool {
        self.movement
    }
}

async fn sample_loop(
    name: String,
    mut transport: Transport<bool>,
    latch: Arc<MotionLatch>,
    mut shutdown: broadcast::Receiver<()>,
) {
    debug!("Motion sampler started for {}", name);

    loop {
        let delay = match transport.read() {
            Ok(detected) => {
                latch.record(detected);
                SAMPLE_INTERVAL
            }
            Err(e) => {
                warn!("Failed to read movement from PIR sensor \"{}\": {}", name, e);
                RETRY_DELAY
            }
        };

        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = shutdown.recv() => {
                debug!("Motion sampler stopped for {}", name);
                break;
            }
        }
    }
}

impl Drop for MotionSensor {
    fn drop(&mut self) {
        if let Some(handle) = self.sampler.take() {
            handle.abort();
        }
    }
}

#[async_trait]
impl Sensor for MotionSensor {
    fn name(&self) -> &str { &self.name }
    fn kind(&self) -> SensorKind { SensorKind::Pir }
    fn signals(&self) -> &'static [Signal] { &[Signal::Occupancy] }

    async fn refresh(&mut self) -> Result<(), ReadError> {
        self.movement = self.latch.take();
        if self.movement {
            self.telemetry.increment_counter(
                &metric_name(&self.name, "movement_count"),
                "Number of movement events recorded by the PIR sensor",
                1.0,
            );
        }
        Ok(())
    }

    fn summarize(&self) -> String {
        format!("{}: {}", self.name, self.movement)
    }

    fn value(&self, signal: Signal) -> Option<SignalValue> {
        match signal {
            Signal::Occupancy => Some(SignalValue::Flag(self.movement)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::MetricKind;
    use crate::error::TransportError;
    use crate::sensors::transport::scripted::scripted;

    #[tokio::test]
    async fn test_movement_reported_once() {
        let latch = Arc::new(MotionLatch::new());
        let telemetry = Arc::new(TelemetryBus::default());
        let mut rx = telemetry.subscribe();
        let mut pir = MotionSensor::with_latch("hall", latch.clone(), telemetry);

        for sample in [false, false, true, true, true, false] {
            latch.record(sample);
        }

        pir.refresh().await.unwrap();
        assert!(pir.movement());
        assert_eq!(pir.summarize(), "hall: true");

        let counter = rx.recv().await.unwrap();
        assert_eq!(counter.name, "hall_movement_count");
        assert_eq!(counter.kind, MetricKind::Counter);

        pir.refresh().await.unwrap();
        assert_eq!(pir.value(Signal::Occupancy), Some(SignalValue::Flag(false)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sampler_latches_and_stops() {
        let (transport, _) = scripted(vec![Ok(true), Ok(true), Ok(true)]);
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let mut pir = MotionSensor::spawn("hall", transport, Arc::new(TelemetryBus::default()), shutdown_rx);

        tokio::time::sleep(Duration::from_millis(800)).await;
        pir.refresh().await.unwrap();
        assert!(pir.movement());

        shutdown_tx.send(()).unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_sampler_backs_off_after_error() {
        let (transport, script) = scripted(vec![Err(TransportError::Io("nack".to_string()))]);
        let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let mut pir = MotionSensor::spawn("hall", transport, Arc::new(TelemetryBus::default()), shutdown_rx);

        tokio::time::sleep(Duration::from_millis(10)).await;
        for _ in 0..3 {
            script.push(true);
        }

        // Still inside the back-off window
        tokio::time::sleep(Duration::from_secs(4)).await;
        pir.refresh().await.unwrap();
        assert!(!pir.movement());

        tokio::time::sleep(Duration::from_secs(2)).await;
        pir.refresh().await.unwrap();
        assert!(pir.movement());
    }
}
