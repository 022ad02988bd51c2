// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/roomsense

//! Telemetry bus - fire-and-forget metric side channel
//!
//! Sensors push gauges and counters here after each refresh. Nothing in the
//! engine waits on delivery; with no subscriber the samples are dropped.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Metric kinds understood by the exporter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetricKind {
    Gauge,
    Counter,
}

/// One metric sample
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricSample {
    pub id: u64,
    pub name: String,
    pub kind: MetricKind,
    pub help: String,
    pub value: f64,
    pub timestamp: DateTime<Utc>,
}

/// Broadcast channel carrying metric samples
pub struct TelemetryBus {
    metric_tx: broadcast::Sender<MetricSample>,
    sample_counter: AtomicU64,
}

impl TelemetryBus {
    pub fn new(capacity: usize) -> Self {
        let (metric_tx, _) = broadcast::channel(capacity);

        Self {
            metric_tx,
            sample_counter: AtomicU64::new(0),
        }
    }

    /// Set a gauge to `value`
    pub fn publish_gauge(&self, name: &str, help: &str, value: f64) {
        self.publish(name, help, MetricKind::Gauge, value);
    }

    /// Add `by` to a counter
    pub fn increment_counter(&self, name: &str, help: &str, by: f64) {
        self.publish(name, help, MetricKind::Counter, by);
    }

    fn publish(&self, name: &str, help: &str, kind: MetricKind, value: f64) {
        let id = self.sample_counter.fetch_add(1, Ordering::Relaxed);
        let sample = MetricSample {
            id,
            name: name.to_string(),
            kind,
            help: help.to_string(),
            value,
            timestamp: Utc::now(),
        };
        let _ = self.metric_tx.send(sample);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MetricSample> {
        self.metric_tx.subscribe()
    }

    /// Number of samples published since start
    pub fn published(&self) -> u64 {
        self.sample_counter.load(Ordering::Relaxed)
    }
}

impl Default for TelemetryBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_without_subscribers() {
        let bus = TelemetryBus::new(8);
        bus.publish_gauge("office_temperature", "Temperature", 21.0);
        assert_eq!(bus.published(), 1);
    }

    #[tokio::test]
    async fn test_subscriber_receives_samples() {
        let bus = TelemetryBus::new(8);
        let mut rx = bus.subscribe();

        bus.publish_gauge("office_temperature", "Temperature", 21.0);
        bus.increment_counter("hall_movement_count", "Movement events", 1.0);

        let first = rx.recv().await.unwrap();
        assert_eq!(first.name, "office_temperature");
        assert_eq!(first.kind, MetricKind::Gauge);

        let second = rx.recv().await.unwrap();
        assert_eq!(second.kind, MetricKind::Counter);
        assert_eq!(second.value, 1.0);
    }
}
