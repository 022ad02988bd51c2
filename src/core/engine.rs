// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/roomsense

//! Poll loop - refresh, resolve, fan out, sleep

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::Utc;
use futures::future::join_all;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};

use super::{SystemState, TelemetryBus};
use crate::config::Config;
use crate::scanners::{PriceTable, ScannerHub};
use crate::sensors::SensorRegistry;
use crate::streaming::{SignalConsumer, SignalSnapshot, DISK_PRICE_METRIC_PREFIX};

/// Main roomsense engine
pub struct Engine {
    pub config: Arc<Config>,
    registry: SensorRegistry,
    consumers: Vec<Arc<dyn SignalConsumer>>,
    hub: Arc<ScannerHub>,
    telemetry: Arc<TelemetryBus>,
    state: Arc<RwLock<SystemState>>,
    start_time: Option<Instant>,
    cycles: u64,
}

impl Engine {
    pub fn new(
        config: Config,
        registry: SensorRegistry,
        hub: Arc<ScannerHub>,
        telemetry: Arc<TelemetryBus>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            registry,
            consumers: Vec::new(),
            hub,
            telemetry,
            state: Arc::new(RwLock::new(SystemState::default())),
            start_time: None,
            cycles: 0,
        }
    }

    pub fn add_consumer(&mut self, consumer: Arc<dyn SignalConsumer>) {
        info!("Consumer attached: {}", consumer.name());
        self.consumers.push(consumer);
    }

    /// Cycle until `shutdown` fires, sleeping the sample interval between cycles
    pub async fn run(&mut self, mut shutdown: broadcast::Receiver<()>) -> Result<()> {
        info!(
            "Starting roomsense engine with {} sensors, {} consumers",
            self.registry.len(),
            self.consumers.len()
        );
        self.start_time = Some(Instant::now());
        {
            let mut state = self.state.write().await;
            state.running = true;
            state.sensors_active = self.registry.len();
        }

        let interval = self.config.sample_interval();
        loop {
            self.cycle().await;

            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = shutdown.recv() => {
                    info!("Engine received shutdown");
                    break;
                }
            }
        }

        self.state.write().await.running = false;
        info!("roomsense engine stopped after {} cycles", self.cycles);
        Ok(())
    }

    /// One poll cycle. Sensor and consumer failures are logged, never returned.
    pub async fn cycle(&mut self) -> SignalSnapshot {
        self.cycles += 1;
        let failed = self.registry.refresh_all().await;

        let prices = self.hub.latest_prices().map(|table| (*table).clone());
        if let Some(table) = &prices {
            publish_disk_prices(&self.telemetry, table);
        }

        let snapshot = SignalSnapshot::capture(&self.registry, self.cycles, prices);

        let results = join_all(self.consumers.iter().map(|c| c.publish(&snapshot))).await;
        for (consumer, result) in self.consumers.iter().zip(results) {
            if let Err(e) = result {
                warn!("Consumer {} failed: {:#}", consumer.name(), e);
            }
        }

        if self.config.debug_output {
            info!("{}", self.registry.describe_all());
        }

        {
            let mut state = self.state.write().await;
            state.cycles = self.cycles;
            state.failed_refreshes += failed as u64;
            state.last_cycle = Some(Utc::now());
            state.uptime_seconds = self.uptime();
        }

        debug!("Cycle {} complete, {} sensor failures", self.cycles, failed);
        snapshot
    }

    pub async fn state(&self) -> SystemState {
        self.state.read().await.clone()
    }

    pub fn registry(&self) -> &SensorRegistry {
        &self.registry
    }

    pub fn uptime(&self) -> u64 {
        self.start_time.map(|t| t.elapsed().as_secs()).unwrap_or(0)
    }

    pub fn sample_interval(&self) -> Duration {
        self.config.sample_interval()
    }
}

/// One gauge per priced tier; tiers without a listing are not exported
fn publish_disk_prices(telemetry: &TelemetryBus, table: &PriceTable) {
    for (tier, price) in table.priced() {
        telemetry.publish_gauge(
            &format!("{}{}", DISK_PRICE_METRIC_PREFIX, tier.metric_suffix()),
            &format!("Cheapest price per TB for {}", tier),
            price,
        );
    }
}
