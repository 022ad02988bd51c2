// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/roomsense

//! Streaming module - poll-loop consumers (display, MQTT bridge, metrics)

mod display;
mod metrics;
mod mqtt;

pub use display::{render_display, DisplayConsumer, DisplayFrame};
pub use metrics::{MetricsExporter, DISK_PRICE_METRIC_PREFIX};
pub use mqtt::{MqttBridge, MqttClient};

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::scanners::PriceTable;
use crate::sensors::{DialReading, PressKind, SensorRegistry, Signal, SignalValue, Wind};

/// Streaming configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamingConfig {
    /// Enable the MQTT bridge
    pub mqtt_enabled: bool,
    pub mqtt_broker: String,
    pub mqtt_port: u16,
    pub mqtt_client_id: String,
    pub mqtt_username: Option<String>,
    pub mqtt_password: Option<String>,
    pub mqtt_topic_prefix: String,

    /// Render the local display text each cycle
    pub display_enabled: bool,

    /// Serve `/metrics` for scraping
    pub metrics_enabled: bool,
    pub metrics_port: u16,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            mqtt_enabled: false,
            mqtt_broker: "localhost".to_string(),
            mqtt_port: 1883,
            mqtt_client_id: "roomsense".to_string(),
            mqtt_username: None,
            mqtt_password: None,
            mqtt_topic_prefix: "roomsense".to_string(),

            display_enabled: true,

            metrics_enabled: true,
            metrics_port: 2112,
        }
    }
}

/// Every resolved signal for one poll cycle
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalSnapshot {
    pub cycle: u64,
    pub timestamp: DateTime<Utc>,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub pressure: Option<f64>,
    pub light_level: Option<f64>,
    pub occupancy: Option<bool>,
    pub touch_zones: Option<[bool; 3]>,
    pub switch_press: Option<PressKind>,
    pub dial: Option<DialReading>,
    pub wind: Option<Wind>,
    pub air_quality_index: Option<f64>,
    pub tvoc: Option<f64>,
    pub eco2: Option<f64>,
    pub disk_prices: Option<PriceTable>,
}

impl SignalSnapshot {
    /// Resolve every signal from `registry`
    pub fn capture(registry: &SensorRegistry, cycle: u64, disk_prices: Option<PriceTable>) -> Self {
        let number = |signal| registry.resolve(signal).and_then(|v: SignalValue| v.as_number());

        Self {
            cycle,
            timestamp: Utc::now(),
            temperature: registry.temperature(),
            humidity: registry.humidity(),
            pressure: registry.pressure(),
            light_level: registry.light_level(),
            occupancy: registry.occupancy(),
            touch_zones: registry.touch_zones(),
            switch_press: registry.switch_press(),
            dial: registry.dial(),
            wind: registry.wind(),
            air_quality_index: number(Signal::AirQualityIndex),
            tvoc: number(Signal::Tvoc),
            eco2: number(Signal::Eco2),
            disk_prices,
        }
    }

    pub fn get(&self, signal: Signal) -> Option<SignalValue> {
        match signal {
            Signal::Temperature => self.temperature.map(SignalValue::Number),
            Signal::Humidity => self.humidity.map(SignalValue::Number),
            Signal::Pressure => self.pressure.map(SignalValue::Number),
            Signal::LightLevel => self.light_level.map(SignalValue::Number),
            Signal::Occupancy => self.occupancy.map(SignalValue::Flag),
            Signal::TouchZones => self.touch_zones.map(SignalValue::Zones),
            Signal::SwitchPress => self.switch_press.map(SignalValue::Press),
            Signal::Dial => self.dial.map(SignalValue::Dial),
            Signal::WindSpeed => self.wind.map(|w| SignalValue::Number(w.speed)),
            Signal::WindGust => self.wind.map(|w| SignalValue::Number(w.gust)),
            Signal::WindDirection => self.wind.map(|w| SignalValue::Number(w.direction)),
            Signal::AirQualityIndex => self.air_quality_index.map(SignalValue::Number),
            Signal::Tvoc => self.tvoc.map(SignalValue::Number),
            Signal::Eco2 => self.eco2.map(SignalValue::Number),
        }
    }

    /// Signals with a value this cycle, in [`Signal::ALL`] order
    pub fn available(&self) -> Vec<(Signal, SignalValue)> {
        Signal::ALL
            .into_iter()
            .filter_map(|signal| self.get(signal).map(|v| (signal, v)))
            .collect()
    }
}

/// Receives the resolved signals once per poll cycle
#[async_trait]
pub trait SignalConsumer: Send + Sync {
    fn name(&self) -> &str;

    async fn publish(&self, snapshot: &SignalSnapshot) -> Result<()>;
}
