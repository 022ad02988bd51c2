// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/roomsense

//! Optical sensors - ambient light and time-of-flight range

use std::sync::Arc;

use async_trait::async_trait;

use super::filters::occupied;
use super::traits::metric_name;
use super::transport::Transport;
use super::{ReadError, Sensor, SensorKind, Signal, SignalValue};
use crate::core::TelemetryBus;

/// VEML6030 ambient light sensor
pub struct AmbientLightSensor {
    name: String,
    transport: Transport<f64>,
    telemetry: Arc<TelemetryBus>,
    lux: Option<f64>,
}

impl AmbientLightSensor {
    pub fn new(name: &str, transport: Transport<f64>, telemetry: Arc<TelemetryBus>) -> Self {
        Self {
            name: name.to_string(),
            transport,
            telemetry,
            lux: None,
        }
    }
}

#[async_trait]
impl Sensor for AmbientLightSensor {
    fn name(&self) -> &str { &self.name }
    fn kind(&self) -> SensorKind { SensorKind::Veml6030 }
    fn signals(&self) -> &'static [Signal] { &[Signal::LightLevel] }

    async fn refresh(&mut self) -> Result<(), ReadError> {
        let lux = self.transport.read().map_err(|e| ReadError::new(&self.name, e))?;
        self.lux = Some(lux);
        self.telemetry.publish_gauge(
            &metric_name(&self.name, "light_level"),
            "Light level from a VEML6030 sensor",
            lux,
        );
        Ok(())
    }

    fn summarize(&self) -> String {
        match self.lux {
            Some(l) => format!("{}: {:.2} lux", self.name, l),
            None => format!("{}: no reading", self.name),
        }
    }

    fn value(&self, signal: Signal) -> Option<SignalValue> {
        match signal {
            Signal::LightLevel => self.lux.map(SignalValue::Number),
            _ => None,
        }
    }
}

/// VL53L1X range sensor, answering occupancy with a hard distance threshold
pub struct RangeSensor {
    name: String,
    transport: Transport<u16>,
    telemetry: Arc<TelemetryBus>,
    distance_mm: Option<u16>,
}

impl RangeSensor {
    pub fn new(name: &str, transport: Transport<u16>, telemetry: Arc<TelemetryBus>) -> Self {
        Self {
            name: name.to_string(),
            transport,
            telemetry,
            distance_mm: None,
        }
    }

    pub fn distance_mm(&self) -> Option<u16> {
        self.distance_mm
    }
}

#[async_trait]
impl Sensor for RangeSensor {
    fn name(&self) -> &str { &self.name }
    fn kind(&self) -> SensorKind { SensorKind::Vl53l1x }
    fn signals(&self) -> &'static [Signal] { &[Signal::Occupancy] }

    async fn refresh(&mut self) -> Result<(), ReadError> {
        let distance = self.transport.read().map_err(|e| ReadError::new(&self.name, e))?;
        self.distance_mm = Some(distance);
        self.telemetry.publish_gauge(
            &metric_name(&self.name, "distance"),
            "The current distance from a VL53L1X sensor",
            distance as f64,
        );
        Ok(())
    }

    fn summarize(&self) -> String {
        match self.distance_mm {
            Some(d) => format!("{}: {} mm", self.name, d),
            None => format!("{}: no reading", self.name),
        }
    }

    fn value(&self, signal: Signal) -> Option<SignalValue> {
        match signal {
            Signal::Occupancy => self.distance_mm.map(|d| SignalValue::Flag(occupied(d))),
            _ => None,
        }
    }
}
