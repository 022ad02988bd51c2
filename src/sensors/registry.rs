// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/roomsense

//! Sensor registry - ordered collection and signal resolution

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{DialReading, PressKind, Sensor, SensorHealth, Signal, SignalValue};

/// Separator used by [`SensorRegistry::describe_all`]
pub const SUMMARY_DELIMITER: &str = " | ";

/// Wind as reported by whichever sensor answers wind speed
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Wind {
    pub speed: f64,
    pub gust: f64,
    pub direction: f64,
}

/// Owns every active sensor in registration order.
///
/// Resolution is first-match: the earliest registered sensor declaring a
/// signal answers it, even when it currently has no reading.
pub struct SensorRegistry {
    sensors: Vec<Box<dyn Sensor>>,
    health: Vec<SensorHealth>,
}

impl SensorRegistry {
    pub fn new() -> Self {
        Self {
            sensors: Vec::new(),
            health: Vec::new(),
        }
    }

    /// Append a sensor. Order matters for resolution.
    pub fn register(&mut self, sensor: Box<dyn Sensor>) {
        info!(
            "Registered sensor: {} ({}) answering {:?}",
            sensor.name(),
            sensor.kind(),
            sensor.signals()
        );
        self.health.push(SensorHealth::new(sensor.name(), sensor.kind()));
        self.sensors.push(sensor);
    }

    /// Refresh every sensor once, in order. A failing sensor never stops the rest.
    ///
    /// Returns the number of sensors that failed this cycle.
    pub async fn refresh_all(&mut self) -> usize {
        let mut failures = 0;

        for (sensor, health) in self.sensors.iter_mut().zip(self.health.iter_mut()) {
            health.refresh_count += 1;
            match sensor.refresh().await {
                Ok(()) => {
                    health.last_success = Some(Utc::now());
                }
                Err(e) => {
                    warn!("{}", e);
                    health.error_count += 1;
                    health.last_error = Some(e.to_string());
                    failures += 1;
                }
            }
        }

        debug!("Refreshed {} sensors, {} failed", self.sensors.len(), failures);
        failures
    }

    /// The sensor that answers `signal`, if any declares it
    fn answering(&self, signal: Signal) -> Option<&dyn Sensor> {
        self.sensors
            .iter()
            .find(|s| s.answers(signal))
            .map(|s| s.as_ref())
    }

    /// Value of `signal` from the first sensor declaring it
    pub fn resolve(&self, signal: Signal) -> Option<SignalValue> {
        self.answering(signal)?.value(signal)
    }

    /// Name of the sensor `signal` resolves to
    pub fn source_of(&self, signal: Signal) -> Option<&str> {
        self.answering(signal).map(|s| s.name())
    }

    pub fn temperature(&self) -> Option<f64> {
        self.resolve(Signal::Temperature)?.as_number()
    }

    pub fn humidity(&self) -> Option<f64> {
        self.resolve(Signal::Humidity)?.as_number()
    }

    pub fn pressure(&self) -> Option<f64> {
        self.resolve(Signal::Pressure)?.as_number()
    }

    pub fn light_level(&self) -> Option<f64> {
        self.resolve(Signal::LightLevel)?.as_number()
    }

    pub fn occupancy(&self) -> Option<bool> {
        self.resolve(Signal::Occupancy)?.as_flag()
    }

    pub fn touch_zones(&self) -> Option<[bool; 3]> {
        self.resolve(Signal::TouchZones)?.as_zones()
    }

    pub fn switch_press(&self) -> Option<PressKind> {
        self.resolve(Signal::SwitchPress)?.as_press()
    }

    pub fn dial(&self) -> Option<DialReading> {
        self.resolve(Signal::Dial)?.as_dial()
    }

    pub fn wind(&self) -> Option<Wind> {
        Some(Wind {
            speed: self.resolve(Signal::WindSpeed)?.as_number()?,
            gust: self.resolve(Signal::WindGust)?.as_number()?,
            direction: self.resolve(Signal::WindDirection)?.as_number()?,
        })
    }

    /// Every sensor's summary in registration order, for diagnostics
    pub fn describe_all(&self) -> String {
        self.sensors
            .iter()
            .map(|s| s.summarize())
            .collect::<Vec<_>>()
            .join(SUMMARY_DELIMITER)
    }

    pub fn health(&self) -> &[SensorHealth] {
        &self.health
    }

    pub fn names(&self) -> Vec<&str> {
        self.sensors.iter().map(|s| s.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.sensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty()
    }
}

impl Default for SensorRegistry {
    fn default() -> Self {
        Self::new()
    }
}
