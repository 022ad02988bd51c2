// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/roomsense

//! Weather feed exposed as a sensor

use std::sync::Arc;

use async_trait::async_trait;

use super::traits::metric_name;
use super::{ReadError, Sensor, SensorKind, Signal, SignalValue};
use crate::core::TelemetryBus;
use crate::error::TransportError;
use crate::scanners::{Scanner, WeatherJob, WeatherObservation};

/// Reads whatever the shared weather scanner last parsed.
///
/// `refresh` is a copy out of the scanner's cell and never touches the
/// network.
pub struct WeatherSensor {
    name: String,
    scanner: Arc<Scanner<WeatherJob>>,
    telemetry: Arc<TelemetryBus>,
    observation: Option<WeatherObservation>,
}

impl WeatherSensor {
    pub fn new(name: &str, scanner: Arc<Scanner<WeatherJob>>, telemetry: Arc<TelemetryBus>) -> Self {
        Self {
            name: name.to_string(),
            scanner,
            telemetry,
            observation: None,
        }
    }

    pub fn observation(&self) -> Option<&WeatherObservation> {
        self.observation.as_ref()
    }
}

#[async_trait]
impl Sensor for WeatherSensor {
    fn name(&self) -> &str { &self.name }
    fn kind(&self) -> SensorKind { SensorKind::Bom }

    fn signals(&self) -> &'static [Signal] {
        &[Signal::Temperature, Signal::WindSpeed, Signal::WindGust, Signal::WindDirection]
    }

    async fn refresh(&mut self) -> Result<(), ReadError> {
        let latest = self.scanner.latest().ok_or_else(|| {
            ReadError::new(
                &self.name,
                TransportError::Io(format!("{} scanner has no result yet", self.scanner.name())),
            )
        })?;

        let obs = latest.as_ref().clone();
        let bus = &self.telemetry;
        bus.publish_gauge(&metric_name(&self.name, "temperature"), "The current temperature from the BOM", obs.air_temp);
        bus.publish_gauge(&metric_name(&self.name, "wind_speed"), "The current wind speed from the BOM", obs.wind_speed);
        bus.publish_gauge(&metric_name(&self.name, "wind_gust"), "The current wind gust speed from the BOM", obs.wind_gust);
        bus.publish_gauge(&metric_name(&self.name, "wind_dir"), "The current wind direction from the BOM", obs.wind_direction);

        self.observation = Some(obs);
        Ok(())
    }

    fn summarize(&self) -> String {
        match &self.observation {
            Some(o) => format!(
                "{}: {:.2} C, {:.0}-{:.0} kph from {:.1}",
                self.name, o.air_temp, o.wind_speed, o.wind_gust, o.wind_direction
            ),
            None => format!("{}: no reading", self.name),
        }
    }

    fn value(&self, signal: Signal) -> Option<SignalValue> {
        let o = self.observation.as_ref()?;
        match signal {
            Signal::Temperature => Some(SignalValue::Number(o.air_temp)),
            Signal::WindSpeed => Some(SignalValue::Number(o.wind_speed)),
            Signal::WindGust => Some(SignalValue::Number(o.wind_gust)),
            Signal::WindDirection => Some(SignalValue::Number(o.wind_direction)),
            _ => None,
        }
    }
}
