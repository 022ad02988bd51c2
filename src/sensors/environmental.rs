// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/roomsense

//! Environmental sensors - temperature, humidity, pressure, air quality

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::filters::plausible_temperature;
use super::traits::metric_name;
use super::transport::{AirQualitySample, ClimateSample, HumidityTemp, PressureTemp, Transport};
use super::{ReadError, Sensor, SensorKind, Signal, SignalValue};
use crate::core::TelemetryBus;

/// TMP117 precision temperature sensor
pub struct TemperatureSensor {
    name: String,
    transport: Transport<f64>,
    telemetry: Arc<TelemetryBus>,
    temperature: Option<f64>,
}

impl TemperatureSensor {
    pub fn new(name: &str, transport: Transport<f64>, telemetry: Arc<TelemetryBus>) -> Self {
        Self {
            name: name.to_string(),
            transport,
            telemetry,
            temperature: None,
        }
    }

    pub fn temperature(&self) -> Option<f64> {
        self.temperature
    }
}

#[async_trait]
impl Sensor for TemperatureSensor {
    fn name(&self) -> &str { &self.name }
    fn kind(&self) -> SensorKind { SensorKind::Tmp117 }
    fn signals(&self) -> &'static [Signal] { &[Signal::Temperature] }

    async fn refresh(&mut self) -> Result<(), ReadError> {
        let celsius = self.transport.read().map_err(|e| ReadError::new(&self.name, e))?;

        if plausible_temperature(celsius) {
            self.temperature = Some(celsius);
            self.telemetry.publish_gauge(
                &metric_name(&self.name, "temperature"),
                "Temperature from a TMP117 sensor",
                celsius,
            );
        } else {
            warn!("Discarding implausible temperature {:.2} C from {}", celsius, self.name);
        }
        Ok(())
    }

    fn summarize(&self) -> String {
        match self.temperature {
            Some(t) => format!("{}: {:.2} C", self.name, t),
            None => format!("{}: no reading", self.name),
        }
    }

    fn value(&self, signal: Signal) -> Option<SignalValue> {
        match signal {
            Signal::Temperature => self.temperature.map(SignalValue::Number),
            _ => None,
        }
    }
}

/// AHT10 humidity and temperature sensor
pub struct HumiditySensor {
    name: String,
    transport: Transport<HumidityTemp>,
    telemetry: Arc<TelemetryBus>,
    reading: Option<HumidityTemp>,
}

impl HumiditySensor {
    pub fn new(name: &str, transport: Transport<HumidityTemp>, telemetry: Arc<TelemetryBus>) -> Self {
        Self {
            name: name.to_string(),
            transport,
            telemetry,
            reading: None,
        }
    }
}

#[async_trait]
impl Sensor for HumiditySensor {
    fn name(&self) -> &str { &self.name }
    fn kind(&self) -> SensorKind { SensorKind::Aht10 }
    fn signals(&self) -> &'static [Signal] { &[Signal::Temperature, Signal::Humidity] }

    async fn refresh(&mut self) -> Result<(), ReadError> {
        let sample = self.transport.read().map_err(|e| ReadError::new(&self.name, e))?;

        if plausible_temperature(sample.temperature) {
            self.reading = Some(sample);
            self.telemetry.publish_gauge(
                &metric_name(&self.name, "temperature"),
                "Temperature from a AHT10 sensor",
                sample.temperature,
            );
            self.telemetry.publish_gauge(
                &metric_name(&self.name, "humidity"),
                "Humidity from a AHT10 sensor",
                sample.humidity,
            );
        } else {
            warn!("Discarding implausible reading {:.2} C from {}", sample.temperature, self.name);
        }
        Ok(())
    }

    fn summarize(&self) -> String {
        match self.reading {
            Some(r) => format!("{}: {:.2} C, {:.2} rH", self.name, r.temperature, r.humidity),
            None => format!("{}: no reading", self.name),
        }
    }

    fn value(&self, signal: Signal) -> Option<SignalValue> {
        let r = self.reading?;
        match signal {
            Signal::Temperature => Some(SignalValue::Number(r.temperature)),
            Signal::Humidity => Some(SignalValue::Number(r.humidity)),
            _ => None,
        }
    }
}

/// BME280 temperature, pressure and humidity sensor
///
/// Calibration offsets, when configured, are applied by the transport wrapper
/// the factory puts around the device, never here.
pub struct ClimateSensor {
    name: String,
    transport: Transport<ClimateSample>,
    telemetry: Arc<TelemetryBus>,
    reading: Option<ClimateSample>,
}

impl ClimateSensor {
    pub fn new(name: &str, transport: Transport<ClimateSample>, telemetry: Arc<TelemetryBus>) -> Self {
        Self {
            name: name.to_string(),
            transport,
            telemetry,
            reading: None,
        }
    }
}

#[async_trait]
impl Sensor for ClimateSensor {
    fn name(&self) -> &str { &self.name }
    fn kind(&self) -> SensorKind { SensorKind::Bme280 }
    fn signals(&self) -> &'static [Signal] {
        &[Signal::Temperature, Signal::Pressure, Signal::Humidity]
    }

    async fn refresh(&mut self) -> Result<(), ReadError> {
        let sample = self.transport.read().map_err(|e| ReadError::new(&self.name, e))?;

        // the whole triplet is dropped when the temperature is implausible
        if !plausible_temperature(sample.temperature) {
            warn!("Discarding implausible reading {:.2} C from {}", sample.temperature, self.name);
            return Ok(());
        }

        self.reading = Some(sample);
        self.telemetry.publish_gauge(
            &metric_name(&self.name, "temperature"),
            "Temperature from a BME280 sensor",
            sample.temperature,
        );
        self.telemetry.publish_gauge(
            &metric_name(&self.name, "pressure"),
            "The current pressure from the BME280",
            sample.pressure,
        );
        self.telemetry.publish_gauge(
            &metric_name(&self.name, "humidity"),
            "The current humidity from the BME280",
            sample.humidity,
        );
        Ok(())
    }

    fn summarize(&self) -> String {
        match self.reading {
            Some(r) => format!(
                "{}: {:.2} C, {:.2} hPa, {:.2} rH",
                self.name, r.temperature, r.pressure, r.humidity
            ),
            None => format!("{}: no reading", self.name),
        }
    }

    fn value(&self, signal: Signal) -> Option<SignalValue> {
        let r = self.reading?;
        match signal {
            Signal::Temperature => Some(SignalValue::Number(r.temperature)),
            Signal::Pressure => Some(SignalValue::Number(r.pressure)),
            Signal::Humidity => Some(SignalValue::Number(r.humidity)),
            _ => None,
        }
    }
}

/// MS5637 barometric pressure sensor.
///
/// The die temperature is logged and exported but never answers the
/// temperature signal.
pub struct BarometerSensor {
    name: String,
    transport: Transport<PressureTemp>,
    telemetry: Arc<TelemetryBus>,
    reading: Option<PressureTemp>,
}

impl BarometerSensor {
    pub fn new(name: &str, transport: Transport<PressureTemp>, telemetry: Arc<TelemetryBus>) -> Self {
        Self {
            name: name.to_string(),
            transport,
            telemetry,
            reading: None,
        }
    }
}

#[async_trait]
impl Sensor for BarometerSensor {
    fn name(&self) -> &str { &self.name }
    fn kind(&self) -> SensorKind { SensorKind::Ms5637 }
    fn signals(&self) -> &'static [Signal] { &[Signal::Pressure] }

    async fn refresh(&mut self) -> Result<(), ReadError> {
        let sample = self.transport.read().map_err(|e| ReadError::new(&self.name, e))?;

        if !plausible_temperature(sample.temperature) {
            warn!("Discarding implausible reading {:.2} C from {}", sample.temperature, self.name);
            return Ok(());
        }

        self.reading = Some(sample);
        self.telemetry.publish_gauge(
            &metric_name(&self.name, "pressure"),
            "Pressure from a MS5637 sensor",
            sample.pressure,
        );
        self.telemetry.publish_gauge(
            &metric_name(&self.name, "temperature"),
            "Temperature from a MS5637 sensor",
            sample.temperature,
        );
        Ok(())
    }

    fn summarize(&self) -> String {
        match self.reading {
            Some(r) => format!("{}: {:.2} hPa, {:.2} C", self.name, r.pressure, r.temperature),
            None => format!("{}: no reading", self.name),
        }
    }

    fn value(&self, signal: Signal) -> Option<SignalValue> {
        let r = self.reading?;
        match signal {
            Signal::Pressure => Some(SignalValue::Number(r.pressure)),
            _ => None,
        }
    }
}

/// ENS160 air quality state, each field updated independently
#[derive(Debug, Clone, Default)]
struct AirQuality {
    operation: Option<String>,
    aqi: Option<(u8, String)>,
    tvoc: Option<u16>,
    eco2: Option<(u16, String)>,
}

/// ENS160 air quality sensor
pub struct AirQualitySensor {
    name: String,
    transport: Transport<AirQualitySample>,
    telemetry: Arc<TelemetryBus>,
    state: AirQuality,
}

impl AirQualitySensor {
    pub fn new(name: &str, transport: Transport<AirQualitySample>, telemetry: Arc<TelemetryBus>) -> Self {
        Self {
            name: name.to_string(),
            transport,
            telemetry,
            state: AirQuality::default(),
        }
    }
}

#[async_trait]
impl Sensor for AirQualitySensor {
    fn name(&self) -> &str { &self.name }
    fn kind(&self) -> SensorKind { SensorKind::Ens160 }
    fn signals(&self) -> &'static [Signal] {
        &[Signal::AirQualityIndex, Signal::Tvoc, Signal::Eco2]
    }

    async fn refresh(&mut self) -> Result<(), ReadError> {
        let sample = self.transport.read().map_err(|e| ReadError::new(&self.name, e))?;
        let mut first_error = None;

        match sample.operation {
            Ok(op) => self.state.operation = Some(op),
            Err(e) => {
                debug!("ENS160 {} operation read failed: {}", self.name, e);
                first_error.get_or_insert(e);
            }
        }
        match sample.aqi {
            Ok(aqi) => self.state.aqi = Some(aqi),
            Err(e) => {
                debug!("ENS160 {} AQI read failed: {}", self.name, e);
                first_error.get_or_insert(e);
            }
        }
        match sample.tvoc {
            Ok(tvoc) => self.state.tvoc = Some(tvoc),
            Err(e) => {
                debug!("ENS160 {} TVOC read failed: {}", self.name, e);
                first_error.get_or_insert(e);
            }
        }
        match sample.eco2 {
            Ok(eco2) => self.state.eco2 = Some(eco2),
            Err(e) => {
                debug!("ENS160 {} eCO2 read failed: {}", self.name, e);
                first_error.get_or_insert(e);
            }
        }

        if let Some((aqi, _)) = &self.state.aqi {
            self.telemetry.publish_gauge(
                &metric_name(&self.name, "aqi"),
                "Air quality index from a ENS160 sensor",
                *aqi as f64,
            );
        }
        if let Some(tvoc) = self.state.tvoc {
            self.telemetry.publish_gauge(
                &metric_name(&self.name, "tvoc"),
                "Total volatile organic compounds from a ENS160 sensor",
                tvoc as f64,
            );
        }
        if let Some((eco2, _)) = &self.state.eco2 {
            self.telemetry.publish_gauge(
                &metric_name(&self.name, "eco2"),
                "CO2-equivalents from a ENS160 sensor",
                *eco2 as f64,
            );
        }

        match first_error {
            Some(e) => Err(ReadError::new(&self.name, e)),
            None => Ok(()),
        }
    }

    fn summarize(&self) -> String {
        let s = &self.state;
        let (aqi, aqi_rating) = s.aqi.clone().unwrap_or((0, "n/a".to_string()));
        let (eco2, eco2_rating) = s.eco2.clone().unwrap_or((0, "n/a".to_string()));
        format!(
            "{}: [{}], {} ({}) AQI, {} TVOC, {} ppm ({}) eCO2",
            self.name,
            s.operation.as_deref().unwrap_or("n/a"),
            aqi,
            aqi_rating,
            s.tvoc.unwrap_or(0),
            eco2,
            eco2_rating
        )
    }

    fn value(&self, signal: Signal) -> Option<SignalValue> {
        match signal {
            Signal::AirQualityIndex => self.state.aqi.as_ref().map(|(v, _)| SignalValue::Number(*v as f64)),
            Signal::Tvoc => self.state.tvoc.map(|v| SignalValue::Number(v as f64)),
            Signal::Eco2 => self.state.eco2.as_ref().map(|(v, _)| SignalValue::Number(*v as f64)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::sensors::transport::scripted::scripted;

    fn bus() -> Arc<TelemetryBus> {
        Arc::new(TelemetryBus::new(16))
    }

    #[tokio::test]
    async fn test_temperature_rejects_implausible() {
        let (transport, _) = scripted(vec![Ok(21.5), Ok(150.0), Ok(-100.0)]);
        let mut sensor = TemperatureSensor::new("office", transport, bus());

        sensor.refresh().await.unwrap();
        sensor.refresh().await.unwrap();
        sensor.refresh().await.unwrap();

        assert_eq!(sensor.temperature(), Some(21.5));
        assert_eq!(sensor.summarize(), "office: 21.50 C");
    }

    #[tokio::test]
    async fn test_failed_read_keeps_previous_value() {
        let (transport, _) = scripted(vec![
            Ok(HumidityTemp { temperature: 20.0, humidity: 45.0 }),
            Err(TransportError::Io("nack".to_string())),
        ]);
        let mut sensor = HumiditySensor::new("bedroom", transport, bus());

        sensor.refresh().await.unwrap();
        let err = sensor.refresh().await.unwrap_err();

        assert_eq!(err.source_name, "bedroom");
        assert_eq!(sensor.value(Signal::Humidity), Some(SignalValue::Number(45.0)));
    }

    #[tokio::test]
    async fn test_climate_drops_whole_triplet() {
        let (transport, _) = scripted(vec![
            Ok(ClimateSample { temperature: 22.0, pressure: 1012.0, humidity: 50.0 }),
            Ok(ClimateSample { temperature: 180.0, pressure: 0.0, humidity: 0.0 }),
        ]);
        let mut sensor = ClimateSensor::new("lounge", transport, bus());

        sensor.refresh().await.unwrap();
        sensor.refresh().await.unwrap();

        assert_eq!(sensor.value(Signal::Pressure), Some(SignalValue::Number(1012.0)));
        assert_eq!(sensor.summarize(), "lounge: 22.00 C, 1012.00 hPa, 50.00 rH");
    }

    #[tokio::test]
    async fn test_unread_sensor_has_no_value() {
        let (transport, _) = scripted::<PressureTemp>(vec![]);
        let mut sensor = BarometerSensor::new("hall", transport, bus());

        assert!(sensor.refresh().await.is_err());
        assert_eq!(sensor.value(Signal::Pressure), None);
        assert_eq!(sensor.summarize(), "hall: no reading");
    }

    #[tokio::test]
    async fn test_air_quality_partial_failure() {
        let (transport, _) = scripted(vec![Ok(AirQualitySample {
            operation: Ok("operating ok".to_string()),
            aqi: Ok((2, "good".to_string())),
            tvoc: Err(TransportError::Io("timeout".to_string())),
            eco2: Ok((600, "excellent".to_string())),
        })]);
        let mut sensor = AirQualitySensor::new("study", transport, bus());

        assert!(sensor.refresh().await.is_err());
        assert_eq!(sensor.value(Signal::AirQualityIndex), Some(SignalValue::Number(2.0)));
        assert_eq!(sensor.value(Signal::Tvoc), None);
        assert_eq!(
            sensor.summarize(),
            "study: [operating ok], 2 (good) AQI, 0 TVOC, 600 ppm (excellent) eCO2"
        );
    }
}
