// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/roomsense

//! Sensor traits and common types

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigurationError, ReadError};

/// Logical signals a sensor can answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    Temperature,        // °C
    Humidity,           // % rH
    Pressure,           // hPa
    LightLevel,         // lux
    Occupancy,          // bool
    TouchZones,         // 3 independent pads
    SwitchPress,        // none / single / double
    Dial,               // potentiometer change event
    WindSpeed,          // km/h
    WindGust,           // km/h
    WindDirection,      // degrees
    #[serde(rename = "aqi")]
    AirQualityIndex,    // 1-5
    Tvoc,               // ppb
    Eco2,               // ppm
}

impl Signal {
    /// Every signal, in the order consumers report them
    pub const ALL: [Signal; 14] = [
        Signal::Temperature,
        Signal::Humidity,
        Signal::Pressure,
        Signal::LightLevel,
        Signal::Occupancy,
        Signal::TouchZones,
        Signal::SwitchPress,
        Signal::Dial,
        Signal::WindSpeed,
        Signal::WindGust,
        Signal::WindDirection,
        Signal::AirQualityIndex,
        Signal::Tvoc,
        Signal::Eco2,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Temperature => "temperature",
            Signal::Humidity => "humidity",
            Signal::Pressure => "pressure",
            Signal::LightLevel => "light_level",
            Signal::Occupancy => "occupancy",
            Signal::TouchZones => "touch_zones",
            Signal::SwitchPress => "switch_press",
            Signal::Dial => "dial",
            Signal::WindSpeed => "wind_speed",
            Signal::WindGust => "wind_gust",
            Signal::WindDirection => "wind_direction",
            Signal::AirQualityIndex => "aqi",
            Signal::Tvoc => "tvoc",
            Signal::Eco2 => "eco2",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classified momentary switch event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PressKind {
    #[default]
    None,
    Single,
    Double,
}

/// Outcome of one potentiometer refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DialReading {
    /// True only when the raw value moved past the tolerance
    pub changed: bool,
    /// Last accepted raw value
    pub value: u16,
    /// Movement relative to the previously accepted value, 0 when unchanged
    pub delta: i32,
}

/// The value a sensor reports for one signal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SignalValue {
    Number(f64),
    Flag(bool),
    Zones([bool; 3]),
    Press(PressKind),
    Dial(DialReading),
}

impl SignalValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            SignalValue::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            SignalValue::Flag(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_zones(&self) -> Option<[bool; 3]> {
        match self {
            SignalValue::Zones(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_press(&self) -> Option<PressKind> {
        match self {
            SignalValue::Press(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_dial(&self) -> Option<DialReading> {
        match self {
            SignalValue::Dial(v) => Some(*v),
            _ => None,
        }
    }
}

/// Sensor types that can be declared in the configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorKind {
    Tmp117,         // temperature
    Aht10,          // humidity + temperature
    Bme280,         // temperature + pressure + humidity
    Ms5637,         // pressure
    Veml6030,       // ambient light
    Vl53l1x,        // time-of-flight range
    Cap1203,        // 3-zone capacitive touch
    Switch,         // momentary push button
    Potentiometer,  // rotary dial
    Pir,            // passive infrared motion
    Ens160,         // air quality
    Bom,            // weather observation scanner
}

impl SensorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SensorKind::Tmp117 => "tmp117",
            SensorKind::Aht10 => "aht10",
            SensorKind::Bme280 => "bme280",
            SensorKind::Ms5637 => "ms5637",
            SensorKind::Veml6030 => "veml6030",
            SensorKind::Vl53l1x => "vl53l1x",
            SensorKind::Cap1203 => "cap1203",
            SensorKind::Switch => "switch",
            SensorKind::Potentiometer => "potentiometer",
            SensorKind::Pir => "pir",
            SensorKind::Ens160 => "ens160",
            SensorKind::Bom => "bom",
        }
    }

    /// Bus address used when a declaration leaves the address at 0
    pub fn default_address(&self) -> u8 {
        match self {
            SensorKind::Tmp117 => 0x48,
            SensorKind::Aht10 => 0x38,
            SensorKind::Bme280 => 0x77,
            SensorKind::Ms5637 => 0x76,
            SensorKind::Veml6030 => 0x10,
            SensorKind::Vl53l1x => 0x29,
            SensorKind::Cap1203 => 0x28,
            SensorKind::Switch => 0x42,
            SensorKind::Potentiometer => 0x35,
            SensorKind::Pir => 0x12,
            SensorKind::Ens160 => 0x53,
            SensorKind::Bom => 0x00,
        }
    }

    /// Whether the sensor sits on the device bus at all
    pub fn is_bus_device(&self) -> bool {
        !matches!(self, SensorKind::Bom)
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SensorKind {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s.trim().to_ascii_lowercase().as_str() {
            "tmp117" => SensorKind::Tmp117,
            "aht10" => SensorKind::Aht10,
            "bme280" => SensorKind::Bme280,
            "ms5637" => SensorKind::Ms5637,
            "veml6030" => SensorKind::Veml6030,
            "vl53l1x" => SensorKind::Vl53l1x,
            "cap1203" => SensorKind::Cap1203,
            "switch" => SensorKind::Switch,
            "potentiometer" => SensorKind::Potentiometer,
            "pir" => SensorKind::Pir,
            "ens160" => SensorKind::Ens160,
            "bom" => SensorKind::Bom,
            _ => return Err(ConfigurationError::UnknownSensorType(s.to_string())),
        };
        Ok(kind)
    }
}

/// Trait for all sensors
///
/// A sensor declares up front which signals it can answer; the registry
/// resolves signals by looking at that declaration rather than the concrete
/// type. `refresh` is only ever called by the poll loop.
#[async_trait]
pub trait Sensor: Send + Sync {
    /// Display name from the configuration
    fn name(&self) -> &str;

    /// Declared sensor type
    fn kind(&self) -> SensorKind;

    /// Signals this sensor can answer
    fn signals(&self) -> &'static [Signal];

    /// Make exactly one attempt at a fresh reading.
    ///
    /// On failure the previous reading is kept.
    async fn refresh(&mut self) -> Result<(), ReadError>;

    /// Human-readable rendering of the current state
    fn summarize(&self) -> String;

    /// Current value for `signal`, `None` if it has never been read or is not declared
    fn value(&self, signal: Signal) -> Option<SignalValue>;

    /// Whether `signal` is part of the declared capability set
    fn answers(&self, signal: Signal) -> bool {
        self.signals().contains(&signal)
    }
}

/// Refresh bookkeeping kept by the registry for every sensor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorHealth {
    pub name: String,
    pub kind: SensorKind,
    pub refresh_count: u64,
    pub error_count: u64,
    pub last_error: Option<String>,
    pub last_success: Option<DateTime<Utc>>,
}

impl SensorHealth {
    pub fn new(name: &str, kind: SensorKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            refresh_count: 0,
            error_count: 0,
            last_error: None,
            last_success: None,
        }
    }
}

/// Metric name for a sensor quantity, e.g. `office_temperature`
pub(crate) fn metric_name(sensor: &str, quantity: &str) -> String {
    let sanitized: String = sensor
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect();
    format!("{}_{}", sanitized, quantity)
}
