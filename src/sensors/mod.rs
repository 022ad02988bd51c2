// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/roomsense

//! Sensor module - device-backed and scanner-backed signal sources

mod capacitive;
mod environmental;
mod factory;
pub mod filters;
mod input;
mod motion;
mod optical;
mod registry;
mod simulator;
mod traits;
pub mod transport;
mod weather;

pub use capacitive::TouchPad;
pub use environmental::{AirQualitySensor, BarometerSensor, ClimateSensor, HumiditySensor, TemperatureSensor};
pub use factory::{resolve_address, SensorFactory};
pub use input::{DialSensor, SwitchSensor};
pub use motion::MotionSensor;
pub use optical::{AmbientLightSensor, RangeSensor};
pub use registry::{SensorRegistry, Wind, SUMMARY_DELIMITER};
pub use simulator::SimulatedBus;
pub use traits::{DialReading, PressKind, Sensor, SensorHealth, SensorKind, Signal, SignalValue};
pub use transport::{CalibrationOffsets, DetachedBus, DeviceBus};
pub use weather::WeatherSensor;

pub use crate::error::ReadError;
