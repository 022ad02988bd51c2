// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/roomsense

//! Device transports - the narrow seam to bus-level drivers
//!
//! Register-level drivers live outside this crate. Each sensor type gets a
//! transport with a single blocking `read`, opened through a [`DeviceBus`].

use serde::{Deserialize, Serialize};

use crate::error::TransportError;

/// A device handle exposing one blocking read
pub trait DeviceTransport: Send + Sync {
    type Sample;

    fn read(&mut self) -> Result<Self::Sample, TransportError>;
}

/// Boxed transport for a given sample type
pub type Transport<S> = Box<dyn DeviceTransport<Sample = S>>;

/// Humidity + temperature sample
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HumidityTemp {
    pub temperature: f64,
    pub humidity: f64,
}

/// Temperature + pressure + humidity sample
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ClimateSample {
    pub temperature: f64,
    pub pressure: f64,
    pub humidity: f64,
}

/// Pressure + temperature sample
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PressureTemp {
    pub pressure: f64,
    pub temperature: f64,
}

/// Press flags latched by the switch itself (device-side debounce)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SwitchSample {
    pub pressed: bool,
    pub double_pressed: bool,
}

/// Air quality reads, each of which may fail independently
#[derive(Debug, Clone, PartialEq)]
pub struct AirQualitySample {
    pub operation: Result<String, TransportError>,
    pub aqi: Result<(u8, String), TransportError>,
    pub tvoc: Result<u16, TransportError>,
    pub eco2: Result<(u16, String), TransportError>,
}

/// Fixed calibration applied by the caller wrapping a transport
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationOffsets {
    pub temperature: f64,
    pub pressure: f64,
    pub humidity: f64,
}

impl CalibrationOffsets {
    pub fn is_zero(&self) -> bool {
        self.temperature == 0.0 && self.pressure == 0.0 && self.humidity == 0.0
    }
}

/// Samples that can carry a calibration offset
pub trait Calibrate {
    fn calibrate(self, offsets: &CalibrationOffsets) -> Self;
}

impl Calibrate for f64 {
    fn calibrate(self, offsets: &CalibrationOffsets) -> Self {
        self + offsets.temperature
    }
}

impl Calibrate for HumidityTemp {
    fn calibrate(self, offsets: &CalibrationOffsets) -> Self {
        Self {
            temperature: self.temperature + offsets.temperature,
            humidity: self.humidity + offsets.humidity,
        }
    }
}

impl Calibrate for ClimateSample {
    fn calibrate(self, offsets: &CalibrationOffsets) -> Self {
        Self {
            temperature: self.temperature + offsets.temperature,
            pressure: self.pressure + offsets.pressure,
            humidity: self.humidity + offsets.humidity,
        }
    }
}

impl Calibrate for PressureTemp {
    fn calibrate(self, offsets: &CalibrationOffsets) -> Self {
        Self {
            pressure: self.pressure + offsets.pressure,
            temperature: self.temperature + offsets.temperature,
        }
    }
}

/// Wraps a transport and shifts every successful sample by fixed offsets
pub struct OffsetTransport<S> {
    inner: Transport<S>,
    offsets: CalibrationOffsets,
}

impl<S> OffsetTransport<S> {
    pub fn new(inner: Transport<S>, offsets: CalibrationOffsets) -> Self {
        Self { inner, offsets }
    }
}

impl<S: Calibrate + 'static> DeviceTransport for OffsetTransport<S> {
    type Sample = S;

    fn read(&mut self) -> Result<S, TransportError> {
        self.inner.read().map(|s| s.calibrate(&self.offsets))
    }
}

/// Apply offsets only when there is something to apply
pub fn with_offsets<S: Calibrate + 'static>(
    transport: Transport<S>,
    offsets: CalibrationOffsets,
) -> Transport<S> {
    if offsets.is_zero() {
        transport
    } else {
        Box::new(OffsetTransport::new(transport, offsets))
    }
}

/// Opens device transports by type and bus address
pub trait DeviceBus: Send + Sync {
    fn open_thermometer(&self, address: u8) -> Result<Transport<f64>, TransportError>;
    fn open_hygrometer(&self, address: u8) -> Result<Transport<HumidityTemp>, TransportError>;
    fn open_climate(&self, address: u8) -> Result<Transport<ClimateSample>, TransportError>;
    fn open_barometer(&self, address: u8) -> Result<Transport<PressureTemp>, TransportError>;
    fn open_light_meter(&self, address: u8) -> Result<Transport<f64>, TransportError>;
    fn open_range_finder(&self, address: u8) -> Result<Transport<u16>, TransportError>;
    fn open_touch_pad(&self, address: u8) -> Result<Transport<[bool; 3]>, TransportError>;
    fn open_switch(&self, address: u8) -> Result<Transport<SwitchSample>, TransportError>;
    fn open_dial(&self, address: u8) -> Result<Transport<u16>, TransportError>;
    fn open_motion(&self, address: u8) -> Result<Transport<bool>, TransportError>;
    fn open_air_quality(&self, address: u8) -> Result<Transport<AirQualitySample>, TransportError>;
}

/// Bus used when no hardware driver is attached: every open fails
pub struct DetachedBus;

impl DeviceBus for DetachedBus {
    fn open_thermometer(&self, address: u8) -> Result<Transport<f64>, TransportError> {
        Err(TransportError::NoDevice(address))
    }
    fn open_hygrometer(&self, address: u8) -> Result<Transport<HumidityTemp>, TransportError> {
        Err(TransportError::NoDevice(address))
    }
    fn open_climate(&self, address: u8) -> Result<Transport<ClimateSample>, TransportError> {
        Err(TransportError::NoDevice(address))
    }
    fn open_barometer(&self, address: u8) -> Result<Transport<PressureTemp>, TransportError> {
        Err(TransportError::NoDevice(address))
    }
    fn open_light_meter(&self, address: u8) -> Result<Transport<f64>, TransportError> {
        Err(TransportError::NoDevice(address))
    }
    fn open_range_finder(&self, address: u8) -> Result<Transport<u16>, TransportError> {
        Err(TransportError::NoDevice(address))
    }
    fn open_touch_pad(&self, address: u8) -> Result<Transport<[bool; 3]>, TransportError> {
        Err(TransportError::NoDevice(address))
    }
    fn open_switch(&self, address: u8) -> Result<Transport<SwitchSample>, TransportError> {
        Err(TransportError::NoDevice(address))
    }
    fn open_dial(&self, address: u8) -> Result<Transport<u16>, TransportError> {
        Err(TransportError::NoDevice(address))
    }
    fn open_motion(&self, address: u8) -> Result<Transport<bool>, TransportError> {
        Err(TransportError::NoDevice(address))
    }
    fn open_air_quality(&self, address: u8) -> Result<Transport<AirQualitySample>, TransportError> {
        Err(TransportError::NoDevice(address))
    }
}


#[cfg(test)]
mod tests {
    use super::scripted::scripted;
    use super::*;

    #[test]
    fn test_offsets_applied_to_successful_reads() {
        let (inner, _) = scripted(vec![
            Ok(ClimateSample { temperature: 20.0, pressure: 1000.0, humidity: 40.0 }),
            Err(TransportError::Io("nack".to_string())),
        ]);
        let offsets = CalibrationOffsets { temperature: -1.5, pressure: 2.0, humidity: 0.0 };
        let mut transport = with_offsets(inner, offsets);

        let sample = transport.read().unwrap();
        assert_eq!(sample.temperature, 18.5);
        assert_eq!(sample.pressure, 1002.0);
        assert_eq!(sample.humidity, 40.0);

        assert!(transport.read().is_err());
    }

    #[test]
    fn test_detached_bus_reports_address() {
        let err = DetachedBus.open_thermometer(0x48).err().unwrap();
        assert_eq!(err, TransportError::NoDevice(0x48));
    }
}
