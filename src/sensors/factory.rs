// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/roomsense

//! Builds live sensors from configuration declarations

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{error, info};

use super::transport::{with_offsets, DeviceBus};
use super::{
    AirQualitySensor, AmbientLightSensor, BarometerSensor, ClimateSensor, DialSensor, HumiditySensor,
    MotionSensor, RangeSensor, Sensor, SensorKind, SensorRegistry, SwitchSensor, TemperatureSensor,
    TouchPad, WeatherSensor,
};
use crate::config::SensorDeclaration;
use crate::core::TelemetryBus;
use crate::error::{ConfigurationError, TransportError};
use crate::scanners::ScannerHub;

/// Lowest and highest usable 7-bit bus addresses
const ADDRESS_RANGE: std::ops::RangeInclusive<u8> = 0x08..=0x77;

/// Address to open for a declaration; 0 selects the type's default
pub fn resolve_address(kind: SensorKind, name: &str, address: u8) -> Result<u8, ConfigurationError> {
    if !kind.is_bus_device() {
        return Ok(0);
    }

    match address {
        0 => Ok(kind.default_address()),
        a if ADDRESS_RANGE.contains(&a) => Ok(a),
        a => Err(ConfigurationError::InvalidAddress {
            name: name.to_string(),
            address: a,
        }),
    }
}

pub struct SensorFactory {
    bus: Arc<dyn DeviceBus>,
    hub: Arc<ScannerHub>,
    telemetry: Arc<TelemetryBus>,
    shutdown: broadcast::Sender<()>,
}

impl SensorFactory {
    pub fn new(
        bus: Arc<dyn DeviceBus>,
        hub: Arc<ScannerHub>,
        telemetry: Arc<TelemetryBus>,
        shutdown: broadcast::Sender<()>,
    ) -> Self {
        Self {
            bus,
            hub,
            telemetry,
            shutdown,
        }
    }

    /// Build one sensor. Errors only affect this declaration.
    pub async fn build(&self, decl: &SensorDeclaration) -> Result<Box<dyn Sensor>, ConfigurationError> {
        let kind: SensorKind = decl.sensor_type.parse()?;
        let address = resolve_address(kind, &decl.name, decl.address)?;
        let name = decl.name.as_str();
        let offsets = decl.offsets;
        let telemetry = self.telemetry.clone();
        let unavailable = |cause: TransportError| ConfigurationError::Unavailable {
            name: decl.name.clone(),
            cause,
        };

        let sensor: Box<dyn Sensor> = match kind {
            SensorKind::Tmp117 => {
                let transport = self.bus.open_thermometer(address).map_err(unavailable)?;
                Box::new(TemperatureSensor::new(name, with_offsets(transport, offsets), telemetry))
            }
            SensorKind::Aht10 => {
                let transport = self.bus.open_hygrometer(address).map_err(unavailable)?;
                Box::new(HumiditySensor::new(name, with_offsets(transport, offsets), telemetry))
            }
            SensorKind::Bme280 => {
                let transport = self.bus.open_climate(address).map_err(unavailable)?;
                Box::new(ClimateSensor::new(name, with_offsets(transport, offsets), telemetry))
            }
            SensorKind::Ms5637 => {
                let transport = self.bus.open_barometer(address).map_err(unavailable)?;
                Box::new(BarometerSensor::new(name, with_offsets(transport, offsets), telemetry))
            }
            SensorKind::Veml6030 => {
                let transport = self.bus.open_light_meter(address).map_err(unavailable)?;
                Box::new(AmbientLightSensor::new(name, transport, telemetry))
            }
            SensorKind::Vl53l1x => {
                let transport = self.bus.open_range_finder(address).map_err(unavailable)?;
                Box::new(RangeSensor::new(name, transport, telemetry))
            }
            SensorKind::Cap1203 => {
                let transport = self.bus.open_touch_pad(address).map_err(unavailable)?;
                Box::new(TouchPad::new(name, transport))
            }
            SensorKind::Switch => {
                let transport = self.bus.open_switch(address).map_err(unavailable)?;
                Box::new(SwitchSensor::new(name, transport))
            }
            SensorKind::Potentiometer => {
                let transport = self.bus.open_dial(address).map_err(unavailable)?;
                Box::new(DialSensor::open(name, transport).map_err(unavailable)?)
            }
            SensorKind::Pir => {
                let transport = self.bus.open_motion(address).map_err(unavailable)?;
                Box::new(MotionSensor::spawn(name, transport, telemetry, self.shutdown.subscribe()))
            }
            SensorKind::Ens160 => {
                let transport = self.bus.open_air_quality(address).map_err(unavailable)?;
                Box::new(AirQualitySensor::new(name, transport, telemetry))
            }
            SensorKind::Bom => {
                let scanner = self.hub.weather().await;
                Box::new(WeatherSensor::new(name, scanner, telemetry))
            }
        };

        info!("Created {} sensor \"{}\" at {:#04x}", kind, name, address);
        Ok(sensor)
    }

    /// Build every declaration in order, skipping the ones that fail
    pub async fn build_all(&self, declarations: &[SensorDeclaration]) -> SensorRegistry {
        let mut registry = SensorRegistry::new();

        for decl in declarations {
            match self.build(decl).await {
                Ok(sensor) => registry.register(sensor),
                Err(e) => error!("Failed to create sensor \"{}\": {}", decl.name, e),
            }
        }

        info!("{} of {} configured sensors active", registry.len(), declarations.len());
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScannerConfig;
    use crate::core::Scheduler;
    use crate::scanners::canned::CannedFetcher;
    use crate::sensors::transport::DetachedBus;
    use crate::sensors::SimulatedBus;

    fn factory(bus: Arc<dyn DeviceBus>) -> SensorFactory {
        let hub = ScannerHub::new(
            Arc::new(CannedFetcher::new()),
            Arc::new(Scheduler::new()),
            ScannerConfig::default(),
        );
        let (shutdown, _) = broadcast::channel(1);
        SensorFactory::new(bus, Arc::new(hub), Arc::new(TelemetryBus::default()), shutdown)
    }

    #[test]
    fn test_address_resolution() {
        assert_eq!(resolve_address(SensorKind::Tmp117, "t", 0), Ok(0x48));
        assert_eq!(resolve_address(SensorKind::Tmp117, "t", 0x49), Ok(0x49));
        assert_eq!(resolve_address(SensorKind::Bom, "w", 0x99), Ok(0));
        assert_eq!(
            resolve_address(SensorKind::Pir, "p", 0x78),
            Err(ConfigurationError::InvalidAddress { name: "p".to_string(), address: 0x78 })
        );
        assert!(resolve_address(SensorKind::Pir, "p", 0x03).is_err());
    }

    #[tokio::test]
    async fn test_rejects_bad_declarations() {
        let factory = factory(Arc::new(SimulatedBus::seeded(3)));

        let err = factory.build(&SensorDeclaration::new("dht22", "attic")).await.err().unwrap();
        assert_eq!(err, ConfigurationError::UnknownSensorType("dht22".to_string()));

        let mut decl = SensorDeclaration::new("tmp117", "office");
        decl.address = 0x7f;
        let err = factory.build(&decl).await.err().unwrap();
        assert!(matches!(err, ConfigurationError::InvalidAddress { .. }));
    }

    #[tokio::test]
    async fn test_detached_bus_reports_unavailable() {
        let factory = factory(Arc::new(DetachedBus));

        let err = factory.build(&SensorDeclaration::new("aht10", "bath")).await.err().unwrap();
        assert_eq!(
            err,
            ConfigurationError::Unavailable {
                name: "bath".to_string(),
                cause: TransportError::NoDevice(0x38),
            }
        );
    }

    #[tokio::test]
    async fn test_build_all_keeps_order_and_skips_failures() {
        let factory = factory(Arc::new(SimulatedBus::seeded(11)));
        let declarations = vec![
            SensorDeclaration::new("vl53l1x", "desk"),
            SensorDeclaration::new("geiger", "basement"),
            SensorDeclaration::new("pir", "hall"),
            SensorDeclaration::new("potentiometer", "knob"),
            SensorDeclaration::new("bom", "outside"),
        ];

        let registry = factory.build_all(&declarations).await;
        assert_eq!(registry.names(), vec!["desk", "hall", "knob", "outside"]);
    }
}
