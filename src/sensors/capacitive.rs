// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/roomsense

//! Capacitive touch sensors

use async_trait::async_trait;

use super::transport::Transport;
use super::{ReadError, Sensor, SensorKind, Signal, SignalValue};

/// CAP1203 three-zone capacitive touch pad
///
/// The zones are reported as-is; there is no fusion across pads and no
/// hysteresis on any single pad.
pub struct TouchPad {
    name: String,
    transport: Transport<[bool; 3]>,
    zones: Option<[bool; 3]>,
}

impl TouchPad {
    pub fn new(name: &str, transport: Transport<[bool; 3]>) -> Self {
        Self {
            name: name.to_string(),
            transport,
            zones: None,
        }
    }
}

#[async_trait]
impl Sensor for TouchPad {
    fn name(&self) -> &str { &self.name }
    fn kind(&self) -> SensorKind { SensorKind::Cap1203 }
    fn signals(&self) -> &'static [Signal] { &[Signal::TouchZones] }

    async fn refresh(&mut self) -> Result<(), ReadError> {
        let zones = self.transport.read().map_err(|e| ReadError::new(&self.name, e))?;
        self.zones = Some(zones);
        Ok(())
    }

    fn summarize(&self) -> String {
        let [a, b, c] = self.zones.unwrap_or_default();
        format!("{}: {},{},{}", self.name, a, b, c)
    }

    fn value(&self, signal: Signal) -> Option<SignalValue> {
        match signal {
            Signal::TouchZones => self.zones.map(SignalValue::Zones),
            _ => None,
        }
    }
}
