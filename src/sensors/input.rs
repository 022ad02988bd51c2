// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/roomsense

//! Human input devices - push switch and rotary potentiometer

use async_trait::async_trait;

use super::filters::{classify_press, DialFilter};
use super::transport::{SwitchSample, Transport};
use super::{DialReading, PressKind, ReadError, Sensor, SensorKind, Signal, SignalValue};
use crate::error::TransportError;

/// Push switch with device-side press and double-press latches
pub struct SwitchSensor {
    name: String,
    transport: Transport<SwitchSample>,
    last: SwitchSample,
}

impl SwitchSensor {
    pub fn new(name: &str, transport: Transport<SwitchSample>) -> Self {
        Self {
            name: name.to_string(),
            transport,
            last: SwitchSample::default(),
        }
    }

    pub fn press(&self) -> PressKind {
        classify_press(self.last.pressed, self.last.double_pressed)
    }
}

#[async_trait]
impl Sensor for SwitchSensor {
    fn name(&self) -> &str { &self.name }
    fn kind(&self) -> SensorKind { SensorKind::Switch }
    fn signals(&self) -> &'static [Signal] { &[Signal::SwitchPress] }

    async fn refresh(&mut self) -> Result<(), ReadError> {
        match self.transport.read() {
            Ok(sample) => {
                self.last = sample;
                Ok(())
            }
            Err(e) => {
                // A stale press must not fire twice
                self.last = SwitchSample::default();
                Err(ReadError::new(&self.name, e))
            }
        }
    }

    fn summarize(&self) -> String {
        format!("{}: {},{}", self.name, self.last.pressed, self.last.double_pressed)
    }

    fn value(&self, signal: Signal) -> Option<SignalValue> {
        match signal {
            Signal::SwitchPress => Some(SignalValue::Press(self.press())),
            _ => None,
        }
    }
}

/// Rotary potentiometer with jitter suppression
pub struct DialSensor {
    name: String,
    transport: Transport<u16>,
    filter: DialFilter,
    last: DialReading,
}

impl DialSensor {
    /// Opens the dial, taking the first raw read as the accepted value
    pub fn open(name: &str, mut transport: Transport<u16>) -> Result<Self, TransportError> {
        let initial = transport.read()?;

        Ok(Self {
            name: name.to_string(),
            transport,
            filter: DialFilter::new(initial),
            last: DialReading { changed: false, value: initial, delta: 0 },
        })
    }

    pub fn reading(&self) -> DialReading {
        self.last
    }
}

#[async_trait]
impl Sensor for DialSensor {
    fn name(&self) -> &str { &self.name }
    fn kind(&self) -> SensorKind { SensorKind::Potentiometer }
    fn signals(&self) -> &'static [Signal] { &[Signal::Dial] }

    async fn refresh(&mut self) -> Result<(), ReadError> {
        match self.transport.read() {
            Ok(raw) => {
                self.last = self.filter.observe(raw);
                Ok(())
            }
            Err(e) => {
                self.last = DialReading { changed: false, value: self.filter.accepted(), delta: 0 };
                Err(ReadError::new(&self.name, e))
            }
        }
    }

    fn summarize(&self) -> String {
        format!("{}: {},{}", self.name, self.last.changed, self.last.value)
    }

    fn value(&self, signal: Signal) -> Option<SignalValue> {
        match signal {
            Signal::Dial => Some(SignalValue::Dial(self.last)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::transport::scripted::scripted;

    #[tokio::test]
    async fn test_switch_press_classification() {
        let (transport, script) = scripted(vec![Ok(SwitchSample { pressed: true, double_pressed: false })]);
        let mut switch = SwitchSensor::new("door", transport);

        switch.refresh().await.unwrap();
        assert_eq!(switch.value(Signal::SwitchPress), Some(SignalValue::Press(PressKind::Single)));
        assert_eq!(switch.summarize(), "door: true,false");

        script.push(SwitchSample { pressed: true, double_pressed: true });
        switch.refresh().await.unwrap();
        assert_eq!(switch.press(), PressKind::Double);

        script.fail(TransportError::Io("nack".to_string()));
        assert!(switch.refresh().await.is_err());
        assert_eq!(switch.press(), PressKind::None);
    }

    #[tokio::test]
    async fn test_dial_jitter_suppressed() {
        let (transport, _) = scripted(vec![Ok(100), Ok(102), Ok(104), Ok(108)]);
        let mut dial = DialSensor::open("knob", transport).unwrap();

        dial.refresh().await.unwrap();
        assert!(!dial.reading().changed);
        dial.refresh().await.unwrap();
        assert!(!dial.reading().changed);
        assert_eq!(dial.reading().value, 100);

        dial.refresh().await.unwrap();
        let reading = dial.reading();
        assert!(reading.changed);
        assert_eq!(reading.value, 108);
        assert_eq!(reading.delta, 8);
        assert_eq!(dial.summarize(), "knob: true,108");
    }

    #[test]
    fn test_dial_open_fails_without_initial_read() {
        let (transport, _) = scripted::<u16>(vec![Err(TransportError::NoDevice(0x35))]);
        assert!(DialSensor::open("knob", transport).is_err());
    }
}
