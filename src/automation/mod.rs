// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/roomsense

//! Lighting automation
//!
//! Rules are pure: a snapshot goes in, a list of commands comes out, in the
//! order the light should apply them. Delivery is the controller's job.

mod controller;

pub use controller::{LightController, LoggingLightController, MqttLightController};

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::sensors::PressKind;
use crate::streaming::{SignalConsumer, SignalSnapshot};

/// Warm white hue used for every colour command
pub const WARM_HUE: u16 = 5461;
pub const FULL_BRIGHTNESS: u16 = 65535;
pub const LOW_BRIGHTNESS: u16 = 47185;
pub const FULL_KELVIN: u16 = 4000;
pub const LOW_KELVIN: u16 = 2000;

/// Hue, saturation, brightness and colour temperature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightColor {
    pub hue: u16,
    pub saturation: u16,
    pub brightness: u16,
    pub kelvin: u16,
}

impl LightColor {
    pub fn white(brightness: u16, kelvin: u16) -> Self {
        Self {
            hue: WARM_HUE,
            saturation: 0,
            brightness,
            kelvin,
        }
    }
}

/// One change to apply to the light. Colour is set before power.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightCommand {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<LightColor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub power: Option<bool>,
}

impl LightCommand {
    pub fn full_on() -> Self {
        Self {
            color: Some(LightColor::white(FULL_BRIGHTNESS, FULL_KELVIN)),
            power: Some(true),
        }
    }

    pub fn low_on() -> Self {
        Self {
            color: Some(LightColor::white(LOW_BRIGHTNESS, LOW_KELVIN)),
            power: Some(true),
        }
    }

    pub fn off() -> Self {
        Self { color: None, power: Some(false) }
    }

    /// Brightness only; the power state is left alone
    pub fn dim(brightness: u16) -> Self {
        Self {
            color: Some(LightColor::white(brightness, FULL_KELVIN)),
            power: None,
        }
    }
}

/// Dial positions are 10-bit; scale to the full 16-bit brightness range
pub fn dial_brightness(value: u16) -> u16 {
    value << 6
}

/// Commands for one snapshot: switch first, then dial, then touch zones
pub fn evaluate(snapshot: &SignalSnapshot) -> Vec<LightCommand> {
    let mut commands = Vec::new();

    match snapshot.switch_press {
        Some(PressKind::Single) => commands.push(LightCommand::full_on()),
        Some(PressKind::Double) => commands.push(LightCommand::off()),
        _ => {}
    }

    if let Some(dial) = snapshot.dial.filter(|d| d.changed) {
        commands.push(LightCommand::dim(dial_brightness(dial.value)));
    }

    if let Some([off, low, full]) = snapshot.touch_zones {
        if off {
            commands.push(LightCommand::off());
        }
        if low {
            commands.push(LightCommand::low_on());
        }
        if full {
            commands.push(LightCommand::full_on());
        }
    }

    commands
}

/// Feeds rule output to a controller each cycle
pub struct LightingConsumer {
    controller: Arc<dyn LightController>,
}

impl LightingConsumer {
    pub fn new(controller: Arc<dyn LightController>) -> Self {
        Self { controller }
    }
}

#[async_trait]
impl SignalConsumer for LightingConsumer {
    fn name(&self) -> &str {
        "lighting"
    }

    async fn publish(&self, snapshot: &SignalSnapshot) -> Result<()> {
        let commands = evaluate(snapshot);
        if commands.is_empty() {
            return Ok(());
        }

        debug!("Lighting rules produced {} commands", commands.len());
        for command in &commands {
            self.controller.apply(command).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::DialReading;
    use parking_lot::Mutex;

    #[test]
    fn test_switch_presses() {
        let single = SignalSnapshot { switch_press: Some(PressKind::Single), ..Default::default() };
        assert_eq!(evaluate(&single), vec![LightCommand::full_on()]);

        let double = SignalSnapshot { switch_press: Some(PressKind::Double), ..Default::default() };
        assert_eq!(evaluate(&double), vec![LightCommand::off()]);

        let idle = SignalSnapshot { switch_press: Some(PressKind::None), ..Default::default() };
        assert!(evaluate(&idle).is_empty());
    }

    #[test]
    fn test_dial_only_when_changed() {
        let moved = SignalSnapshot {
            dial: Some(DialReading { changed: true, value: 512, delta: 40 }),
            ..Default::default()
        };
        let commands = evaluate(&moved);
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].color.map(|c| c.brightness), Some(32768));
        assert_eq!(commands[0].power, None);

        let still = SignalSnapshot {
            dial: Some(DialReading { changed: false, value: 512, delta: 0 }),
            ..Default::default()
        };
        assert!(evaluate(&still).is_empty());
    }

    #[test]
    fn test_zones_map_to_scenes() {
        let snapshot = SignalSnapshot { touch_zones: Some([false, true, false]), ..Default::default() };
        let commands = evaluate(&snapshot);
        assert_eq!(commands, vec![LightCommand::low_on()]);
        assert_eq!(commands[0].color.map(|c| c.kelvin), Some(LOW_KELVIN));

        let all = SignalSnapshot { touch_zones: Some([true, true, true]), ..Default::default() };
        assert_eq!(
            evaluate(&all),
            vec![LightCommand::off(), LightCommand::low_on(), LightCommand::full_on()]
        );
    }

    #[test]
    fn test_switch_applies_before_zones() {
        let snapshot = SignalSnapshot {
            switch_press: Some(PressKind::Single),
            touch_zones: Some([true, false, false]),
            ..Default::default()
        };
        assert_eq!(evaluate(&snapshot), vec![LightCommand::full_on(), LightCommand::off()]);
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<LightCommand>>);

    #[async_trait]
    impl LightController for Recorder {
        async fn apply(&self, command: &LightCommand) -> Result<()> {
            self.0.lock().push(*command);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_consumer_delivers_in_order() {
        let recorder = Arc::new(Recorder::default());
        let consumer = LightingConsumer::new(recorder.clone());

        let snapshot = SignalSnapshot {
            switch_press: Some(PressKind::Double),
            touch_zones: Some([false, false, true]),
            ..Default::default()
        };
        consumer.publish(&snapshot).await.unwrap();

        assert_eq!(*recorder.0.lock(), vec![LightCommand::off(), LightCommand::full_on()]);
    }
}
