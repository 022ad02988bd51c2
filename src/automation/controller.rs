// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/roomsense

//! Light controllers

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::info;

use super::LightCommand;
use crate::streaming::MqttClient;

/// Something that can act on a light
#[async_trait]
pub trait LightController: Send + Sync {
    async fn apply(&self, command: &LightCommand) -> Result<()>;
}

/// Logs commands and remembers the last one
#[derive(Default)]
pub struct LoggingLightController {
    last: Mutex<Option<LightCommand>>,
}

impl LoggingLightController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_command(&self) -> Option<LightCommand> {
        *self.last.lock()
    }
}

#[async_trait]
impl LightController for LoggingLightController {
    async fn apply(&self, command: &LightCommand) -> Result<()> {
        match (command.power, command.color) {
            (Some(false), _) => info!("Light off"),
            (_, Some(color)) => info!(
                "Light {} at {} K{}",
                color.brightness,
                color.kelvin,
                if command.power == Some(true) { ", on" } else { "" }
            ),
            (Some(true), None) => info!("Light on"),
            (None, None) => {}
        }
        *self.last.lock() = Some(*command);
        Ok(())
    }
}

/// Publishes each command as JSON to a fixed topic
pub struct MqttLightController {
    client: MqttClient,
    topic: String,
}

impl MqttLightController {
    pub fn new(client: MqttClient, topic: &str) -> Self {
        Self {
            client,
            topic: topic.to_string(),
        }
    }
}

#[async_trait]
impl LightController for MqttLightController {
    async fn apply(&self, command: &LightCommand) -> Result<()> {
        self.client.publish(&self.topic, command, false).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_logging_controller_remembers_last() {
        let controller = LoggingLightController::new();
        assert!(controller.last_command().is_none());

        controller.apply(&LightCommand::full_on()).await.unwrap();
        controller.apply(&LightCommand::off()).await.unwrap();
        assert_eq!(controller.last_command(), Some(LightCommand::off()));
    }

    #[test]
    fn test_command_payload() {
        let json = serde_json::to_string(&LightCommand::off()).unwrap();
        assert_eq!(json, r#"{"power":false}"#);

        let json = serde_json::to_string(&LightCommand::dim(640)).unwrap();
        assert_eq!(json, r#"{"color":{"hue":5461,"saturation":0,"brightness":640,"kelvin":4000}}"#);
    }
}
