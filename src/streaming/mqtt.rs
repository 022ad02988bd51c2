// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/roomsense

//! MQTT bridge for the smart-home side

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{SignalConsumer, SignalSnapshot, StreamingConfig};
use crate::sensors::Signal;

/// MQTT client wrapper
#[derive(Clone)]
pub struct MqttClient {
    client: AsyncClient,
    broker: String,
    port: u16,
}

impl MqttClient {
    pub async fn new(config: &StreamingConfig) -> Result<Self> {
        let mut options = MqttOptions::new(
            &config.mqtt_client_id,
            &config.mqtt_broker,
            config.mqtt_port,
        );

        options.set_keep_alive(Duration::from_secs(30));

        if let (Some(username), Some(password)) = (&config.mqtt_username, &config.mqtt_password) {
            options.set_credentials(username, password);
        }

        let (client, mut eventloop) = AsyncClient::new(options, 100);

        // Spawn eventloop handler
        tokio::spawn(async move {
            loop {
                match eventloop.poll().await {
                    Ok(Event::Incoming(Packet::ConnAck(_))) => {
                        info!("MQTT connected");
                    }
                    Ok(Event::Incoming(Packet::Publish(msg))) => {
                        debug!("MQTT received: {:?}", msg.topic);
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!("MQTT error: {:?}", e);
                        tokio::time::sleep(Duration::from_secs(5)).await;
                    }
                }
            }
        });

        info!("MQTT client initialized for {}:{}", config.mqtt_broker, config.mqtt_port);

        Ok(Self {
            client,
            broker: config.mqtt_broker.clone(),
            port: config.mqtt_port,
        })
    }

    pub async fn publish<T: Serialize + ?Sized>(&self, topic: &str, payload: &T, retain: bool) -> Result<()> {
        let json = serde_json::to_vec(payload)?;

        self.client.publish(topic, QoS::AtLeastOnce, retain, json)
            .await
            .map_err(|e| anyhow!("MQTT publish to {}:{} failed: {}", self.broker, self.port, e))?;

        Ok(())
    }

    pub async fn disconnect(&self) -> Result<()> {
        self.client.disconnect()
            .await
            .map_err(|e| anyhow!("MQTT disconnect failed: {}", e))?;

        Ok(())
    }
}

/// Topic for one signal under `prefix`
pub fn signal_topic(prefix: &str, signal: Signal) -> String {
    format!("{}/{}", prefix.trim_end_matches('/'), signal.as_str())
}

/// Publishes every available signal as a retained JSON value
pub struct MqttBridge {
    client: MqttClient,
    prefix: String,
    announced: Mutex<Vec<Signal>>,
}

impl MqttBridge {
    pub fn new(client: MqttClient, prefix: &str) -> Self {
        Self {
            client,
            prefix: prefix.to_string(),
            announced: Mutex::new(Vec::new()),
        }
    }

    /// Signals whose availability changed since the last announcement
    fn availability_changed(&self, current: &[Signal]) -> bool {
        let mut announced = self.announced.lock();
        if announced.as_slice() == current {
            false
        } else {
            *announced = current.to_vec();
            true
        }
    }
}

#[async_trait]
impl SignalConsumer for MqttBridge {
    fn name(&self) -> &str {
        "mqtt"
    }

    async fn publish(&self, snapshot: &SignalSnapshot) -> Result<()> {
        let available = snapshot.available();
        let signals: Vec<Signal> = available.iter().map(|(s, _)| *s).collect();

        if self.availability_changed(&signals) {
            let topic = format!("{}/available", self.prefix.trim_end_matches('/'));
            self.client.publish(&topic, &signals, true).await?;
            info!("Announced {} signals on {}", signals.len(), topic);
        }

        for (signal, value) in &available {
            self.client.publish(&signal_topic(&self.prefix, *signal), value, true).await?;
        }

        Ok(())
    }
}
