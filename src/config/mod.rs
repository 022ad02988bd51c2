// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/roomsense

//! Configuration module

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::scanners::{DEFAULT_DISK_PRICES_URL, DEFAULT_USER_AGENT, DEFAULT_WEATHER_URL};
use crate::sensors::CalibrationOffsets;
use crate::streaming::StreamingConfig;

/// Poll interval used when none is configured
pub const DEFAULT_SAMPLE_INTERVAL_SECS: u64 = 5;

/// Main application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Application name
    pub app_name: String,

    /// Seconds the poll loop sleeps between cycles (0 = default)
    pub sample_interval_secs: u64,

    /// Log every sensor summary each cycle
    pub debug_output: bool,

    /// Use the simulated device bus instead of real hardware
    pub demo_mode: bool,

    /// Sensor declarations; order decides signal resolution
    pub sensors: Vec<SensorDeclaration>,

    /// Background scanner configuration
    pub scanners: ScannerConfig,

    /// Consumer configuration
    pub streaming: StreamingConfig,

    /// Lighting automation
    pub lighting: LightingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: "roomsense".to_string(),
            sample_interval_secs: DEFAULT_SAMPLE_INTERVAL_SECS,
            debug_output: false,
            demo_mode: true,
            sensors: vec![
                SensorDeclaration::new("bme280", "lounge"),
                SensorDeclaration::new("veml6030", "window"),
                SensorDeclaration::new("vl53l1x", "desk"),
                SensorDeclaration::new("pir", "hall"),
                SensorDeclaration::new("cap1203", "panel"),
                SensorDeclaration::new("switch", "door"),
                SensorDeclaration::new("potentiometer", "dimmer"),
            ],
            scanners: ScannerConfig::default(),
            streaming: StreamingConfig::default(),
            lighting: LightingConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Load or create default configuration
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            let config = Self::default();

            // Create parent directories
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            config.save(path)?;
            Ok(config)
        }
    }

    /// Get configuration directory
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("roomsense"))
            .unwrap_or_else(|| PathBuf::from("./config"))
    }

    /// Get default configuration path
    pub fn default_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    pub fn sample_interval(&self) -> Duration {
        match self.sample_interval_secs {
            0 => Duration::from_secs(DEFAULT_SAMPLE_INTERVAL_SECS),
            secs => Duration::from_secs(secs),
        }
    }

    /// Whether any declaration asks for the weather feed
    pub fn wants_weather(&self) -> bool {
        self.sensors
            .iter()
            .any(|s| s.sensor_type.trim().eq_ignore_ascii_case("bom"))
    }
}

/// One configured sensor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorDeclaration {
    /// Type tag, e.g. `bme280`
    pub sensor_type: String,

    /// Display name, also the metric prefix
    pub name: String,

    /// Bus address, 0 for the type default
    #[serde(default)]
    pub address: u8,

    /// Fixed offsets applied to every reading
    #[serde(default, skip_serializing_if = "CalibrationOffsets::is_zero")]
    pub offsets: CalibrationOffsets,
}

impl SensorDeclaration {
    pub fn new(sensor_type: &str, name: &str) -> Self {
        Self {
            sensor_type: sensor_type.to_string(),
            name: name.to_string(),
            address: 0,
            offsets: CalibrationOffsets::default(),
        }
    }
}

/// Background scanner configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    pub weather_url: String,
    pub weather_interval_secs: u64,

    /// Track hard disk prices and export them as metrics
    pub disk_prices_enabled: bool,
    pub disk_prices_url: String,
    pub disk_prices_interval_secs: u64,

    pub request_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            weather_url: DEFAULT_WEATHER_URL.to_string(),
            weather_interval_secs: 5 * 60,
            disk_prices_enabled: false,
            disk_prices_url: DEFAULT_DISK_PRICES_URL.to_string(),
            disk_prices_interval_secs: 2 * 60 * 60,
            request_timeout_secs: 30,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ScannerConfig {
    pub fn weather_interval(&self) -> Duration {
        Duration::from_secs(self.weather_interval_secs.max(1))
    }

    pub fn disk_prices_interval(&self) -> Duration {
        Duration::from_secs(self.disk_prices_interval_secs.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

/// Where light commands go
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LightControllerKind {
    /// Log commands only
    Log,
    /// Publish commands to the MQTT broker
    Mqtt,
}

/// Lighting automation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightingConfig {
    pub enabled: bool,
    pub controller: LightControllerKind,
    pub command_topic: String,
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            controller: LightControllerKind::Log,
            command_topic: "roomsense/light/set".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let mut config = Config::default();
        config.sensors.push(SensorDeclaration {
            sensor_type: "tmp117".to_string(),
            name: "office".to_string(),
            address: 0x49,
            offsets: CalibrationOffsets { temperature: -0.8, ..Default::default() },
        });

        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let text = r#"
            sample_interval_secs = 0
            debug_output = true

            [[sensors]]
            sensor_type = "bom"
            name = "outside"

            [[sensors]]
            sensor_type = "vl53l1x"
            name = "desk"
            address = 0x30
        "#;

        let config: Config = toml::from_str(text).unwrap();
        assert_eq!(config.sample_interval(), Duration::from_secs(5));
        assert_eq!(config.sensors.len(), 2);
        assert_eq!(config.sensors[1].address, 0x30);
        assert!(config.wants_weather());
        assert_eq!(config.scanners.weather_interval(), Duration::from_secs(300));
        assert_eq!(config.scanners.disk_prices_interval(), Duration::from_secs(7200));
    }

    #[test]
    fn test_load_or_create_writes_defaults() {
        let dir = std::env::temp_dir().join(format!("roomsense-config-{}", std::process::id()));
        let path = dir.join("config.toml");

        let created = Config::load_or_create(&path).unwrap();
        let loaded = Config::load(&path).unwrap();
        assert_eq!(created, loaded);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
