// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/roomsense

//! roomsense - room sensor fusion and scheduled telemetry
//!
//! Heterogeneous sensors are polled in declaration order, their readings
//! resolved per signal, and the result fanned out to the local display,
//! an MQTT bridge, a Prometheus exporter and lighting rules. Slow network
//! sources (weather, disk prices) run as background scanners.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       roomsense Engine                       │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌──────────┐  ┌──────────┐  ┌───────────┐  ┌─────────────┐  │
//! │  │ Sensors  │→ │ Registry │→ │ Snapshot  │→ │  Consumers  │  │
//! │  │ (bus)    │  │ resolve  │  │           │  │ display/mqtt│  │
//! │  └──────────┘  └──────────┘  └───────────┘  │ lighting    │  │
//! │       ↑                                     └─────────────┘  │
//! │  ┌──────────┐      ┌───────────┐      ┌──────────────────┐   │
//! │  │ Scanners │  ←── │ Scheduler │      │ Telemetry Bus    │   │
//! │  └──────────┘      └───────────┘      └────────┬─────────┘   │
//! │                                          /metrics exporter   │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod automation;
pub mod config;
pub mod core;
pub mod error;
pub mod scanners;
pub mod sensors;
pub mod streaming;

// Re-exports for convenience
pub use config::Config;
pub use core::{Engine, Scheduler, TelemetryBus};
pub use error::{ConfigurationError, ParseError, ReadError, ScanError, TransportError};
pub use scanners::ScannerHub;
pub use sensors::{Sensor, SensorFactory, SensorRegistry, Signal, SignalValue};
pub use streaming::{SignalConsumer, SignalSnapshot};

/// roomsense version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// roomsense name
pub const NAME: &str = "roomsense";

/// Build info
pub fn build_info() -> BuildInfo {
    BuildInfo {
        version: VERSION.to_string(),
        target: std::env::consts::ARCH.to_string(),
        os: std::env::consts::OS.to_string(),
    }
}

/// Build information
#[derive(Debug, Clone)]
pub struct BuildInfo {
    pub version: String,
    pub target: String,
    pub os: String,
}
