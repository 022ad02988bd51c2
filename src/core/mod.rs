// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/roomsense

//! Core module - poll loop, scheduler and telemetry bus

mod engine;
mod event_bus;
mod scheduler;

pub use engine::Engine;
pub use event_bus::{MetricKind, MetricSample, TelemetryBus};
pub use scheduler::{Scheduler, TaskSnapshot};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// System-wide state
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SystemState {
    pub running: bool,
    pub sensors_active: usize,
    pub cycles: u64,
    pub failed_refreshes: u64,
    pub uptime_seconds: u64,
    pub last_cycle: Option<DateTime<Utc>>,
}
