// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/roomsense

//! Local display text
//!
//! The panel driver is external; this consumer only decides what it shows.

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{info, trace};

use super::{SignalConsumer, SignalSnapshot};

/// What the panel shows: a large headline and two detail lines
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayFrame {
    pub headline: String,
    pub detail: String,
}

/// Temperature headline; pressure plus light when a light sensor answers,
/// otherwise pressure plus humidity. Missing values render as zero.
pub fn render_display(snapshot: &SignalSnapshot) -> DisplayFrame {
    let headline = format!("{:.1} °c", snapshot.temperature.unwrap_or(0.0));
    let pressure = snapshot.pressure.unwrap_or(0.0);

    let detail = match snapshot.light_level {
        Some(lux) => format!("{:.2} hPa\n{:.2} lux", pressure, lux),
        None => format!("{:.2} hPa\n{:.2} rH", pressure, snapshot.humidity.unwrap_or(0.0)),
    };

    DisplayFrame { headline, detail }
}

#[derive(Default)]
pub struct DisplayConsumer {
    last: Mutex<Option<DisplayFrame>>,
}

impl DisplayConsumer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_frame(&self) -> Option<DisplayFrame> {
        self.last.lock().clone()
    }
}

#[async_trait]
impl SignalConsumer for DisplayConsumer {
    fn name(&self) -> &str {
        "display"
    }

    async fn publish(&self, snapshot: &SignalSnapshot) -> Result<()> {
        let frame = render_display(snapshot);
        let mut last = self.last.lock();

        if last.as_ref() != Some(&frame) {
            info!("Display: {} | {}", frame.headline, frame.detail.replace('\n', " / "));
        } else {
            trace!("Display unchanged");
        }
        *last = Some(frame);
        Ok(())
    }
}
