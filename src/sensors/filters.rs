// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/roomsense

//! Debounce, threshold and edge-detection filters

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use super::traits::{DialReading, PressKind};

/// Readings at or beyond ±100 °C are treated as bus garbage
pub const PLAUSIBLE_TEMPERATURE: f64 = 100.0;

/// Range readings below this many millimetres count as occupied
pub const OCCUPANCY_THRESHOLD_MM: u16 = 1000;

/// Raw units the dial must move before a change is reported
pub const DIAL_TOLERANCE: i32 = 5;

/// Consecutive positive samples required to latch a motion trigger
pub const MOTION_WINDOW: u32 = 3;

/// Open interval (-100, 100)
pub fn plausible_temperature(celsius: f64) -> bool {
    celsius > -PLAUSIBLE_TEMPERATURE && celsius < PLAUSIBLE_TEMPERATURE
}

/// Hard threshold, no hysteresis
pub fn occupied(distance_mm: u16) -> bool {
    distance_mm < OCCUPANCY_THRESHOLD_MM
}

/// Double takes priority when both flags are set in the same cycle
pub fn classify_press(pressed: bool, double_pressed: bool) -> PressKind {
    if double_pressed {
        PressKind::Double
    } else if pressed {
        PressKind::Single
    } else {
        PressKind::None
    }
}

/// Potentiometer change detector.
///
/// The accepted value only moves when a reading differs from it by more
/// than [`DIAL_TOLERANCE`], so adjacent-bit jitter never accumulates.
#[derive(Debug, Clone, Copy)]
pub struct DialFilter {
    accepted: u16,
}

impl DialFilter {
    pub fn new(initial: u16) -> Self {
        Self { accepted: initial }
    }

    pub fn accepted(&self) -> u16 {
        self.accepted
    }

    pub fn observe(&mut self, raw: u16) -> DialReading {
        let delta = raw as i32 - self.accepted as i32;
        if delta.abs() > DIAL_TOLERANCE {
            self.accepted = raw;
            DialReading { changed: true, value: raw, delta }
        } else {
            DialReading { changed: false, value: self.accepted, delta: 0 }
        }
    }
}

/// Motion latch shared between the fast sampler and the poll loop.
///
/// The sampler shifts raw detections into a 3-sample window; a full window
/// sets the latch. The poll loop consumes the latch with [`MotionLatch::take`],
/// so a trigger between two slow cycles is reported exactly once.
#[derive(Debug, Default)]
pub struct MotionLatch {
    window: AtomicU8,
    triggered: AtomicBool,
}

impl MotionLatch {
    const FULL: u8 = (1 << MOTION_WINDOW) - 1;

    pub fn new() -> Self {
        Self::default()
    }

    /// Shift one raw sample in. Only the sampler task calls this.
    pub fn record(&self, detected: bool) {
        let previous = self.window.load(Ordering::Acquire);
        let window = ((previous << 1) | detected as u8) & Self::FULL;
        self.window.store(window, Ordering::Release);

        if window == Self::FULL {
            self.triggered.store(true, Ordering::Release);
        }
    }

    /// Read and clear the latch
    pub fn take(&self) -> bool {
        self.triggered.swap(false, Ordering::AcqRel)
    }

    /// Peek without consuming
    pub fn is_triggered(&self) -> bool {
        self.triggered.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plausibility_bounds_are_exclusive() {
        assert!(plausible_temperature(21.3));
        assert!(plausible_temperature(-99.99));
        assert!(!plausible_temperature(100.0));
        assert!(!plausible_temperature(-100.0));
        assert!(!plausible_temperature(f64::NAN));
    }

    #[test]
    fn test_occupancy_boundary() {
        assert!(occupied(999));
        assert!(!occupied(1000));
        assert!(occupied(0));
    }

    #[test]
    fn test_double_press_wins() {
        assert_eq!(classify_press(false, false), PressKind::None);
        assert_eq!(classify_press(true, false), PressKind::Single);
        assert_eq!(classify_press(false, true), PressKind::Double);
        assert_eq!(classify_press(true, true), PressKind::Double);
    }

    #[test]
    fn test_dial_ignores_jitter() {
        let mut dial = DialFilter::new(100);

        let r = dial.observe(102);
        assert!(!r.changed);
        assert_eq!(dial.accepted(), 100);

        let r = dial.observe(104);
        assert!(!r.changed);
        assert_eq!(dial.accepted(), 100);

        let r = dial.observe(108);
        assert!(r.changed);
        assert_eq!(r.delta, 8);
        assert_eq!(r.value, 108);
        assert_eq!(dial.accepted(), 108);
    }

    #[test]
    fn test_dial_tolerance_is_strict() {
        let mut dial = DialFilter::new(500);
        assert!(!dial.observe(505).changed);
        assert!(!dial.observe(495).changed);

        let r = dial.observe(494);
        assert!(r.changed);
        assert_eq!(r.delta, -6);
    }

    #[test]
    fn test_motion_latch_consume_once() {
        let latch = MotionLatch::new();
        for sample in [false, false, true, true] {
            latch.record(sample);
        }
        assert!(!latch.is_triggered());

        latch.record(true);
        latch.record(false);

        assert!(latch.take());
        assert!(!latch.take());
    }

    #[test]
    fn test_motion_latch_suppresses_glitches() {
        let latch = MotionLatch::new();
        for sample in [true, false, true, true, false, true] {
            latch.record(sample);
        }
        assert!(!latch.take());
    }
}
