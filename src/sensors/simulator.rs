// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/roomsense

//! Simulated device bus for demo/testing

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::{StandardNormal, Uniform};
use std::f64::consts::PI;

use super::transport::{
    AirQualitySample, ClimateSample, DeviceBus, DeviceTransport, HumidityTemp, PressureTemp,
    SwitchSample, Transport,
};
use crate::error::TransportError;

/// Samples per simulated day
const DAY_STEPS: f64 = 17280.0;

/// Per-device simulation state
struct SimState {
    rng: StdRng,
    time: f64,
    drift: f64,
    level: f64,
    present: bool,
}

impl SimState {
    fn step(&mut self) {
        self.time += 1.0;
        self.drift = (self.drift + self.rng.gen_range(-0.01..0.01)).clamp(-1.5, 1.5);

        // Someone walks in or out now and then
        if self.rng.gen::<f64>() < 0.02 {
            self.present = !self.present;
        }
    }

    fn noise(&mut self, sd: f64) -> f64 {
        self.rng.sample::<f64, _>(StandardNormal) * sd
    }

    fn daylight(&self) -> f64 {
        (self.time * 2.0 * PI / DAY_STEPS).sin().max(0.0)
    }

    fn temperature(&mut self) -> f64 {
        21.5 + self.drift + 1.5 * self.daylight() + self.noise(0.05)
    }

    fn humidity(&mut self) -> f64 {
        (48.0 - self.drift * 4.0 + self.noise(0.4)).clamp(0.0, 100.0)
    }

    fn pressure(&mut self) -> f64 {
        1013.25 + self.drift * 2.0 + self.noise(0.1)
    }
}

fn thermometer(s: &mut SimState) -> f64 {
    s.temperature()
}

fn hygrometer(s: &mut SimState) -> HumidityTemp {
    HumidityTemp {
        temperature: s.temperature(),
        humidity: s.humidity(),
    }
}

fn climate(s: &mut SimState) -> ClimateSample {
    ClimateSample {
        temperature: s.temperature(),
        pressure: s.pressure(),
        humidity: s.humidity(),
    }
}

fn barometer(s: &mut SimState) -> PressureTemp {
    PressureTemp {
        pressure: s.pressure(),
        temperature: s.temperature(),
    }
}

fn light_meter(s: &mut SimState) -> f64 {
    let lux = 5.0 + 600.0 * s.daylight() + s.noise(4.0);
    lux.max(0.0)
}

fn range_finder(s: &mut SimState) -> u16 {
    let (lo, hi) = if s.present { (350, 950) } else { (1400, 2600) };
    s.rng.sample(Uniform::new(lo, hi))
}

fn touch_pad(s: &mut SimState) -> [bool; 3] {
    let mut zones = [false; 3];
    if s.rng.gen::<f64>() < 0.03 {
        zones[s.rng.gen_range(0..3)] = true;
    }
    zones
}

fn switch(s: &mut SimState) -> SwitchSample {
    let roll = s.rng.gen::<f64>();
    SwitchSample {
        pressed: roll < 0.04,
        double_pressed: roll < 0.01,
    }
}

fn dial(s: &mut SimState) -> u16 {
    // Mostly jitter, occasionally someone turns the knob
    if s.rng.gen::<f64>() < 0.05 {
        s.level = s.rng.gen_range(0.0..1023.0);
    }
    (s.level + s.noise(1.5)).clamp(0.0, 1023.0) as u16
}

fn motion(s: &mut SimState) -> bool {
    s.present && s.rng.gen::<f64>() < 0.8
}

fn air_quality(s: &mut SimState) -> AirQualitySample {
    let tvoc = (120.0 + s.drift * 40.0 + s.noise(10.0)).max(0.0) as u16;
    let eco2 = (560.0 + s.drift * 80.0 + s.noise(15.0)).max(400.0) as u16;
    let (aqi, rating) = if eco2 < 600 { (1, "excellent") } else { (2, "good") };

    AirQualitySample {
        operation: Ok("standard".to_string()),
        aqi: Ok((aqi, rating.to_string())),
        tvoc: Ok(tvoc),
        eco2: Ok((eco2, rating.to_string())),
    }
}

/// One simulated device behind a bus address
struct SimulatedDevice<S> {
    address: u8,
    fault_probability: f64,
    state: SimState,
    generate: fn(&mut SimState) -> S,
}

impl<S: Send + Sync> DeviceTransport for SimulatedDevice<S> {
    type Sample = S;

    fn read(&mut self) -> Result<S, TransportError> {
        self.state.step();

        if self.state.rng.gen::<f64>() < self.fault_probability {
            return Err(TransportError::Io(format!(
                "simulated NACK from {:#04x}",
                self.address
            )));
        }

        Ok((self.generate)(&mut self.state))
    }
}

/// Device bus producing plausible indoor readings for every sensor type
pub struct SimulatedBus {
    fault_probability: f64,
    seed: Option<u64>,
}

impl SimulatedBus {
    pub fn new() -> Self {
        Self {
            fault_probability: 0.01,
            seed: None,
        }
    }

    /// Deterministic bus; each address gets its own stream
    pub fn seeded(seed: u64) -> Self {
        Self {
            fault_probability: 0.0,
            seed: Some(seed),
        }
    }

    pub fn with_fault_probability(mut self, probability: f64) -> Self {
        self.fault_probability = probability.clamp(0.0, 1.0);
        self
    }

    fn open<S: Send + Sync + 'static>(
        &self,
        address: u8,
        generate: fn(&mut SimState) -> S,
    ) -> Result<Transport<S>, TransportError> {
        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed ^ address as u64),
            None => StdRng::from_entropy(),
        };

        Ok(Box::new(SimulatedDevice {
            address,
            fault_probability: self.fault_probability,
            state: SimState {
                rng,
                time: 0.0,
                drift: 0.0,
                level: 512.0,
                present: false,
            },
            generate,
        }))
    }
}

impl Default for SimulatedBus {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceBus for SimulatedBus {
    fn open_thermometer(&self, address: u8) -> Result<Transport<f64>, TransportError> {
        self.open(address, thermometer)
    }
    fn open_hygrometer(&self, address: u8) -> Result<Transport<HumidityTemp>, TransportError> {
        self.open(address, hygrometer)
    }
    fn open_climate(&self, address: u8) -> Result<Transport<ClimateSample>, TransportError> {
        self.open(address, climate)
    }
    fn open_barometer(&self, address: u8) -> Result<Transport<PressureTemp>, TransportError> {
        self.open(address, barometer)
    }
    fn open_light_meter(&self, address: u8) -> Result<Transport<f64>, TransportError> {
        self.open(address, light_meter)
    }
    fn open_range_finder(&self, address: u8) -> Result<Transport<u16>, TransportError> {
        self.open(address, range_finder)
    }
    fn open_touch_pad(&self, address: u8) -> Result<Transport<[bool; 3]>, TransportError> {
        self.open(address, touch_pad)
    }
    fn open_switch(&self, address: u8) -> Result<Transport<SwitchSample>, TransportError> {
        self.open(address, switch)
    }
    fn open_dial(&self, address: u8) -> Result<Transport<u16>, TransportError> {
        self.open(address, dial)
    }
    fn open_motion(&self, address: u8) -> Result<Transport<bool>, TransportError> {
        self.open(address, motion)
    }
    fn open_air_quality(&self, address: u8) -> Result<Transport<AirQualitySample>, TransportError> {
        self.open(address, air_quality)
    }
}
