//! Simulated drivers for hosts without the real peripherals.
//!
//! Values follow a bounded random walk so a display or a log looks alive.
//! Both drivers can be told to be absent (fatal at init) or to fail every
//! Nth read, which exercises the retry path.

use super::adc::AdcDriver;
use super::sht31::ClimateDriver;
use crate::errors::SensorError;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub struct SimulatedAdc {
    rng: StdRng,
    level: f32,
    full_scale: u16,
    present: bool,
    fail_every: Option<u32>,
    reads: u32,
}

impl SimulatedAdc {
    pub fn new(seed: u64, bits: u8) -> Self {
        let full_scale = ((1u32 << bits.clamp(1, 16)) - 1) as u16;
        let mut rng = StdRng::seed_from_u64(seed);
        let level = rng.gen_range(0.2f32..0.8) * full_scale as f32;
        Self {
            rng,
            level,
            full_scale,
            present: true,
            fail_every: None,
            reads: 0,
        }
    }

    pub fn absent(mut self) -> Self {
        self.present = false;
        self
    }

    pub fn failing_every(mut self, n: u32) -> Self {
        self.fail_every = Some(n.max(1));
        self
    }
}

impl AdcDriver for SimulatedAdc {
    fn configure(&mut self, pin: u8, _bits: u8) -> Result<(), SensorError> {
        if !self.present {
            return Err(SensorError::NotFound(format!("ADC GPIO{}", pin)));
        }
        Ok(())
    }

    fn read_raw(&mut self, _pin: u8) -> Result<u16, SensorError> {
        self.reads = self.reads.wrapping_add(1);
        if let Some(n) = self.fail_every {
            if self.reads % n == 0 {
                return Err(SensorError::Unavailable("simulated ADC glitch".into()));
            }
        }
        let step = self.rng.gen_range(-0.01f32..0.01) * self.full_scale as f32;
        self.level = (self.level + step).clamp(0.0, self.full_scale as f32);
        Ok(self.level.round() as u16)
    }
}

pub struct SimulatedClimate {
    rng: StdRng,
    temperature: f32,
    humidity: f32,
    present: bool,
    nan_every: Option<u32>,
    reads: u32,
}

impl SimulatedClimate {
    pub fn new(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let temperature = rng.gen_range(15.0f32..25.0);
        let humidity = rng.gen_range(30.0f32..60.0);
        Self {
            rng,
            temperature,
            humidity,
            present: true,
            nan_every: None,
            reads: 0,
        }
    }

    pub fn absent(mut self) -> Self {
        self.present = false;
        self
    }

    /// Every Nth temperature read returns NaN.
    pub fn nan_every(mut self, n: u32) -> Self {
        self.nan_every = Some(n.max(1));
        self
    }
}

impl ClimateDriver for SimulatedClimate {
    fn begin(&mut self, _addr: u8) -> bool {
        self.present
    }

    fn read_temperature(&mut self) -> f32 {
        self.reads = self.reads.wrapping_add(1);
        if let Some(n) = self.nan_every {
            if self.reads % n == 0 {
                return f32::NAN;
            }
        }
        self.temperature = (self.temperature + self.rng.gen_range(-0.2f32..0.2)).clamp(-40.0, 125.0);
        self.temperature
    }

    fn read_humidity(&mut self) -> f32 {
        self.humidity = (self.humidity + self.rng.gen_range(-0.5f32..0.5)).clamp(0.0, 100.0);
        self.humidity
    }
}
