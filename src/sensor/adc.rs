//! Averaged analog input.

use super::SensorSource;
use crate::errors::SensorError;
use crate::uplink::reading::{AdcSample, Measurement};
use std::thread;
use std::time::Duration;

/// Minimal ADC primitive the sensor is built on.
pub trait AdcDriver: Send {
    /// Set resolution and input range for `pin`.
    fn configure(&mut self, pin: u8, bits: u8) -> Result<(), SensorError>;

    fn read_raw(&mut self, pin: u8) -> Result<u16, SensorError>;
}

#[derive(Debug, Clone)]
pub struct AdcSettings {
    pub pin: u8,
    pub bits: u8,
    pub vref_volts: f32,
    /// Reads averaged per sample.
    pub sample_count: u32,
    /// Pause between reads. Keep small: the pause blocks the cycle.
    pub sample_delay: Duration,
}

impl Default for AdcSettings {
    fn default() -> Self {
        Self {
            pin: 2,
            bits: 12,
            vref_volts: 3.3,
            sample_count: 16,
            sample_delay: Duration::from_micros(200),
        }
    }
}

/// `raw * vref / (2^bits - 1)`.
pub fn raw_to_volts(raw: u16, bits: u8, vref_volts: f32) -> f32 {
    let full_scale = ((1u32 << bits) - 1) as f32;
    raw as f32 * vref_volts / full_scale
}

pub struct AdcSensor<D> {
    driver: D,
    settings: AdcSettings,
}

impl<D: AdcDriver> AdcSensor<D> {
    pub fn new(driver: D, settings: AdcSettings) -> Self {
        Self { driver, settings }
    }

    /// Integer mean of `sample_count` reads.
    fn read_averaged(&mut self) -> Result<u16, SensorError> {
        let count = self.settings.sample_count.max(1);
        let mut acc: u32 = 0;
        for i in 0..count {
            acc += u32::from(self.driver.read_raw(self.settings.pin)?);
            if i + 1 < count && !self.settings.sample_delay.is_zero() {
                thread::sleep(self.settings.sample_delay);
            }
        }
        Ok((acc / count) as u16)
    }
}

impl<D: AdcDriver> SensorSource for AdcSensor<D> {
    fn init(&mut self) -> Result<(), SensorError> {
        self.driver
            .configure(self.settings.pin, self.settings.bits)
    }

    fn read(&mut self) -> Result<Measurement, SensorError> {
        let raw = self.read_averaged()?;
        let volts = raw_to_volts(raw, self.settings.bits, self.settings.vref_volts);
        if !volts.is_finite() {
            return Err(SensorError::NotANumber);
        }
        Ok(Measurement::Adc(AdcSample {
            pin: self.settings.pin,
            raw,
            volts,
        }))
    }

    fn describe(&self) -> String {
        format!("ADC GPIO{}", self.settings.pin)
    }
}
