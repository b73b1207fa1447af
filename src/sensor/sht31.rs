//! SHT31 temperature / humidity over I2C.

use super::SensorSource;
use crate::errors::SensorError;
use crate::uplink::reading::{ClimateSample, Measurement};
use log::debug;

/// Default I2C address (ADDR pin low).
pub const SHT31_DEFAULT_ADDR: u8 = 0x44;

/// Subset of an SHT31 driver. Reads return NaN on a failed conversion, the
/// same contract the common Arduino and embedded-hal drivers use.
pub trait ClimateDriver: Send {
    /// Probe the device at `addr`; `false` when nothing answers.
    fn begin(&mut self, addr: u8) -> bool;

    fn read_temperature(&mut self) -> f32;

    fn read_humidity(&mut self) -> f32;
}

pub struct Sht31Sensor<D> {
    driver: D,
    addr: u8,
    available: bool,
}

impl<D: ClimateDriver> Sht31Sensor<D> {
    pub fn new(driver: D, addr: u8) -> Self {
        Self {
            driver,
            addr,
            available: false,
        }
    }
}

impl<D: ClimateDriver> SensorSource for Sht31Sensor<D> {
    fn init(&mut self) -> Result<(), SensorError> {
        self.available = self.driver.begin(self.addr);
        if !self.available {
            return Err(SensorError::NotFound(format!("SHT31 at {:#04x}", self.addr)));
        }
        debug!("SHT31 found at {:#04x}", self.addr);
        Ok(())
    }

    fn read(&mut self) -> Result<Measurement, SensorError> {
        if !self.available {
            return Err(SensorError::Unavailable("SHT31 not initialized".into()));
        }
        let temperature = self.driver.read_temperature();
        let humidity = self.driver.read_humidity();
        if !temperature.is_finite() || !humidity.is_finite() {
            return Err(SensorError::NotANumber);
        }
        Ok(Measurement::Climate(ClimateSample {
            temperature,
            humidity,
        }))
    }

    fn describe(&self) -> String {
        format!("SHT31 I2C {:#04x}", self.addr)
    }
}
