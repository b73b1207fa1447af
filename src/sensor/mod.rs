//! # Sensor Sources
//!
//! A [`SensorSource`] turns a peripheral into [`Measurement`]s. Two backends
//! are provided, each generic over a small driver trait so the uplink logic
//! can run against real hardware bindings or the simulated drivers in [`sim`]:
//!
//! - [`adc::AdcSensor`] - averaged analog reads converted to volts
//! - [`sht31::Sht31Sensor`] - I2C temperature / humidity
//!
//! Errors follow [`SensorError`]: `NotFound` during [`SensorSource::init`] is
//! fatal for the module; everything else is retried on the next cycle.

pub mod adc;
pub mod sht31;
pub mod sim;

use crate::config::{SensorBackend, SensorConfig};
use crate::errors::SensorError;
use crate::uplink::reading::Measurement;
use std::time::Duration;

pub trait SensorSource: Send {
    /// One-time peripheral setup, run on the first scheduler cycle.
    fn init(&mut self) -> Result<(), SensorError> {
        Ok(())
    }

    fn read(&mut self) -> Result<Measurement, SensorError>;

    /// Short human description for logs, e.g. `ADC GPIO2`.
    fn describe(&self) -> String;
}

impl<S: SensorSource + ?Sized> SensorSource for Box<S> {
    fn init(&mut self) -> Result<(), SensorError> {
        (**self).init()
    }

    fn read(&mut self) -> Result<Measurement, SensorError> {
        (**self).read()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// Build the configured backend on top of simulated drivers.
pub fn simulated_from_config(cfg: &SensorConfig, seed: u64) -> Box<dyn SensorSource> {
    match cfg.backend {
        SensorBackend::Adc => Box::new(adc::AdcSensor::new(
            sim::SimulatedAdc::new(seed, cfg.adc_bits),
            adc::AdcSettings::from(cfg),
        )),
        SensorBackend::Sht31 => Box::new(sht31::Sht31Sensor::new(
            sim::SimulatedClimate::new(seed),
            cfg.sht31_addr,
        )),
    }
}

impl From<&SensorConfig> for adc::AdcSettings {
    fn from(cfg: &SensorConfig) -> Self {
        adc::AdcSettings {
            pin: cfg.adc_pin,
            bits: cfg.adc_bits,
            vref_volts: cfg.vref_volts,
            sample_count: cfg.sample_count,
            sample_delay: Duration::from_micros(cfg.sample_delay_us),
        }
    }
}
