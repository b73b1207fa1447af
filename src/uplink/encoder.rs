//! Outbound wire formats.
//!
//! Structured (JSON, flat or nested):
//!
//! ```text
//! {"id":"ABCD","pin":2,"raw":1234,"V":0.99}
//! {"id":"ABCD","adc":{"pin":2,"raw":1234,"V":0.99}}
//! {"id":"ABCD","temp":21.5,"hum":40.0}
//! {"id":"ABCD","env":{"temp":21.5,"hum":40.0}}
//! ```
//!
//! Human-readable text, one labeled value per line:
//!
//! ```text
//! 🌡 Sensor [ABCD]
//! Temp: 21.5°C
//! Humidity: 40.0%
//! ```
//!
//! A message that would exceed the payload bound is an error, never a partial send.

use super::reading::{AdcSample, ClimateSample, Measurement, Reading};
use crate::errors::EncodeError;
use serde::{Deserialize, Serialize};
use std::fmt::Write;

pub const CLIMATE_LABEL: &str = "🌡";
pub const ADC_LABEL: &str = "⚡";

/// Wire format selected per deployment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WireFormat {
    /// Flat JSON object.
    #[default]
    Json,
    /// JSON with the measurement under an `adc` / `env` object.
    JsonNested,
    /// Multi-line text for stock chat clients.
    Text,
}

#[derive(Serialize)]
struct AdcFields {
    pin: u8,
    raw: u16,
    #[serde(rename = "V")]
    volts: f32,
}

#[derive(Serialize)]
struct ClimateFields {
    temp: f32,
    hum: f32,
}

#[derive(Serialize)]
struct FlatMessage<'a, F> {
    id: &'a str,
    #[serde(flatten)]
    fields: F,
}

#[derive(Serialize)]
struct NestedAdc<'a> {
    id: &'a str,
    adc: AdcFields,
}

#[derive(Serialize)]
struct NestedClimate<'a> {
    id: &'a str,
    env: ClimateFields,
}

impl From<&AdcSample> for AdcFields {
    fn from(s: &AdcSample) -> Self {
        AdcFields {
            pin: s.pin,
            raw: s.raw,
            volts: s.volts,
        }
    }
}

impl From<&ClimateSample> for ClimateFields {
    fn from(s: &ClimateSample) -> Self {
        ClimateFields {
            temp: s.temperature,
            hum: s.humidity,
        }
    }
}

/// Serializes readings into bounded radio payloads.
#[derive(Debug, Clone)]
pub struct UplinkEncoder {
    format: WireFormat,
    max_payload: usize,
}

impl UplinkEncoder {
    pub fn new(format: WireFormat, max_payload: usize) -> Self {
        Self {
            format,
            max_payload,
        }
    }

    /// Encode `reading`. Fails with [`EncodeError::Overflow`] unless the
    /// message is strictly shorter than the payload bound, the same limit a
    /// [`PeerDecoder`](super::decoder::PeerDecoder) of that capacity accepts.
    pub fn encode(&self, reading: &Reading) -> Result<Vec<u8>, EncodeError> {
        let bytes = match self.format {
            WireFormat::Json => encode_flat(reading)?,
            WireFormat::JsonNested => encode_nested(reading)?,
            WireFormat::Text => encode_text(reading).into_bytes(),
        };
        if bytes.len() >= self.max_payload {
            return Err(EncodeError::Overflow {
                len: bytes.len(),
                max: self.max_payload,
            });
        }
        Ok(bytes)
    }

    /// Buffer-filling variant: writes into `out` and returns the length, or 0
    /// when the message does not fit `out` or the payload bound.
    pub fn encode_into(&self, reading: &Reading, out: &mut [u8]) -> usize {
        match self.encode(reading) {
            Ok(bytes) if bytes.len() <= out.len() => {
                out[..bytes.len()].copy_from_slice(&bytes);
                bytes.len()
            }
            _ => 0,
        }
    }
}

fn encode_flat(reading: &Reading) -> Result<Vec<u8>, EncodeError> {
    let id = reading.device_id().as_str();
    let out = match reading.values() {
        Measurement::Adc(s) => serde_json::to_vec(&FlatMessage {
            id,
            fields: AdcFields::from(s),
        })?,
        Measurement::Climate(s) => serde_json::to_vec(&FlatMessage {
            id,
            fields: ClimateFields::from(s),
        })?,
    };
    Ok(out)
}

fn encode_nested(reading: &Reading) -> Result<Vec<u8>, EncodeError> {
    let id = reading.device_id().as_str();
    let out = match reading.values() {
        Measurement::Adc(s) => serde_json::to_vec(&NestedAdc {
            id,
            adc: AdcFields::from(s),
        })?,
        Measurement::Climate(s) => serde_json::to_vec(&NestedClimate {
            id,
            env: ClimateFields::from(s),
        })?,
    };
    Ok(out)
}

fn encode_text(reading: &Reading) -> String {
    let id = reading.device_id();
    let mut out = String::with_capacity(64);
    match reading.values() {
        Measurement::Climate(s) => {
            let _ = write!(
                out,
                "{} Sensor [{}]\nTemp: {:.1}°C\nHumidity: {:.1}%",
                CLIMATE_LABEL, id, s.temperature, s.humidity
            );
        }
        Measurement::Adc(s) => {
            let _ = write!(
                out,
                "{} Sensor [{}]\nPin: {}\nRaw: {}\nVoltage: {:.1}V",
                ADC_LABEL, id, s.pin, s.raw, s.volts
            );
        }
    }
    out
}
