//! Measurement types shared by the encoder, decoder, cache and display.

use crate::meshtastic::identity::ShortId;
use serde::Serialize;

/// Round to two decimals (voltage precision on the wire).
pub fn round2(v: f32) -> f32 {
    (v * 100.0).round() / 100.0
}

/// Round to one decimal (temperature / humidity precision on the wire).
pub fn round1(v: f32) -> f32 {
    (v * 10.0).round() / 10.0
}

/// Averaged ADC count and the voltage derived from it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdcSample {
    pub pin: u8,
    pub raw: u16,
    pub volts: f32,
}

/// Temperature in °C and relative humidity in %.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClimateSample {
    pub temperature: f32,
    pub humidity: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Measurement {
    Adc(AdcSample),
    Climate(ClimateSample),
}

impl Measurement {
    /// Copy with every field rounded to its wire precision.
    pub fn rounded(&self) -> Self {
        match *self {
            Measurement::Adc(s) => Measurement::Adc(AdcSample {
                volts: round2(s.volts),
                ..s
            }),
            Measurement::Climate(s) => Measurement::Climate(ClimateSample {
                temperature: round1(s.temperature),
                humidity: round1(s.humidity),
            }),
        }
    }

    /// True when any float field is NaN or infinite (a failed sensor read).
    pub fn has_non_finite(&self) -> bool {
        match self {
            Measurement::Adc(s) => !s.volts.is_finite(),
            Measurement::Climate(s) => !s.temperature.is_finite() || !s.humidity.is_finite(),
        }
    }
}

/// One cycle's observation, tagged with the local short id. Values are
/// rounded at construction and never change afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    device_id: ShortId,
    values: Measurement,
}

impl Reading {
    pub fn new(device_id: ShortId, values: Measurement) -> Self {
        Self {
            device_id,
            values: values.rounded(),
        }
    }

    pub fn device_id(&self) -> &ShortId {
        &self.device_id
    }

    pub fn values(&self) -> &Measurement {
        &self.values
    }
}

/// Fields recovered from a peer message. Each one is tracked as present or
/// absent so a genuine `0.0` is never confused with "missing".
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PeerValues {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pin: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voltage: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f32>,
}

impl PeerValues {
    /// The value a message must carry to be accepted: temperature for climate
    /// nodes, voltage for ADC nodes.
    pub fn primary(&self) -> Option<f32> {
        self.temperature.or(self.voltage)
    }

    pub fn humidity_or_default(&self) -> f32 {
        self.humidity.unwrap_or_default()
    }

    /// Field-wise comparison allowing `tolerance` on floats; presence must match.
    pub fn approx_eq(&self, other: &PeerValues, tolerance: f32) -> bool {
        fn close(a: Option<f32>, b: Option<f32>, tol: f32) -> bool {
            match (a, b) {
                (Some(x), Some(y)) => (x - y).abs() <= tol,
                (None, None) => true,
                _ => false,
            }
        }
        self.pin == other.pin
            && self.raw == other.raw
            && close(self.voltage, other.voltage, tolerance)
            && close(self.temperature, other.temperature, tolerance)
            && close(self.humidity, other.humidity, tolerance)
    }
}

impl From<&Measurement> for PeerValues {
    fn from(m: &Measurement) -> Self {
        match *m {
            Measurement::Adc(s) => PeerValues {
                pin: Some(s.pin),
                raw: Some(s.raw),
                voltage: Some(s.volts),
                ..Default::default()
            },
            Measurement::Climate(s) => PeerValues {
                temperature: Some(s.temperature),
                humidity: Some(s.humidity),
                ..Default::default()
            },
        }
    }
}

/// Result of decoding a peer message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeerReading {
    /// Short id from the message body, not the transport sender.
    pub node_id: String,
    pub values: PeerValues,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meshtastic::identity::{MacAddress, ShortId};

    fn id() -> ShortId {
        ShortId::from_mac(&MacAddress([0, 0, 0, 0, 0xAB, 0xCD]))
    }

    #[test]
    fn reading_rounds_to_wire_precision() {
        let r = Reading::new(
            id(),
            Measurement::Climate(ClimateSample {
                temperature: 21.46,
                humidity: 40.04,
            }),
        );
        assert_eq!(
            *r.values(),
            Measurement::Climate(ClimateSample {
                temperature: 21.5,
                humidity: 40.0
            })
        );
    }

    #[test]
    fn adc_volts_keep_two_decimals() {
        let r = Reading::new(
            id(),
            Measurement::Adc(AdcSample {
                pin: 2,
                raw: 1234,
                volts: 0.99443,
            }),
        );
        match r.values() {
            Measurement::Adc(s) => assert_eq!(s.volts, 0.99),
            other => panic!("expected adc, got {:?}", other),
        }
    }

    #[test]
    fn zero_temperature_is_a_present_primary() {
        let v = PeerValues {
            temperature: Some(0.0),
            ..Default::default()
        };
        assert_eq!(v.primary(), Some(0.0));
        assert_eq!(PeerValues::default().primary(), None);
    }

    #[test]
    fn non_finite_detection() {
        let nan = Measurement::Climate(ClimateSample {
            temperature: f32::NAN,
            humidity: 50.0,
        });
        assert!(nan.has_non_finite());
        let inf = Measurement::Adc(AdcSample {
            pin: 2,
            raw: 4095,
            volts: f32::NEG_INFINITY,
        });
        assert!(inf.has_non_finite());
        let ok = Measurement::Climate(ClimateSample {
            temperature: 0.0,
            humidity: 50.0,
        });
        assert!(!ok.has_non_finite());
    }
}
