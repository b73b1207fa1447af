//! Tolerant decoder for peer telemetry.
//!
//! Peers may run another firmware build, a different wire format, or send
//! garbage. Decoding never fails hard: every field is looked up on its own and
//! a missing field is simply absent. Only two things reject a message:
//!
//! - the payload is at or above the local parse capacity (no partial parse), or
//! - after parsing, the node id is empty or the primary value is absent.
//!
//! Text messages are searched by label (`Temp:`, `Humidity:`, `Voltage:`,
//! `Raw:`, `Pin:`) and the id is taken from the first `[...]` pair. JSON
//! messages use the same tolerance with key lookups, checking the top level
//! first and then the `adc` / `env` sub-objects.

use super::reading::{PeerReading, PeerValues};
use crate::errors::DecodeError;
use serde_json::Value;
use std::str::FromStr;

/// Local parse buffer size; inbound payloads must be strictly smaller.
pub const DEFAULT_PARSE_CAPACITY: usize = 256;
/// Longest node id accepted from a message body.
pub const DEFAULT_ID_CAPACITY: usize = 7;

const NESTED_KEYS: [&str; 2] = ["adc", "env"];

#[derive(Debug, Clone)]
pub struct PeerDecoder {
    parse_capacity: usize,
    id_capacity: usize,
}

impl Default for PeerDecoder {
    fn default() -> Self {
        Self::new(DEFAULT_PARSE_CAPACITY, DEFAULT_ID_CAPACITY)
    }
}

impl PeerDecoder {
    pub fn new(parse_capacity: usize, id_capacity: usize) -> Self {
        Self {
            parse_capacity,
            id_capacity,
        }
    }

    /// Extract whatever is present. The node id may come back empty and any
    /// value may be `None`; only an oversized payload is an error here.
    pub fn parse(&self, payload: &[u8]) -> Result<PeerReading, DecodeError> {
        if payload.len() >= self.parse_capacity {
            return Err(DecodeError::Oversized {
                len: payload.len(),
                max: self.parse_capacity,
            });
        }
        let text = String::from_utf8_lossy(payload);
        let reading = if text.trim_start().starts_with('{') {
            self.parse_json(&text)
        } else {
            self.parse_text(&text)
        };
        Ok(reading)
    }

    /// Parse and apply the acceptance rule: non-empty id and a present primary
    /// value. A genuine `0.0` primary is accepted.
    pub fn decode(&self, payload: &[u8]) -> Result<PeerReading, DecodeError> {
        let reading = self.parse(payload)?;
        if reading.node_id.is_empty() {
            return Err(DecodeError::MissingIdentifier);
        }
        if reading.values.primary().is_none() {
            return Err(DecodeError::MissingPrimary);
        }
        Ok(reading)
    }

    fn parse_text(&self, text: &str) -> PeerReading {
        PeerReading {
            node_id: bracketed_id(text, self.id_capacity),
            values: PeerValues {
                pin: labeled_value(text, "Pin:"),
                raw: labeled_value(text, "Raw:"),
                voltage: labeled_float(text, "Voltage:"),
                temperature: labeled_float(text, "Temp:"),
                humidity: labeled_float(text, "Humidity:"),
            },
        }
    }

    fn parse_json(&self, text: &str) -> PeerReading {
        let doc: Value = match serde_json::from_str(text) {
            Ok(v) => v,
            Err(_) => {
                return PeerReading {
                    node_id: String::new(),
                    values: PeerValues::default(),
                }
            }
        };
        let node_id = doc
            .get("id")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty() && id.len() <= self.id_capacity)
            .unwrap_or_default()
            .to_string();
        PeerReading {
            node_id,
            values: PeerValues {
                pin: json_field(&doc, "pin")
                    .and_then(Value::as_u64)
                    .and_then(|n| u8::try_from(n).ok()),
                raw: json_field(&doc, "raw")
                    .and_then(Value::as_u64)
                    .and_then(|n| u16::try_from(n).ok()),
                voltage: json_float(&doc, "V"),
                temperature: json_float(&doc, "temp"),
                humidity: json_float(&doc, "hum"),
            },
        }
    }
}

/// Text between the first `[` and the next `]`. Empty when either bracket is
/// missing or the id is longer than `capacity` bytes.
fn bracketed_id(text: &str, capacity: usize) -> String {
    let Some(open) = text.find('[') else {
        return String::new();
    };
    let rest = &text[open + 1..];
    let Some(close) = rest.find(']') else {
        return String::new();
    };
    let id = rest[..close].trim();
    if id.len() > capacity {
        return String::new();
    }
    id.to_string()
}

/// Numeric token following `label`, skipping spaces. Units after the number
/// (`°C`, `%`, `V`) end the token.
fn numeric_token<'a>(text: &'a str, label: &str) -> Option<&'a str> {
    let start = text.find(label)? + label.len();
    let rest = text[start..].trim_start_matches([' ', '\t']);
    let end = rest
        .char_indices()
        .take_while(|&(i, c)| c.is_ascii_digit() || c == '.' || (i == 0 && (c == '-' || c == '+')))
        .map(|(i, c)| i + c.len_utf8())
        .last()?;
    Some(&rest[..end])
}

fn labeled_value<T: FromStr>(text: &str, label: &str) -> Option<T> {
    numeric_token(text, label)?.parse().ok()
}

fn labeled_float(text: &str, label: &str) -> Option<f32> {
    labeled_value::<f32>(text, label).filter(|v| v.is_finite())
}

fn json_field<'a>(doc: &'a Value, key: &str) -> Option<&'a Value> {
    doc.get(key).or_else(|| {
        NESTED_KEYS
            .iter()
            .filter_map(|nested| doc.get(nested))
            .find_map(|obj| obj.get(key))
    })
}

fn json_float(doc: &Value, key: &str) -> Option<f32> {
    json_field(doc, key)
        .and_then(Value::as_f64)
        .map(|v| v as f32)
        .filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decoder() -> PeerDecoder {
        PeerDecoder::default()
    }

    #[test]
    fn text_message_decodes_all_fields() {
        let r = decoder()
            .decode("🌡 Sensor [ABCD]\nTemp: 21.5°C\nHumidity: 40.2%".as_bytes())
            .unwrap();
        assert_eq!(r.node_id, "ABCD");
        assert_eq!(r.values.temperature, Some(21.5));
        assert_eq!(r.values.humidity, Some(40.2));
    }

    #[test]
    fn missing_humidity_defaults_to_zero() {
        let r = decoder()
            .decode("🌡 Sensor [ABCD]\nTemp: 19.0°C".as_bytes())
            .unwrap();
        assert_eq!(r.values.temperature, Some(19.0));
        assert_eq!(r.values.humidity, None);
        assert_eq!(r.values.humidity_or_default(), 0.0);
    }

    #[test]
    fn unclosed_bracket_gives_empty_id() {
        let parsed = decoder()
            .parse("🌡 Sensor [ABCD\nTemp: 21.5°C".as_bytes())
            .unwrap();
        assert_eq!(parsed.node_id, "");
        assert_eq!(
            decoder().decode("🌡 Sensor [ABCD\nTemp: 21.5°C".as_bytes()),
            Err(DecodeError::MissingIdentifier)
        );
    }

    #[test]
    fn overlong_id_is_dropped() {
        let parsed = decoder()
            .parse(b"Sensor [ABCDEFGHIJ]\nTemp: 1.0")
            .unwrap();
        assert_eq!(parsed.node_id, "");
    }

    #[test]
    fn zero_celsius_is_accepted() {
        let r = decoder()
            .decode("🌡 Sensor [ABCD]\nTemp: 0.0°C\nHumidity: 80.0%".as_bytes())
            .unwrap();
        assert_eq!(r.values.temperature, Some(0.0));
    }

    #[test]
    fn negative_temperature() {
        let r = decoder()
            .decode("Sensor [F00D]\nTemp: -12.5°C".as_bytes())
            .unwrap();
        assert_eq!(r.values.temperature, Some(-12.5));
    }

    #[test]
    fn missing_primary_is_rejected() {
        assert_eq!(
            decoder().decode(b"Sensor [ABCD]\nHumidity: 40.0%"),
            Err(DecodeError::MissingPrimary)
        );
    }

    #[test]
    fn label_without_number_is_absent() {
        let parsed = decoder().parse(b"Sensor [ABCD]\nTemp: n/a").unwrap();
        assert_eq!(parsed.values.temperature, None);
    }

    #[test]
    fn oversized_payload_rejected_at_capacity() {
        let payload = vec![b'x'; DEFAULT_PARSE_CAPACITY];
        assert_eq!(
            decoder().parse(&payload),
            Err(DecodeError::Oversized {
                len: 256,
                max: 256
            })
        );
        let just_fits = vec![b'x'; DEFAULT_PARSE_CAPACITY - 1];
        assert!(decoder().parse(&just_fits).is_ok());
    }

    #[test]
    fn flat_json() {
        let r = decoder()
            .decode(br#"{"id":"ABCD","pin":2,"raw":1234,"V":0.99}"#)
            .unwrap();
        assert_eq!(r.node_id, "ABCD");
        assert_eq!(r.values.pin, Some(2));
        assert_eq!(r.values.raw, Some(1234));
        assert_eq!(r.values.voltage, Some(0.99));
    }

    #[test]
    fn nested_json() {
        let r = decoder()
            .decode(br#"{"id":"ABCD","adc":{"pin":2,"raw":1234,"V":0.99}}"#)
            .unwrap();
        assert_eq!(r.values.raw, Some(1234));
        assert_eq!(r.values.voltage, Some(0.99));
    }

    #[test]
    fn json_with_wrong_types_is_tolerated() {
        let parsed = decoder()
            .parse(br#"{"id":"ABCD","raw":"lots","V":1.5,"pin":999}"#)
            .unwrap();
        assert_eq!(parsed.values.raw, None);
        assert_eq!(parsed.values.pin, None);
        assert_eq!(parsed.values.voltage, Some(1.5));
    }

    #[test]
    fn broken_json_has_no_fields() {
        assert_eq!(
            decoder().decode(br#"{"id":"ABCD","V":"#),
            Err(DecodeError::MissingIdentifier)
        );
    }

    #[test]
    fn binary_garbage_never_panics() {
        let junk: Vec<u8> = (0u8..=200).collect();
        assert!(decoder().decode(&junk).is_err());
        assert!(decoder().decode(b"[").is_err());
        assert!(decoder().decode(b"]Temp:").is_err());
        assert!(decoder().decode(b"").is_err());
    }
}
