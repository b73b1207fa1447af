//! Short device identifiers.
//!
//! Nodes tag their telemetry with four hex digits taken from the last two
//! bytes of the 6-byte hardware address, e.g. `24:6F:28:A1:AB:CD` -> `ABCD`.

use anyhow::{anyhow, Result};
use rand::Rng;
use std::fmt;
use std::str::FromStr;

/// Four uppercase hex characters identifying a node in message bodies.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShortId(String);

impl ShortId {
    pub const LEN: usize = 4;

    pub fn from_mac(mac: &MacAddress) -> Self {
        ShortId(format!("{:02X}{:02X}", mac.0[4], mac.0[5]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 6-byte hardware address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MacAddress(pub [u8; 6]);

impl MacAddress {
    /// Random locally-administered unicast address, for simulated nodes.
    pub fn random() -> Self {
        let mut bytes: [u8; 6] = rand::thread_rng().gen();
        bytes[0] = (bytes[0] | 0x02) & 0xFE;
        MacAddress(bytes)
    }

    /// The low four bytes double as the transport node number, as on Meshtastic.
    pub fn node_num(&self) -> u32 {
        u32::from_be_bytes([self.0[2], self.0[3], self.0[4], self.0[5]])
    }
}

impl FromStr for MacAddress {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split([':', '-']).collect();
        if parts.len() != 6 {
            return Err(anyhow!("MAC address '{}' must have 6 octets", s));
        }
        let mut bytes = [0u8; 6];
        for (slot, part) in bytes.iter_mut().zip(parts) {
            *slot = u8::from_str_radix(part, 16)
                .map_err(|e| anyhow!("Invalid MAC octet '{}' in '{}': {}", part, s, e))?;
        }
        Ok(MacAddress(bytes))
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = self.0;
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            b[0], b[1], b[2], b[3], b[4], b[5]
        )
    }
}

/// Source of this node's short id.
pub trait Identity: Send {
    fn short_id(&self) -> ShortId;
}

/// Identity backed by a fixed hardware address.
#[derive(Debug, Clone)]
pub struct MacIdentity {
    mac: MacAddress,
}

impl MacIdentity {
    pub fn new(mac: MacAddress) -> Self {
        Self { mac }
    }
}

impl Identity for MacIdentity {
    fn short_id(&self) -> ShortId {
        ShortId::from_mac(&self.mac)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_id_uses_last_two_bytes() {
        let mac: MacAddress = "24:6f:28:a1:ab:cd".parse().unwrap();
        let id = MacIdentity::new(mac).short_id();
        assert_eq!(id.as_str(), "ABCD");
        assert_eq!(id.as_str().len(), ShortId::LEN);
    }

    #[test]
    fn short_id_zero_pads() {
        let id = ShortId::from_mac(&MacAddress([0, 0, 0, 0, 0x0A, 0x01]));
        assert_eq!(id.to_string(), "0A01");
    }

    #[test]
    fn rejects_short_mac() {
        assert!("24:6f:28".parse::<MacAddress>().is_err());
        assert!("zz:6f:28:a1:ab:cd".parse::<MacAddress>().is_err());
    }

    #[test]
    fn random_mac_is_local_unicast() {
        let mac = MacAddress::random();
        assert_eq!(mac.0[0] & 0x01, 0);
        assert_eq!(mac.0[0] & 0x02, 0x02);
    }

    #[test]
    fn display_round_trips() {
        let mac: MacAddress = "24-6F-28-A1-AB-CD".parse().unwrap();
        assert_eq!(mac.to_string(), "24:6F:28:A1:AB:CD");
        assert_eq!(mac.node_num(), 0x28A1ABCD);
    }
}
