//! # Mesh Transport Seam
//!
//! The uplink module does not own the radio. It talks to the mesh through the
//! [`Transport`] trait (best-effort broadcast with a hop limit) and receives
//! [`MeshPacket`]s from whatever drives the radio.
//!
//! ## Ports
//!
//! Meshtastic multiplexes applications over port numbers. Telemetry travels
//! either on the text message port (so stock clients show it as chat) or on
//! the private application port. A receiver only looks at its own port:
//!
//! ```rust
//! use meshuplink::meshtastic::PortNum;
//!
//! assert_eq!(PortNum::TextMessage.as_u32(), 1);
//! assert_eq!(PortNum::from_u32(256), PortNum::PrivateApp);
//! ```
//!
//! ## Submodules
//!
//! - [`identity`] - short device ids derived from the hardware address
//! - [`loopback`] - in-process broadcast bus used by the simulator and tests

pub mod identity;
pub mod loopback;

use crate::errors::TransportError;
use serde::{Deserialize, Serialize};

/// Application port a packet is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortNum {
    #[serde(alias = "text")]
    TextMessage,
    #[serde(alias = "private")]
    PrivateApp,
    #[serde(skip)]
    Other(u32),
}

impl PortNum {
    pub const TEXT_MESSAGE_APP: u32 = 1;
    pub const PRIVATE_APP: u32 = 256;

    pub fn as_u32(self) -> u32 {
        match self {
            PortNum::TextMessage => Self::TEXT_MESSAGE_APP,
            PortNum::PrivateApp => Self::PRIVATE_APP,
            PortNum::Other(n) => n,
        }
    }

    pub fn from_u32(n: u32) -> Self {
        match n {
            Self::TEXT_MESSAGE_APP => PortNum::TextMessage,
            Self::PRIVATE_APP => PortNum::PrivateApp,
            other => PortNum::Other(other),
        }
    }
}

/// A decoded data packet as delivered by the mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshPacket {
    /// Transport node number of the sender.
    pub from: u32,
    pub port: PortNum,
    /// Remaining hops when the packet was handed to us.
    pub hop_limit: u8,
    pub payload: Vec<u8>,
}

/// Whether later handlers should still see a packet. Telemetry never
/// consumes a packet, so `Continue` is the only outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessMessage {
    Continue,
}

/// Outbound side of the mesh. Sends are fire-and-forget: `Ok` means the radio
/// accepted the packet, not that anyone heard it.
pub trait Transport: Send {
    fn broadcast(
        &mut self,
        port: PortNum,
        payload: &[u8],
        hop_limit: u8,
    ) -> Result<(), TransportError>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn broadcast(
        &mut self,
        port: PortNum,
        payload: &[u8],
        hop_limit: u8,
    ) -> Result<(), TransportError> {
        (**self).broadcast(port, payload, hop_limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_numbers_round_trip() {
        for port in [PortNum::TextMessage, PortNum::PrivateApp, PortNum::Other(67)] {
            assert_eq!(PortNum::from_u32(port.as_u32()), port);
        }
    }

    #[test]
    fn port_config_names() {
        #[derive(Deserialize)]
        struct Wrap {
            port: PortNum,
        }
        let w: Wrap = toml::from_str("port = \"private\"").unwrap();
        assert_eq!(w.port, PortNum::PrivateApp);
        let w: Wrap = toml::from_str("port = \"text_message\"").unwrap();
        assert_eq!(w.port, PortNum::TextMessage);
    }
}
