//! Inbound path: mesh packet -> decoded peer reading -> cache.

use super::cache::SharedPeerCache;
use super::clock::Clock;
use super::decoder::PeerDecoder;
use super::MessageReceiver;
use crate::errors::DecodeError;
use crate::logutil::{escape_payload, format_node_id};
use crate::meshtastic::{MeshPacket, PortNum, ProcessMessage};
use crate::metrics;
use log::{debug, info, warn};
use std::sync::Arc;

/// Longest payload echoed into the log.
const LOG_PAYLOAD_BYTES: usize = 120;

pub struct PeerReceiver {
    port: PortNum,
    decoder: PeerDecoder,
    cache: SharedPeerCache,
    clock: Arc<dyn Clock>,
}

impl PeerReceiver {
    pub fn new(
        port: PortNum,
        decoder: PeerDecoder,
        cache: SharedPeerCache,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            port,
            decoder,
            cache,
            clock,
        }
    }

    pub fn cache(&self) -> SharedPeerCache {
        Arc::clone(&self.cache)
    }
}

impl MessageReceiver for PeerReceiver {
    fn wants_port(&self, port: PortNum) -> bool {
        port == self.port
    }

    /// Never consumes the packet; other handlers may want it too.
    fn handle_received(&mut self, packet: &MeshPacket) -> ProcessMessage {
        if !self.wants_port(packet.port) {
            metrics::inc_inbound_ignored();
            return ProcessMessage::Continue;
        }
        let sender = format_node_id(packet.from);
        info!(
            "Received sensor data from {}: {}",
            sender,
            escape_payload(&packet.payload, LOG_PAYLOAD_BYTES)
        );

        match self.decoder.decode(&packet.payload) {
            Ok(reading) => {
                let now = self.clock.now_ms();
                match self.cache.lock() {
                    Ok(mut cache) => {
                        cache.upsert(packet.from, reading, now);
                        metrics::inc_inbound_accepted();
                    }
                    Err(_) => warn!("Peer cache lock poisoned; dropping reading from {}", sender),
                }
            }
            Err(DecodeError::Oversized { len, max }) => {
                metrics::inc_inbound_oversized();
                warn!(
                    "Sensor payload from {} is {} bytes (parse limit {}), ignored",
                    sender, len, max
                );
            }
            Err(e) => {
                metrics::inc_inbound_dropped();
                debug!("Dropping payload from {}: {}", sender, e);
            }
        }
        ProcessMessage::Continue
    }
}
