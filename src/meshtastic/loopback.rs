//! In-process broadcast mesh.
//!
//! Every attached node hears every other node's packets (a single-hop mesh
//! with no loss). Used by `meshuplink start --nodes N` and the integration
//! tests; a real deployment plugs a radio driver in behind [`Transport`].

use super::{MeshPacket, PortNum, Transport};
use crate::errors::TransportError;
use log::{trace, warn};
use tokio::sync::broadcast;

/// Shared bus all loopback nodes attach to.
#[derive(Debug, Clone)]
pub struct LoopbackMesh {
    tx: broadcast::Sender<MeshPacket>,
    max_payload: usize,
}

impl LoopbackMesh {
    pub fn new(capacity: usize, max_payload: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx, max_payload }
    }

    /// Attach a node; returns its sending half and its receiving half.
    pub fn attach(&self, node_num: u32) -> (LoopbackTransport, LoopbackReceiver) {
        (
            LoopbackTransport {
                node_num,
                tx: self.tx.clone(),
                max_payload: self.max_payload,
            },
            LoopbackReceiver {
                node_num,
                rx: self.tx.subscribe(),
            },
        )
    }
}

pub struct LoopbackTransport {
    node_num: u32,
    tx: broadcast::Sender<MeshPacket>,
    max_payload: usize,
}

impl Transport for LoopbackTransport {
    fn broadcast(
        &mut self,
        port: PortNum,
        payload: &[u8],
        hop_limit: u8,
    ) -> Result<(), TransportError> {
        if payload.len() > self.max_payload {
            return Err(TransportError::PayloadTooLarge {
                len: payload.len(),
                max: self.max_payload,
            });
        }
        let packet = MeshPacket {
            from: self.node_num,
            port,
            hop_limit,
            payload: payload.to_vec(),
        };
        // No subscribers is not an error for a broadcast.
        match self.tx.send(packet) {
            Ok(n) => trace!("loopback: {:08X} reached {} receivers", self.node_num, n),
            Err(_) => trace!("loopback: {:08X} broadcast with nobody listening", self.node_num),
        }
        Ok(())
    }
}

pub struct LoopbackReceiver {
    node_num: u32,
    rx: broadcast::Receiver<MeshPacket>,
}

impl LoopbackReceiver {
    /// Next packet from another node. `None` once the mesh is gone.
    pub async fn recv(&mut self) -> Option<MeshPacket> {
        loop {
            match self.rx.recv().await {
                Ok(packet) if packet.from == self.node_num => continue,
                Ok(packet) => return Some(packet),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(
                        "loopback: node {:08X} lagged, {} packets dropped",
                        self.node_num, skipped
                    );
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
