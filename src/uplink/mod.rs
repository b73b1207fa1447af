//! # Sensor Uplink Module
//!
//! Periodically samples a local sensor, broadcasts the reading over the mesh,
//! and keeps the latest reading from every peer for the status display.
//!
//! The module is a composition of three capabilities, each a trait the host
//! drives independently:
//!
//! - [`PeriodicTask`] - [`scheduler::UplinkScheduler`], the sample/broadcast cycle
//! - [`MessageReceiver`] - [`receiver::PeerReceiver`], inbound decode into the cache
//! - [`FrameProvider`] - [`display::StatusDisplay`], a text frame of local and peer values
//!
//! [`UplinkModule`] wires them together from a [`Config`]; [`host::run_node`]
//! is a tokio host loop that drives a module against a loopback mesh.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use meshuplink::config::Config;
//! use meshuplink::meshtastic::identity::{MacAddress, MacIdentity};
//! use meshuplink::meshtastic::loopback::LoopbackMesh;
//! use meshuplink::sensor::simulated_from_config;
//! use meshuplink::uplink::clock::MonotonicClock;
//! use meshuplink::uplink::scheduler::Peripherals;
//! use meshuplink::uplink::UplinkModule;
//!
//! let config = Config::default();
//! let mac = MacAddress::random();
//! let mesh = LoopbackMesh::new(64, config.uplink.max_payload);
//! let (transport, _inbound) = mesh.attach(mac.node_num());
//! let module = UplinkModule::new(
//!     &config,
//!     Peripherals {
//!         sensor: simulated_from_config(&config.sensor, 1),
//!         identity: Box::new(MacIdentity::new(mac)),
//!         transport: Box::new(transport),
//!     },
//!     Arc::new(MonotonicClock::new()),
//! );
//! ```

pub mod cache;
pub mod clock;
pub mod decoder;
pub mod display;
pub mod encoder;
pub mod host;
pub mod reading;
pub mod receiver;
pub mod scheduler;

use crate::config::Config;
use crate::meshtastic::{MeshPacket, PortNum, ProcessMessage};
use cache::{PeerCache, SharedPeerCache};
use clock::Clock;
use decoder::{PeerDecoder, DEFAULT_ID_CAPACITY};
use display::{Frame, StatusDisplay};
use encoder::UplinkEncoder;
use receiver::PeerReceiver;
use scheduler::{Peripherals, SharedLocalStatus, UplinkScheduler};
use std::sync::Arc;

/// What the host should do after one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Normal cycle; run again after this many milliseconds.
    Sleep(u64),
    /// Sensor read failed; try again soon.
    Retry(u64),
    /// Stop scheduling this task for good.
    Disable,
}

impl CycleOutcome {
    pub fn delay_ms(&self) -> Option<u64> {
        match *self {
            CycleOutcome::Sleep(ms) | CycleOutcome::Retry(ms) => Some(ms),
            CycleOutcome::Disable => None,
        }
    }
}

/// Something the host runs repeatedly, sleeping between runs.
pub trait PeriodicTask: Send {
    fn run_once(&mut self) -> CycleOutcome;

    fn name(&self) -> &str;
}

/// Inbound packet handler.
pub trait MessageReceiver: Send {
    fn wants_port(&self, port: PortNum) -> bool;

    fn handle_received(&mut self, packet: &MeshPacket) -> ProcessMessage;
}

/// Source of display frames.
pub trait FrameProvider: Send {
    fn render(&self) -> Frame;
}

/// One node's uplink: scheduler, receiver and display sharing a cache and a clock.
pub struct UplinkModule {
    pub scheduler: UplinkScheduler,
    pub receiver: PeerReceiver,
    pub display: StatusDisplay,
    peers: SharedPeerCache,
    local: SharedLocalStatus,
}

impl UplinkModule {
    pub fn new(config: &Config, peripherals: Peripherals, clock: Arc<dyn Clock>) -> Self {
        let encoder = UplinkEncoder::new(config.encoding.format, config.uplink.max_payload);
        let scheduler = UplinkScheduler::new(
            config.uplink.clone(),
            encoder,
            peripherals,
            Arc::clone(&clock),
        );
        let local = scheduler.local_status();
        let peers = PeerCache::shared();
        let receiver = PeerReceiver::new(
            config.uplink.port,
            PeerDecoder::new(config.uplink.max_payload, DEFAULT_ID_CAPACITY),
            Arc::clone(&peers),
            Arc::clone(&clock),
        );
        let display = StatusDisplay::new(
            Arc::clone(&local),
            Arc::clone(&peers),
            clock,
            config.display.max_peers,
        );
        Self {
            scheduler,
            receiver,
            display,
            peers,
            local,
        }
    }

    /// Seed the scheduler's jitter source.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.scheduler = self.scheduler.with_seed(seed);
        self
    }

    pub fn peers(&self) -> SharedPeerCache {
        Arc::clone(&self.peers)
    }

    pub fn local_status(&self) -> SharedLocalStatus {
        Arc::clone(&self.local)
    }
}
