//! # Meshuplink - Periodic Sensor Telemetry for Meshtastic Networks
//!
//! Meshuplink samples a local sensor on a jittered schedule, broadcasts the
//! reading over a Meshtastic mesh, and keeps the latest reading heard from
//! every peer for a small status display.
//!
//! ## Features
//!
//! - **Jittered Scheduler**: Fixed-period sampling with work-time compensation, overrun recovery, and per-cycle random jitter so co-powered nodes do not collide.
//! - **Dual-Rate Mode**: Sample often, broadcast on a slower interval.
//! - **Wire Formats**: Flat or nested JSON, or a human-readable labeled text message that stock clients show as chat.
//! - **Tolerant Decoder**: Accepts any of the formats from peers, field by field; a missing field is absent, never an error.
//! - **Peer Cache**: Latest reading per transport sender with a bounded display view.
//! - **Sensor Backends**: Averaged ADC and SHT31 temperature/humidity, behind small driver traits.
//! - **Async Host**: Tokio host loop and an in-process loopback mesh for simulation and tests.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use meshuplink::uplink::decoder::PeerDecoder;
//!
//! let reading = PeerDecoder::default()
//!     .decode(b"{\"id\":\"ABCD\",\"temp\":21.5,\"hum\":40.0}")
//!     .unwrap();
//! assert_eq!(reading.node_id, "ABCD");
//! assert_eq!(reading.values.temperature, Some(21.5));
//! ```
//!
//! ## Module Organization
//!
//! - [`uplink`] - scheduler, encoder, decoder, peer cache, display and host loop
//! - [`sensor`] - sensor sources, driver traits and simulated drivers
//! - [`meshtastic`] - ports, packets, the transport seam and the loopback mesh
//! - [`config`] - configuration loading and validation
//! - [`errors`] - error types for each stage
//! - [`metrics`] - process-wide counters
//! - [`logutil`] - single-line escaping for radio payloads
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │   Host Loop     │ ← sleeps, dispatches, refreshes display
//! └─────────────────┘
//!          │
//! ┌─────────────────┐
//! │ Uplink Module   │ ← scheduler / receiver / display
//! └─────────────────┘
//!     │         │
//! ┌────────┐ ┌───────────┐
//! │ Sensor │ │ Transport │ ← hardware and radio seams
//! └────────┘ └───────────┘
//! ```

pub mod config;
pub mod errors;
pub mod logutil;
pub mod meshtastic;
pub mod metrics;
pub mod sensor;
pub mod uplink;
