//! The periodic sample / broadcast cycle.
//!
//! The host calls [`UplinkScheduler::run_once`] and sleeps for whatever delay
//! comes back. One cycle:
//!
//! 1. note the start time
//! 2. read the sensor; on failure return the short retry delay
//! 3. decide whether this cycle broadcasts (always, or once per interval)
//! 4. encode and hand the payload to the transport
//! 5. return `period - elapsed + jitter`, or `overrun + jitter` when the cycle
//!    took a full period or longer
//!
//! The jitter is drawn fresh every cycle so identical nodes powered on
//! together drift apart instead of transmitting in lockstep.
//!
//! Lifecycle: `Uninitialized -> Active` on the first cycle, or `-> Disabled`
//! if the peripheral is missing. `Disabled` is terminal.

use super::clock::Clock;
use super::encoder::UplinkEncoder;
use super::reading::Reading;
use super::{CycleOutcome, PeriodicTask};
use crate::config::UplinkConfig;
use crate::errors::{EncodeError, SensorError};
use crate::logutil::escape_log;
use crate::meshtastic::identity::{Identity, ShortId};
use crate::meshtastic::Transport;
use crate::metrics;
use crate::sensor::SensorSource;
use log::{debug, error, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Arc, Mutex};

/// Timing state carried between cycles.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScheduleState {
    pub is_first_run: bool,
    /// Clock time of the last accepted broadcast; `None` until the first one.
    pub last_broadcast_at: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Lifecycle {
    Uninitialized,
    Active { device_id: ShortId },
    Disabled,
}

/// Latest local sample, published for the display.
#[derive(Debug, Clone, Default)]
pub struct LocalStatus {
    pub reading: Option<Reading>,
    pub read_at_ms: u64,
    pub last_broadcast_at: Option<u64>,
}

pub type SharedLocalStatus = Arc<Mutex<LocalStatus>>;

/// Delay before the next cycle given how long this one took.
pub fn next_delay(period_ms: u64, elapsed_ms: u64, overrun_ms: u64, jitter_ms: u64) -> u64 {
    if elapsed_ms >= period_ms {
        overrun_ms + jitter_ms
    } else {
        period_ms - elapsed_ms + jitter_ms
    }
}

/// External collaborators the scheduler drives.
pub struct Peripherals {
    pub sensor: Box<dyn SensorSource>,
    pub identity: Box<dyn Identity>,
    pub transport: Box<dyn Transport>,
}

pub struct UplinkScheduler {
    cfg: UplinkConfig,
    encoder: UplinkEncoder,
    sensor: Box<dyn SensorSource>,
    identity: Box<dyn Identity>,
    transport: Box<dyn Transport>,
    clock: Arc<dyn Clock>,
    rng: StdRng,
    lifecycle: Lifecycle,
    schedule: ScheduleState,
    local: SharedLocalStatus,
}

impl UplinkScheduler {
    pub fn new(
        cfg: UplinkConfig,
        encoder: UplinkEncoder,
        peripherals: Peripherals,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            cfg,
            encoder,
            sensor: peripherals.sensor,
            identity: peripherals.identity,
            transport: peripherals.transport,
            clock,
            rng: StdRng::from_entropy(),
            lifecycle: Lifecycle::Uninitialized,
            schedule: ScheduleState {
                is_first_run: true,
                last_broadcast_at: None,
            },
            local: Arc::new(Mutex::new(LocalStatus::default())),
        }
    }

    /// Deterministic jitter, for tests and reproducible simulations.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    pub fn schedule(&self) -> &ScheduleState {
        &self.schedule
    }

    pub fn local_status(&self) -> SharedLocalStatus {
        Arc::clone(&self.local)
    }

    /// One-time setup. A missing peripheral disables the scheduler for good;
    /// any other init error is logged and left to the per-cycle retry.
    fn start(&mut self) {
        self.schedule.is_first_run = false;
        if let Err(e) = self.sensor.init() {
            if e.is_fatal() {
                error!("Uplink disabled: {}", e);
                self.lifecycle = Lifecycle::Disabled;
                return;
            }
            warn!("Sensor init reported {}; will retry on read", e);
        }
        let device_id = self.identity.short_id();
        info!("Uplink module started - reading from {}", self.sensor.describe());
        info!("Device ID: {}", device_id);
        self.lifecycle = Lifecycle::Active { device_id };
    }

    fn should_broadcast(&self, now: u64) -> bool {
        match (self.cfg.broadcast_interval_ms, self.schedule.last_broadcast_at) {
            (None, _) | (Some(_), None) => true,
            (Some(interval), Some(last)) => now.saturating_sub(last) >= interval,
        }
    }

    fn broadcast(&mut self, reading: &Reading, now: u64) {
        let payload = match self.encoder.encode(reading) {
            Ok(p) => p,
            Err(EncodeError::Overflow { len, max }) => {
                metrics::inc_encode_overflow();
                warn!("Encoded reading is {} bytes (limit {}), not sending", len, max);
                return;
            }
            Err(e) => {
                metrics::inc_encode_failed();
                warn!("Failed to encode reading: {}", e);
                return;
            }
        };
        match self
            .transport
            .broadcast(self.cfg.port, &payload, self.cfg.hop_limit)
        {
            Ok(()) => {
                self.schedule.last_broadcast_at = Some(now);
                metrics::inc_broadcast_sent();
                info!(
                    "Sent sensor data: {}",
                    escape_log(&String::from_utf8_lossy(&payload))
                );
            }
            Err(e) => {
                metrics::inc_broadcast_failed();
                warn!("Broadcast failed: {}", e);
            }
        }
    }

    fn retry(&self, e: &SensorError) -> CycleOutcome {
        metrics::inc_sensor_retry();
        warn!(
            "Sensor read failed ({}), retrying in {} ms",
            e, self.cfg.retry_delay_ms
        );
        CycleOutcome::Retry(self.cfg.retry_delay_ms)
    }
}

impl PeriodicTask for UplinkScheduler {
    fn run_once(&mut self) -> CycleOutcome {
        if self.schedule.is_first_run {
            self.start();
        }
        let device_id = match &self.lifecycle {
            Lifecycle::Active { device_id } => device_id.clone(),
            Lifecycle::Uninitialized | Lifecycle::Disabled => return CycleOutcome::Disable,
        };
        metrics::inc_cycle();

        let t0 = self.clock.now_ms();
        let values = match self.sensor.read() {
            Ok(v) if v.has_non_finite() => return self.retry(&SensorError::NotANumber),
            Ok(v) => v,
            Err(e) => return self.retry(&e),
        };
        let reading = Reading::new(device_id, values);
        let now = self.clock.now_ms();
        debug!("Sampled {:?}", reading.values());

        if self.should_broadcast(now) {
            self.broadcast(&reading, now);
        }

        if let Ok(mut local) = self.local.lock() {
            local.reading = Some(reading);
            local.read_at_ms = now;
            local.last_broadcast_at = self.schedule.last_broadcast_at;
        }

        let elapsed = self.clock.now_ms().saturating_sub(t0);
        let jitter = self.rng.gen_range(0..self.cfg.jitter_ms.max(1));
        CycleOutcome::Sleep(next_delay(
            self.cfg.period_ms,
            elapsed,
            self.cfg.overrun_delay_ms,
            jitter,
        ))
    }

    fn name(&self) -> &str {
        "uplink"
    }
}
