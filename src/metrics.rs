//! Process-wide uplink counters.
//! Plain relaxed atomics; read them with [`snapshot`] for logging or tests.
use std::sync::atomic::{AtomicU64, Ordering};

static CYCLES: AtomicU64 = AtomicU64::new(0);
static BROADCAST_SENT: AtomicU64 = AtomicU64::new(0);
static BROADCAST_FAILED: AtomicU64 = AtomicU64::new(0);
static ENCODE_OVERFLOW: AtomicU64 = AtomicU64::new(0);
static ENCODE_FAILED: AtomicU64 = AtomicU64::new(0);
static SENSOR_RETRIES: AtomicU64 = AtomicU64::new(0);
static INBOUND_ACCEPTED: AtomicU64 = AtomicU64::new(0);
static INBOUND_DROPPED: AtomicU64 = AtomicU64::new(0);
static INBOUND_OVERSIZED: AtomicU64 = AtomicU64::new(0);
static INBOUND_IGNORED: AtomicU64 = AtomicU64::new(0);

pub fn inc_cycle() {
    CYCLES.fetch_add(1, Ordering::Relaxed);
}
pub fn inc_broadcast_sent() {
    BROADCAST_SENT.fetch_add(1, Ordering::Relaxed);
}
pub fn inc_broadcast_failed() {
    BROADCAST_FAILED.fetch_add(1, Ordering::Relaxed);
}
pub fn inc_encode_overflow() {
    ENCODE_OVERFLOW.fetch_add(1, Ordering::Relaxed);
}
/// Serialization errors other than the payload bound.
pub fn inc_encode_failed() {
    ENCODE_FAILED.fetch_add(1, Ordering::Relaxed);
}
pub fn inc_sensor_retry() {
    SENSOR_RETRIES.fetch_add(1, Ordering::Relaxed);
}
pub fn inc_inbound_accepted() {
    INBOUND_ACCEPTED.fetch_add(1, Ordering::Relaxed);
}
/// Decoded but rejected (no id, no primary value).
pub fn inc_inbound_dropped() {
    INBOUND_DROPPED.fetch_add(1, Ordering::Relaxed);
}
pub fn inc_inbound_oversized() {
    INBOUND_OVERSIZED.fetch_add(1, Ordering::Relaxed);
}
/// Packets on a port the uplink does not listen on.
pub fn inc_inbound_ignored() {
    INBOUND_IGNORED.fetch_add(1, Ordering::Relaxed);
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    pub cycles: u64,
    pub broadcast_sent: u64,
    pub broadcast_failed: u64,
    pub encode_overflow: u64,
    pub encode_failed: u64,
    pub sensor_retries: u64,
    pub inbound_accepted: u64,
    pub inbound_dropped: u64,
    pub inbound_oversized: u64,
    pub inbound_ignored: u64,
}

pub fn snapshot() -> Snapshot {
    Snapshot {
        cycles: CYCLES.load(Ordering::Relaxed),
        broadcast_sent: BROADCAST_SENT.load(Ordering::Relaxed),
        broadcast_failed: BROADCAST_FAILED.load(Ordering::Relaxed),
        encode_overflow: ENCODE_OVERFLOW.load(Ordering::Relaxed),
        encode_failed: ENCODE_FAILED.load(Ordering::Relaxed),
        sensor_retries: SENSOR_RETRIES.load(Ordering::Relaxed),
        inbound_accepted: INBOUND_ACCEPTED.load(Ordering::Relaxed),
        inbound_dropped: INBOUND_DROPPED.load(Ordering::Relaxed),
        inbound_oversized: INBOUND_OVERSIZED.load(Ordering::Relaxed),
        inbound_ignored: INBOUND_IGNORED.load(Ordering::Relaxed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Counters are global and other tests run in parallel, so only check
    // that they move forward.
    #[test]
    fn counters_are_monotonic() {
        let before = snapshot();
        inc_cycle();
        inc_inbound_ignored();
        inc_encode_overflow();
        inc_encode_failed();
        let after = snapshot();
        assert!(after.cycles > before.cycles);
        assert!(after.inbound_ignored > before.inbound_ignored);
        assert!(after.encode_overflow > before.encode_overflow);
        assert!(after.encode_failed > before.encode_failed);
        assert!(after.broadcast_sent >= before.broadcast_sent);
    }
}
