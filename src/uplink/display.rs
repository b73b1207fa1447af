//! Text frame for a small status screen: the local reading and when it was
//! last sent, followed by a bounded list of peers.

use super::cache::{PeerEntry, SharedPeerCache};
use super::clock::Clock;
use super::reading::Measurement;
use super::scheduler::SharedLocalStatus;
use super::FrameProvider;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    pub lines: Vec<String>,
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.lines.join("\n"))
    }
}

fn describe_local(m: &Measurement) -> String {
    match m {
        Measurement::Adc(s) => format!("{:.2}V raw {}", s.volts, s.raw),
        Measurement::Climate(s) => format!("{:.1}°C {:.1}%", s.temperature, s.humidity),
    }
}

fn describe_peer(entry: &PeerEntry, now_ms: u64) -> String {
    let v = &entry.values;
    let body = match (v.temperature, v.voltage) {
        (Some(t), _) => match v.humidity {
            Some(h) => format!("{:.1}°C {:.0}%", t, h),
            None => format!("{:.1}°C", t),
        },
        (None, Some(volts)) => format!("{:.2}V", volts),
        (None, None) => "-".to_string(),
    };
    format!("{} {} {}s ago", entry.node_id, body, entry.age_secs(now_ms))
}

pub struct StatusDisplay {
    local: SharedLocalStatus,
    peers: SharedPeerCache,
    clock: Arc<dyn Clock>,
    max_peers: usize,
}

impl StatusDisplay {
    pub fn new(
        local: SharedLocalStatus,
        peers: SharedPeerCache,
        clock: Arc<dyn Clock>,
        max_peers: usize,
    ) -> Self {
        Self {
            local,
            peers,
            clock,
            max_peers,
        }
    }
}

impl FrameProvider for StatusDisplay {
    fn render(&self) -> Frame {
        let now = self.clock.now_ms();
        let mut lines = Vec::new();

        match self.local.lock() {
            Ok(local) => match &local.reading {
                Some(r) => {
                    lines.push(format!(
                        "{} {} ({}s ago)",
                        r.device_id(),
                        describe_local(r.values()),
                        now.saturating_sub(local.read_at_ms) / 1000
                    ));
                    lines.push(match local.last_broadcast_at {
                        Some(at) => format!("Sent {}s ago", now.saturating_sub(at) / 1000),
                        None => "Not sent yet".to_string(),
                    });
                }
                None => lines.push("Waiting for sensor...".to_string()),
            },
            Err(_) => lines.push("Local status unavailable".to_string()),
        }

        if let Ok(peers) = self.peers.lock() {
            let snap = peers.snapshot_for_display(self.max_peers);
            lines.push(format!("Peers: {}", peers.len()));
            lines.extend(snap.entries.iter().map(|e| describe_peer(e, now)));
            if snap.hidden > 0 {
                lines.push(format!("+{} more", snap.hidden));
            }
        }
        Frame { lines }
    }
}
