//! Tokio host for one node.
//!
//! Plays the part of the firmware's cooperative scheduler: runs the periodic
//! task, sleeps for whatever delay it returns, hands inbound packets to the
//! receiver and logs a display frame on a fixed refresh.

use super::{CycleOutcome, FrameProvider, MessageReceiver, PeriodicTask, UplinkModule};
use crate::logutil::escape_log;
use crate::meshtastic::loopback::LoopbackReceiver;
use log::{debug, info, warn};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{sleep_until, Instant, MissedTickBehavior};

/// Why [`run_node`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostExit {
    Shutdown,
    Disabled,
    MeshClosed,
}

/// Drive `module` until shutdown is signalled, the scheduler disables itself,
/// or the mesh goes away. The first cycle runs immediately.
pub async fn run_node(
    mut module: UplinkModule,
    mut inbound: LoopbackReceiver,
    refresh: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> HostExit {
    let name = module.scheduler.name().to_string();
    let mut next_run = Instant::now();
    let mut display_tick = tokio::time::interval(refresh.max(Duration::from_millis(1)));
    display_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        if *shutdown.borrow() {
            break HostExit::Shutdown;
        }
        tokio::select! {
            _ = sleep_until(next_run) => {
                match module.scheduler.run_once() {
                    CycleOutcome::Disable => {
                        info!("{}: task disabled, host stopping", name);
                        break HostExit::Disabled;
                    }
                    outcome => {
                        let ms = outcome.delay_ms().unwrap_or_default();
                        debug!("{}: next run in {} ms", name, ms);
                        next_run = Instant::now() + Duration::from_millis(ms);
                    }
                }
            }
            packet = inbound.recv() => {
                match packet {
                    Some(p) => {
                        module.receiver.handle_received(&p);
                    }
                    None => {
                        warn!("{}: mesh closed", name);
                        break HostExit::MeshClosed;
                    }
                }
            }
            _ = display_tick.tick() => {
                let frame = module.display.render();
                info!("display: {}", escape_log(&frame.to_string()));
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    info!("{}: shutdown requested", name);
                    break HostExit::Shutdown;
                }
            }
        }
    }
}
