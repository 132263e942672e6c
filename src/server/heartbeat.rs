//! Periodic empty broadcasts announcing this server is alive.

use std::sync::Arc;

use crossbeam::channel::{tick, Receiver};

use crate::config::NodeConfig;

use super::broadcast::Broadcaster;
use super::wire::PeerMessage;

/// Broadcasts an empty message every `heartbeat_interval` until `shutdown`
/// is signalled or dropped.
///
/// The first beat fires one interval after startup, which gives peers
/// started near-simultaneously time to bind before seeing traffic.
pub(super) fn run_heartbeat_loop(
    config: &NodeConfig,
    broadcaster: Arc<Broadcaster>,
    shutdown: Receiver<()>,
) {
    let ticks = tick(config.heartbeat_interval);
    loop {
        crossbeam::select! {
            recv(ticks) -> _ => {
                broadcaster.broadcast(&PeerMessage::heartbeat(config.id));
            }
            recv(shutdown) -> _ => break,
        }
    }
}
