//! Broadcast fan-out to every peer.

use std::io::Write;
use std::net::{SocketAddr, TcpStream};
use std::sync::Arc;

use crate::config::NodeConfig;

use super::log::MessageLog;
use super::wire::{self, PeerMessage};

/// Sends messages to every other server in the system, appending non-empty
/// messages to the local log directly.
///
/// Sends are sequential: `broadcast` returns once an attempt has been made
/// for every peer. Content broadcasts must not overlap each other or FIFO
/// receipt at the recipients is lost; the master dialogue guarantees this by
/// serving one controller connection at a time.
#[derive(Debug)]
pub struct Broadcaster {
    config: NodeConfig,
    log: Arc<MessageLog>,
}

impl Broadcaster {
    pub fn new(config: NodeConfig, log: Arc<MessageLog>) -> Self {
        Self { config, log }
    }

    /// Broadcasts `msg` to every server, self included.
    ///
    /// The self copy skips the network: non-empty content is appended to the
    /// log before any peer send is attempted. A peer that cannot be dialed
    /// or written is skipped; failure detection is the heartbeat's job, not
    /// the send path's.
    pub fn broadcast(&self, msg: &PeerMessage) {
        let line = match wire::encode_line(msg) {
            Ok(line) => line,
            Err(err) => {
                tracing::error!("failed to encode broadcast: {err}");
                return;
            }
        };

        if !msg.is_heartbeat() {
            self.log.append(msg.clone());
        }

        for id in 0..self.config.peers {
            if id == self.config.id {
                continue;
            }
            self.send_to(id, &line);
        }
    }

    fn send_to(&self, id: usize, line: &str) {
        let addr = SocketAddr::from(([127, 0, 0, 1], self.config.peer_port(id)));
        let mut stream = match TcpStream::connect_timeout(&addr, self.config.dial_timeout) {
            Ok(stream) => stream,
            Err(err) => {
                tracing::debug!(peer = id, "broadcast dial failed: {err}");
                return;
            }
        };
        if let Err(err) = stream.write_all(line.as_bytes()) {
            tracing::debug!(peer = id, "broadcast write failed: {err}");
        }
    }
}
