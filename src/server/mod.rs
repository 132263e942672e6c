//! Peer server runtime.
//!
//! A [`Node`] is one participant in a FIFO-consistent chatroom: it keeps a
//! log of every non-empty message it has received, broadcasts on command,
//! and tracks which peers are alive from the timestamps they send.
//!
//! `server <id> <n> <master_port>` runs a node with id `id` listening for
//! peer messages on port `20000 + id` and for master commands on
//! `master_port`. The master protocol is newline-delimited:
//!
//! ```text
//! get              -> messages <msg1>,<msg2>,...\n
//! alive            -> alive <id1>,<id2>,...\n
//! broadcast <m>    -> (no response; <m> is sent to everyone, sender included)
//! ```
//!
//! A running node can be driven with netcat:
//!
//! ```text
//! $ server 0 1 30000 &
//! $ nc localhost 30000
//! get
//! messages
//! broadcast hello world
//! get
//! messages hello world
//! alive
//! alive 0
//! ```

mod broadcast;
mod heartbeat;
mod liveness;
mod log;
mod master;
mod wire;

use std::io::ErrorKind;
use std::net::{Ipv4Addr, SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{bounded, Sender};
use thiserror::Error;

use crate::config::{ConfigError, NodeConfig};

pub use broadcast::Broadcaster;
pub use liveness::LivenessTable;
pub use log::MessageLog;
pub use wire::{LineReader, PeerMessage, WireError};

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("failed to bind {role} port {port}: {source}")]
    Bind {
        role: &'static str,
        port: u16,
        source: std::io::Error,
    },
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Shared state of a running node: the config plus the two mutex-guarded
/// tables every duty reads or writes.
#[derive(Clone)]
pub(crate) struct NodeState {
    pub config: NodeConfig,
    pub log: Arc<MessageLog>,
    pub liveness: Arc<LivenessTable>,
    pub broadcaster: Arc<Broadcaster>,
}

/// One peer server.
pub struct Node {
    config: NodeConfig,
}

impl Node {
    pub fn new(config: NodeConfig) -> Self {
        Self { config }
    }

    /// Binds both listeners and starts the serving threads: the master
    /// dialogue, the sequential peer-receive loop, and the heartbeat.
    ///
    /// Both ports are bound before the first heartbeat can fire, and the
    /// heartbeat itself waits one interval, so peers that start
    /// near-simultaneously can bind before seeing traffic.
    pub fn start(self) -> Result<NodeHandle, NodeError> {
        self.config.validate()?;
        let config = self.config;

        let master_listener = bind(config.master_port, "master-facing")?;
        let peer_listener = bind(config.port(), "server-facing")?;
        tracing::info!(
            id = config.id,
            peer_port = config.port(),
            master_port = config.master_port,
            "server listening"
        );

        let log = Arc::new(MessageLog::new());
        let liveness = Arc::new(LivenessTable::new(config.peers));
        let broadcaster = Arc::new(Broadcaster::new(config.clone(), Arc::clone(&log)));
        let state = NodeState {
            config: config.clone(),
            log,
            liveness,
            broadcaster: Arc::clone(&broadcaster),
        };

        let shutdown = Arc::new(AtomicBool::new(false));
        let (heartbeat_tx, heartbeat_rx) = bounded::<()>(1);

        let mut joins = Vec::new();
        {
            let state = state.clone();
            let shutdown = Arc::clone(&shutdown);
            joins.push(thread::spawn(move || {
                master::run_master_loop(master_listener, state, shutdown);
            }));
        }
        {
            let state = state.clone();
            let shutdown = Arc::clone(&shutdown);
            joins.push(thread::spawn(move || {
                run_fetch_loop(peer_listener, state, shutdown);
            }));
        }
        {
            let config = config.clone();
            joins.push(thread::spawn(move || {
                heartbeat::run_heartbeat_loop(&config, broadcaster, heartbeat_rx);
            }));
        }

        Ok(NodeHandle {
            shutdown,
            heartbeat_tx: Some(heartbeat_tx),
            joins,
            config,
        })
    }
}

/// Handle on a running node's threads.
pub struct NodeHandle {
    shutdown: Arc<AtomicBool>,
    heartbeat_tx: Option<Sender<()>>,
    joins: Vec<JoinHandle<()>>,
    config: NodeConfig,
}

impl NodeHandle {
    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// Stops every serving thread and waits for them to exit.
    pub fn shutdown(mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        let _ = self.heartbeat_tx.take();
        for join in self.joins.drain(..) {
            let _ = join.join();
        }
    }

    /// Blocks until the serving threads exit, which in normal operation is
    /// never; process termination is the shutdown path for a deployed node.
    pub fn wait(mut self) {
        for join in self.joins.drain(..) {
            let _ = join.join();
        }
    }
}

fn bind(port: u16, role: &'static str) -> Result<TcpListener, NodeError> {
    let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, port));
    let listener = TcpListener::bind(addr).map_err(|source| NodeError::Bind {
        role,
        port,
        source,
    })?;
    listener
        .set_nonblocking(true)
        .map_err(|source| NodeError::Bind { role, port, source })?;
    Ok(listener)
}

/// Retrieves messages from other servers and records them.
///
/// Connections are handled to completion one at a time: fanning receipt out
/// to threads would let scheduling reorder appends and destroy FIFO between
/// successive accepts. The cost is that a stalled sender delays every later
/// receive, bounded by the read timeout.
fn run_fetch_loop(listener: TcpListener, state: NodeState, shutdown: Arc<AtomicBool>) {
    loop {
        if shutdown.load(Ordering::Relaxed) {
            break;
        }

        match listener.accept() {
            Ok((stream, _)) => {
                if let Err(err) = handle_peer(stream, &state) {
                    tracing::debug!("skipping peer connection: {err}");
                }
            }
            Err(err) if err.kind() == ErrorKind::WouldBlock => {
                thread::sleep(Duration::from_millis(25));
            }
            Err(err) => {
                tracing::warn!("peer accept error: {err}");
                thread::sleep(Duration::from_millis(25));
            }
        }
    }
}

/// Reads the one message a peer connection carries, updates the liveness
/// table, and appends non-empty content to the log.
fn handle_peer(stream: TcpStream, state: &NodeState) -> Result<(), WireError> {
    stream.set_nonblocking(false)?;
    stream.set_read_timeout(Some(state.config.read_timeout))?;

    let mut reader = LineReader::new(stream);
    let Some(msg) = reader.read_next()? else {
        return Ok(());
    };

    state.liveness.record(msg.id, msg.rts);
    if !msg.is_heartbeat() {
        state.log.append(msg);
    }
    Ok(())
}
