#![forbid(unsafe_code)]

//! FIFO-consistent chatroom peers with failure detection, plus the
//! logical/vector clock library that lets a monitor reconstruct causal order
//! from the messages the peers exchange.

pub mod causal;
pub mod cli;
pub mod clock;
pub mod config;
pub mod error;
pub mod server;
pub mod telemetry;

pub use error::Error;
pub type Result<T> = std::result::Result<T, Error>;

// Re-export the working set at the crate root for convenience
pub use crate::causal::{Message, MessageReceptacle, ReceptacleError, Violation};
pub use crate::clock::{ClockError, LogicalClock, Timestamp, VectorClock, MAX_BASE};
pub use crate::config::{NodeConfig, ALIVE_WINDOW, BASE_PORT, HEARTBEAT_INTERVAL};
pub use crate::server::{Node, NodeError, NodeHandle, PeerMessage};
