//! Node configuration and protocol constants.

use std::time::Duration;

use thiserror::Error;

/// Base port for peer-facing listeners; peer `id` listens on
/// `BASE_PORT + id`.
pub const BASE_PORT: u16 = 20000;

/// Interval between heartbeat broadcasts.
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_millis(200);

/// Maximum age of the last timestamp received from a peer for it to be
/// reported alive. Strictly greater than [`HEARTBEAT_INTERVAL`] so a single
/// missed heartbeat does not mark a peer dead.
pub const ALIVE_WINDOW: Duration = Duration::from_millis(250);

/// Bound on connecting to a peer during broadcast fan-out.
pub const DIAL_TIMEOUT: Duration = Duration::from_secs(1);

/// Bound on reading a single message or command line from a socket.
pub const READ_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid number of servers: {0}")]
    InvalidPeerCount(usize),

    #[error("server id {id} out of range for {peers} servers")]
    IdOutOfRange { id: usize, peers: usize },

    #[error("peer ports starting at {base_port} for {peers} servers exceed the port range")]
    PortRangeOverflow { base_port: u16, peers: usize },

    #[error("missing required argument: {0}")]
    MissingArgument(&'static str),
}

/// Configuration for one peer server.
///
/// A system of `peers` servers is assumed to have ids `{0..peers-1}` and
/// peer-facing ports `{base_port..base_port+peers-1}`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeConfig {
    /// Id of this server, in `{0..peers-1}`.
    pub id: usize,
    /// Total number of servers in the system.
    pub peers: usize,
    /// Port the master process uses to issue commands.
    pub master_port: u16,
    /// First peer-facing port of the system.
    pub base_port: u16,
    pub heartbeat_interval: Duration,
    pub alive_window: Duration,
    pub dial_timeout: Duration,
    pub read_timeout: Duration,
}

impl NodeConfig {
    /// Builds a config with protocol defaults, validating the id/count
    /// combination.
    pub fn new(id: usize, peers: usize, master_port: u16) -> Result<Self, ConfigError> {
        let config = Self {
            id,
            peers,
            master_port,
            base_port: BASE_PORT,
            heartbeat_interval: HEARTBEAT_INTERVAL,
            alive_window: ALIVE_WINDOW,
            dial_timeout: DIAL_TIMEOUT,
            read_timeout: READ_TIMEOUT,
        };
        config.validate()?;
        Ok(config)
    }

    /// Re-checks the id/count/port invariants, for configs assembled by
    /// hand (tests override `base_port` to run disjoint systems).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.peers == 0 {
            return Err(ConfigError::InvalidPeerCount(self.peers));
        }
        if self.id >= self.peers {
            return Err(ConfigError::IdOutOfRange {
                id: self.id,
                peers: self.peers,
            });
        }
        let in_range = u16::try_from(self.peers - 1)
            .ok()
            .and_then(|offset| self.base_port.checked_add(offset))
            .is_some();
        if !in_range {
            return Err(ConfigError::PortRangeOverflow {
                base_port: self.base_port,
                peers: self.peers,
            });
        }
        Ok(())
    }

    /// Peer-facing port of server `id`.
    pub fn peer_port(&self, id: usize) -> u16 {
        self.base_port + id as u16
    }

    /// This server's own peer-facing port.
    pub fn port(&self) -> u16 {
        self.peer_port(self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_applied() {
        let config = NodeConfig::new(1, 3, 30000).unwrap();
        assert_eq!(config.base_port, 20000);
        assert_eq!(config.port(), 20001);
        assert_eq!(config.peer_port(2), 20002);
        assert!(config.alive_window > config.heartbeat_interval);
    }

    #[test]
    fn zero_peers_is_invalid() {
        assert_eq!(
            NodeConfig::new(0, 0, 30000),
            Err(ConfigError::InvalidPeerCount(0))
        );
    }

    #[test]
    fn id_must_be_below_peer_count() {
        assert_eq!(
            NodeConfig::new(3, 3, 30000),
            Err(ConfigError::IdOutOfRange { id: 3, peers: 3 })
        );
    }

    #[test]
    fn peer_ports_must_fit_the_port_range() {
        let mut config = NodeConfig::new(0, 1, 30000).unwrap();
        config.base_port = u16::MAX - 1;
        config.peers = 3;
        assert_eq!(
            config.validate(),
            Err(ConfigError::PortRangeOverflow {
                base_port: u16::MAX - 1,
                peers: 3,
            })
        );
    }
}
