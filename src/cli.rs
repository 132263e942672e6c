//! CLI surface for the peer server.
//!
//! Arguments may be given positionally (`server 0 3 30000`) or by flag
//! (`server --id 0 -n 3 --port 30000`); flags win when both are present.

use std::ffi::OsString;

use clap::{ArgAction, Parser};

use crate::config::{ConfigError, NodeConfig};

#[derive(Parser, Debug)]
#[command(
    name = "server",
    version,
    about = "FIFO-consistent chatroom peer with failure detection"
)]
pub struct Cli {
    /// Id of the server {0, ..., n-1}.
    #[arg(long, value_name = "ID")]
    id: Option<usize>,

    /// Total number of servers.
    #[arg(short, long, value_name = "N")]
    n: Option<usize>,

    /// Number of the master-facing port.
    #[arg(long, value_name = "PORT")]
    port: Option<u16>,

    /// Debug output (repeat for more).
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[arg(value_name = "ID")]
    arg_id: Option<usize>,

    #[arg(value_name = "N")]
    arg_n: Option<usize>,

    #[arg(value_name = "MASTER_PORT")]
    arg_port: Option<u16>,
}

/// Parses arguments, exiting 0 for help/version output and 1 for malformed
/// arguments.
pub fn parse_from<I, T>(args: I) -> Cli
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            std::process::exit(if err.use_stderr() { 1 } else { 0 });
        }
    }
}

impl Cli {
    /// Resolves flags and positionals into a validated [`NodeConfig`].
    pub fn resolve(&self) -> Result<NodeConfig, ConfigError> {
        let id = self
            .id
            .or(self.arg_id)
            .ok_or(ConfigError::MissingArgument("id"))?;
        let n = self
            .n
            .or(self.arg_n)
            .ok_or(ConfigError::MissingArgument("n"))?;
        let port = self
            .port
            .or(self.arg_port)
            .ok_or(ConfigError::MissingArgument("port"))?;
        NodeConfig::new(id, n, port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positional_arguments() {
        let cli = parse_from(["server", "1", "3", "30000"]);
        let config = cli.resolve().unwrap();
        assert_eq!(config.id, 1);
        assert_eq!(config.peers, 3);
        assert_eq!(config.master_port, 30000);
    }

    #[test]
    fn flag_arguments() {
        let cli = parse_from(["server", "--id", "2", "-n", "4", "--port", "30002"]);
        let config = cli.resolve().unwrap();
        assert_eq!(config.id, 2);
        assert_eq!(config.peers, 4);
        assert_eq!(config.master_port, 30002);
    }

    #[test]
    fn flags_override_positionals() {
        let cli = parse_from(["server", "--id", "2", "0", "3", "30000"]);
        let config = cli.resolve().unwrap();
        assert_eq!(config.id, 2);
        assert_eq!(config.peers, 3);
    }

    #[test]
    fn missing_arguments_are_reported() {
        let cli = parse_from(["server", "0", "3"]);
        assert_eq!(
            cli.resolve(),
            Err(ConfigError::MissingArgument("port"))
        );
    }

    #[test]
    fn invalid_peer_count_is_fatal() {
        let cli = parse_from(["server", "0", "0", "30000"]);
        assert_eq!(cli.resolve(), Err(ConfigError::InvalidPeerCount(0)));
    }
}
