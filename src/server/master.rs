//! Master (controller) dialogue.

use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use time::OffsetDateTime;

use super::wire::PeerMessage;
use super::NodeState;

const BROADCAST_PREFIX: &str = "broadcast ";

/// Accepts master connections and serves their commands, one connection at
/// a time.
pub(super) fn run_master_loop(
    listener: TcpListener,
    state: NodeState,
    shutdown: Arc<AtomicBool>,
) {
    loop {
        if shutdown.load(Ordering::Relaxed) {
            break;
        }

        match listener.accept() {
            Ok((stream, _)) => {
                if let Err(err) = handle_master(stream, &state, &shutdown) {
                    tracing::debug!("master dialogue ended: {err}");
                }
            }
            Err(err) if err.kind() == ErrorKind::WouldBlock => {
                thread::sleep(Duration::from_millis(25));
            }
            Err(err) => {
                tracing::warn!("master accept error: {err}");
                thread::sleep(Duration::from_millis(25));
            }
        }
    }
}

/// Executes newline-delimited commands from one master connection until it
/// disconnects. A failed response write ends the dialogue, never the server.
fn handle_master(
    stream: TcpStream,
    state: &NodeState,
    shutdown: &AtomicBool,
) -> std::io::Result<()> {
    stream.set_nonblocking(false)?;
    stream.set_read_timeout(Some(state.config.read_timeout))?;
    let mut reader = BufReader::new(stream.try_clone()?);
    let mut writer = stream;

    let mut line = String::new();
    loop {
        if shutdown.load(Ordering::Relaxed) {
            return Ok(());
        }

        match reader.read_line(&mut line) {
            Ok(0) => return Ok(()),
            Ok(_) if line.ends_with('\n') => {}
            Ok(_) => return Ok(()),
            // An idle controller is not a dead one: keep any partial input
            // and wait for the rest of the line.
            Err(err) if matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                continue;
            }
            Err(err) => return Err(err),
        }

        let command = line.trim().to_string();
        line.clear();

        match command.as_str() {
            "get" => {
                let response = format_messages(&state.log.contents());
                writer.write_all(response.as_bytes())?;
                writer.flush()?;
            }
            "alive" => {
                let now = OffsetDateTime::now_utc();
                let alive =
                    state
                        .liveness
                        .alive(state.config.id, now, state.config.alive_window);
                writer.write_all(format_alive(&alive).as_bytes())?;
                writer.flush()?;
            }
            _ => {
                if let Some(content) = command.strip_prefix(BROADCAST_PREFIX) {
                    state
                        .broadcaster
                        .broadcast(&PeerMessage::new(state.config.id, content));
                } else {
                    tracing::error!("unrecognized command: {command:?}");
                }
            }
        }
    }
}

/// `messages <c1>,<c2>,...\n` - one space after the keyword, no trailing
/// comma; an empty log yields `messages \n`.
fn format_messages(contents: &[String]) -> String {
    format!("messages {}\n", contents.join(","))
}

/// `alive <i1>,<i2>,...\n` with ids in ascending order.
fn format_alive(ids: &[usize]) -> String {
    let ids: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
    format!("alive {}\n", ids.join(","))
}
