//! Peer wire format: one JSON message per connection, newline-terminated.

use std::io::{BufRead, BufReader, Read};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;

#[derive(Debug, Error)]
pub enum WireError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed message: {0}")]
    Json(#[from] serde_json::Error),
    #[error("connection closed before message terminator")]
    Truncated,
}

/// A message sent from one server to another.
///
/// Empty content denotes a heartbeat: it refreshes the sender's liveness
/// timestamp but is never appended to the message log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerMessage {
    /// Server id of the sender.
    pub id: usize,
    /// Real-time timestamp of the send.
    #[serde(with = "time::serde::rfc3339")]
    pub rts: OffsetDateTime,
    /// Content of the message.
    #[serde(rename = "msg")]
    pub content: String,
}

impl PeerMessage {
    /// A message with the given content, stamped now.
    pub fn new(id: usize, content: impl Into<String>) -> Self {
        Self {
            id,
            rts: OffsetDateTime::now_utc(),
            content: content.into(),
        }
    }

    /// An empty message, stamped now.
    pub fn heartbeat(id: usize) -> Self {
        Self::new(id, "")
    }

    pub fn is_heartbeat(&self) -> bool {
        self.content.is_empty()
    }
}

/// Encodes a message as a single newline-terminated JSON line.
pub fn encode_line(msg: &PeerMessage) -> Result<String, WireError> {
    let mut line = serde_json::to_string(msg)?;
    line.push('\n');
    Ok(line)
}

/// Reads newline-terminated JSON messages from a stream.
pub struct LineReader<R> {
    reader: BufReader<R>,
}

impl<R: Read> LineReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            reader: BufReader::new(inner),
        }
    }

    /// Reads the next message, or `None` on a clean end of stream.
    pub fn read_next(&mut self) -> Result<Option<PeerMessage>, WireError> {
        let mut line = String::new();
        let read = self.reader.read_line(&mut line)?;
        if read == 0 {
            return Ok(None);
        }
        if !line.ends_with('\n') {
            return Err(WireError::Truncated);
        }
        Ok(Some(serde_json::from_str(&line)?))
    }
}
