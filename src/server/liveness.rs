//! Peer liveness bookkeeping from received timestamps.

use std::sync::Mutex;
use std::time::Duration;

use time::OffsetDateTime;

/// Send timestamp of the most recent message (heartbeats included) from
/// each server, indexed by id.
#[derive(Debug)]
pub struct LivenessTable {
    last_seen: Mutex<Vec<OffsetDateTime>>,
}

impl LivenessTable {
    /// Returns a table for `n` servers with every entry at the epoch, so an
    /// unheard-from peer is never reported alive.
    pub fn new(n: usize) -> Self {
        Self {
            last_seen: Mutex::new(vec![OffsetDateTime::UNIX_EPOCH; n]),
        }
    }

    /// Records the send timestamp of a message from `id`. Out-of-range ids
    /// are ignored.
    pub fn record(&self, id: usize, rts: OffsetDateTime) {
        let mut last_seen = self.last_seen.lock().expect("liveness lock poisoned");
        if let Some(entry) = last_seen.get_mut(id) {
            *entry = rts;
        }
    }

    /// Ids believed alive at `now`, in ascending order.
    ///
    /// The local id is always included; a peer `j != self_id` is included
    /// iff the last timestamp received from it is younger than `window`.
    pub fn alive(&self, self_id: usize, now: OffsetDateTime, window: Duration) -> Vec<usize> {
        let last_seen = self.last_seen.lock().expect("liveness lock poisoned");
        last_seen
            .iter()
            .enumerate()
            .filter(|(id, seen)| *id == self_id || now - **seen < window)
            .map(|(id, _)| id)
            .collect()
    }
}
