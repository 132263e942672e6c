//! Message envelope for monitored (vector-timestamped) traffic.

use serde::{Deserialize, Serialize};

use crate::clock::{Timestamp, VectorClock, MAX_BASE};

/// A value sent between processes, stamped with the vector clock state of
/// its send event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "msg")]
    pub content: String,
    #[serde(rename = "ts")]
    pub timestamp: Timestamp,
}

impl Message {
    /// Builds a message stamped with the clock's current state.
    ///
    /// A send is an event: tick the clock before constructing the message so
    /// the timestamp names the send itself.
    pub fn new(content: impl Into<String>, clk: &VectorClock) -> Self {
        Self {
            content: content.into(),
            timestamp: clk.timestamp(MAX_BASE),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_wire_field_names() {
        let clk = VectorClock::builder().id(1).length(1).build().unwrap();
        let msg = Message::new("hi, hello", &clk);
        assert_eq!(
            serde_json::to_string(&msg).unwrap(),
            r#"{"msg":"hi, hello","ts":{"id":1,"v":["0"]}}"#
        );
    }

    #[test]
    fn json_round_trip_is_byte_identical() {
        let raw = r#"{"msg":"didgeridoo","ts":{"id":1,"v":["0","0","1"]}}"#;
        let msg: Message = serde_json::from_str(raw).unwrap();
        assert_eq!(serde_json::to_string(&msg).unwrap(), raw);
    }

    #[test]
    fn captures_clock_state_at_construction() {
        let mut clk = VectorClock::builder().id(2).length(2).build().unwrap();
        clk.tick_local();
        let msg = Message::new("x", &clk);
        clk.tick_local();
        assert_eq!(msg.timestamp.to_clock().unwrap().to_string(), "[0, 1]");
    }
}
