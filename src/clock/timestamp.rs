//! Wire form of a vector clock.

use serde::{Deserialize, Serialize};

use super::{ClockError, LogicalClock, VectorClock, MAX_BASE};

/// The state of a [`VectorClock`] as it travels on the wire: the owning id
/// and the counters as digit strings.
///
/// Serialized timestamps use base [`MAX_BASE`]; decoding accepts any
/// explicit base in `[2, MAX_BASE]`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timestamp {
    pub id: usize,
    #[serde(rename = "v")]
    pub vector: Vec<String>,
}

impl Timestamp {
    /// Decodes the timestamp into a clock, interpreting each component in
    /// the given base.
    ///
    /// Fails if `1 <= id <= length` does not hold or any component is not a
    /// nonnegative integer in that base; the error names the offending
    /// component and base.
    pub fn to_clock_base(&self, base: u32) -> Result<VectorClock, ClockError> {
        if self.id < 1 || self.id > self.vector.len() {
            return Err(ClockError::IdOutOfRange {
                id: self.id,
                length: self.vector.len(),
            });
        }

        let mut vector = vec![LogicalClock::new(); self.vector.len()];
        for (counter, component) in vector.iter_mut().zip(&self.vector) {
            counter.set_str(component, base)?;
        }
        Ok(VectorClock::from_parts(self.id, vector))
    }

    /// Decodes a timestamp serialized at the default base.
    ///
    /// Equivalent to `to_clock_base(MAX_BASE)`.
    pub fn to_clock(&self) -> Result<VectorClock, ClockError> {
        self.to_clock_base(MAX_BASE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_numeric_value_in_every_base() {
        let mut clk = VectorClock::builder().id(2).length(3).build().unwrap();
        clk.tick_local();
        clk.tick_local();
        let mut peer = VectorClock::builder().id(3).length(3).build().unwrap();
        for _ in 0..40 {
            peer.tick_local();
        }
        clk.tick_receive(&peer).unwrap(); // [0, 2, 40]

        for base in 2..=MAX_BASE {
            let decoded = clk.timestamp(base).to_clock_base(base).unwrap();
            assert!(decoded.value_eq(&clk), "base {base}");
            assert_eq!(decoded.id(), clk.id());
        }
    }

    #[test]
    fn decode_in_explicit_base_ten() {
        let ts = Timestamp {
            id: 1,
            vector: vec!["9".into(), "10".into(), "11".into(), "12".into()],
        };
        let clk = ts.to_clock_base(10).unwrap();
        assert_eq!(clk.to_string(), "[9, 10, 11, 12]");
    }

    #[test]
    fn rejects_id_out_of_range() {
        let ts = Timestamp {
            id: 0,
            vector: vec!["0".into()],
        };
        assert_eq!(
            ts.to_clock(),
            Err(ClockError::IdOutOfRange { id: 0, length: 1 })
        );

        let ts = Timestamp {
            id: 3,
            vector: vec!["0".into(), "0".into()],
        };
        assert_eq!(
            ts.to_clock(),
            Err(ClockError::IdOutOfRange { id: 3, length: 2 })
        );
    }

    #[test]
    fn rejects_malformed_component_naming_it() {
        let ts = Timestamp {
            id: 1,
            vector: vec!["1".into(), "-4".into()],
        };
        assert_eq!(
            ts.to_clock_base(10),
            Err(ClockError::InvalidCounter {
                value: "-4".into(),
                base: 10,
            })
        );
    }

    #[test]
    fn json_round_trip_is_byte_identical() {
        let raw = r#"{"id":1,"v":["1","0","0","0","0"]}"#;
        let ts: Timestamp = serde_json::from_str(raw).unwrap();
        assert_eq!(serde_json::to_string(&ts).unwrap(), raw);
    }

    #[test]
    fn clock_serializes_as_timestamp_json() {
        let mut clk = VectorClock::builder().id(1).length(5).build().unwrap();
        clk.tick_local();
        assert_eq!(
            serde_json::to_string(&clk).unwrap(),
            r#"{"id":1,"v":["1","0","0","0","0"]}"#
        );

        let decoded: VectorClock =
            serde_json::from_str(r#"{"id":1,"v":["1","0","0","0","0"]}"#).unwrap();
        assert_eq!(decoded.to_string(), "[1, 0, 0, 0, 0]");
    }
}
