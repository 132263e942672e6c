//! Vector clocks indexed by process identity.

use std::cmp::Ordering;
use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::{ClockError, LogicalClock, Timestamp, MAX_BASE};

/// A vector clock: a process id and a fixed-length array of counters, one
/// per process in the system.
///
/// Process ids are 1-based: after the first local tick of a clock owned by
/// process 1 in a 3-process system, the clock reads `[1, 0, 0]`.
///
/// The default value has length 0 and is uninitialized; every comparison
/// against it fails. Build an initialized clock with [`VectorClock::builder`]
/// or decode one from a [`Timestamp`].
///
/// For causal delivery through a receptacle, the local component must be
/// incremented only for local and send events, never on receive.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VectorClock {
    id: usize,
    vector: Vec<LogicalClock>,
}

/// Two-knob builder for a zeroed [`VectorClock`], validating
/// `1 <= id <= length`.
#[derive(Clone, Copy, Debug, Default)]
pub struct VectorClockBuilder {
    id: usize,
    length: usize,
}

impl VectorClockBuilder {
    /// Sets the number of processes in the system.
    pub fn length(mut self, length: usize) -> Self {
        self.length = length;
        self
    }

    /// Sets the id of the process that owns the clock.
    pub fn id(mut self, id: usize) -> Self {
        self.id = id;
        self
    }

    pub fn build(self) -> Result<VectorClock, ClockError> {
        if self.id < 1 || self.id > self.length {
            return Err(ClockError::IdOutOfRange {
                id: self.id,
                length: self.length,
            });
        }
        Ok(VectorClock {
            id: self.id,
            vector: vec![LogicalClock::new(); self.length],
        })
    }
}

impl VectorClock {
    pub fn builder() -> VectorClockBuilder {
        VectorClockBuilder::default()
    }

    pub(crate) fn from_parts(id: usize, vector: Vec<LogicalClock>) -> Self {
        Self { id, vector }
    }

    /// Id of the process that owns the clock.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Number of processes in the system (0 for an uninitialized clock).
    pub fn len(&self) -> usize {
        self.vector.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vector.is_empty()
    }

    /// Counter for the 1-based process id `id`, if in range.
    pub fn component(&self, id: usize) -> Option<&LogicalClock> {
        if id == 0 {
            return None;
        }
        self.vector.get(id - 1)
    }

    fn local(&self) -> &LogicalClock {
        &self.vector[self.id - 1]
    }

    /// Increments the local component. Called once per local event and once
    /// per send event; a no-op on an uninitialized clock.
    pub fn tick_local(&mut self) {
        if self.vector.is_empty() {
            return;
        }
        self.vector[self.id - 1].tick();
    }

    /// Merges a received clock into this one, setting every non-local
    /// component to the pairwise maximum:
    ///
    /// ```text
    /// v[j] = max(v[j], other.v[j])    for all j != id
    /// ```
    ///
    /// Fails with both clocks unchanged if the clocks are not comparable or
    /// are pairwise inconsistent.
    pub fn tick_receive(&mut self, other: &VectorClock) -> Result<(), ClockError> {
        self.comparable(other)?;
        if self.pairwise_inconsistent(other) {
            return Err(ClockError::PairwiseInconsistent(
                self.to_string(),
                other.to_string(),
            ));
        }

        for (j, counter) in self.vector.iter_mut().enumerate() {
            if j != self.id - 1 {
                counter.max_assign(&other.vector[j]);
            }
        }
        Ok(())
    }

    /// Whether an event at this clock's state happens before an event at
    /// `other`'s state.
    ///
    /// Only the sender components are compared, so the check is O(1); the
    /// merge discipline of [`tick_receive`](Self::tick_receive) makes the
    /// local component dominant for ordering. Returns false if the clocks
    /// are not comparable or are pairwise inconsistent.
    pub fn less_than(&self, other: &VectorClock) -> bool {
        if self.comparable(other).is_err() {
            return false;
        }
        if self.id == other.id {
            return self.local().cmp(other.local()) == Ordering::Less;
        }
        if self.pairwise_inconsistent(other) {
            return false;
        }
        self.local().cmp(&other.vector[self.id - 1]) != Ordering::Greater
    }

    /// Whether the two clock states timestamp concurrent events (no causal
    /// precedence either way).
    ///
    /// Trivially false for clocks with the same id, and false whenever the
    /// clocks are not comparable or are pairwise inconsistent. Meaningful
    /// once each clock has been ticked at least once.
    pub fn concurrent(&self, other: &VectorClock) -> bool {
        if self.id == other.id {
            return false;
        }
        if self.comparable(other).is_err() {
            return false;
        }
        if self.pairwise_inconsistent(other) {
            return false;
        }
        self.local() > &other.vector[self.id - 1] && other.local() > &self.vector[other.id - 1]
    }

    /// Whether the clock states denote an impossible causal relation: one
    /// clock records more sends from the other's process than that process
    /// records itself.
    ///
    /// Assumes the clocks are comparable and have different ids.
    pub fn pairwise_inconsistent(&self, other: &VectorClock) -> bool {
        self.local() < &other.vector[self.id - 1] || other.local() < &self.vector[other.id - 1]
    }

    /// Checks that the clocks can be compared at all: both initialized, with
    /// equal lengths. Comparable clocks may still be pairwise inconsistent.
    pub fn comparable(&self, other: &VectorClock) -> Result<(), ClockError> {
        if self.vector.is_empty() {
            return Err(ClockError::Uninitialized);
        }
        if other.len() != self.len() {
            return Err(ClockError::LengthMismatch(self.len(), other.len()));
        }
        Ok(())
    }

    /// Whether the clock values are equal, ignoring ids. True for two
    /// uninitialized clocks, false for clocks of unequal length.
    pub fn value_eq(&self, other: &VectorClock) -> bool {
        self.vector == other.vector
    }

    /// Captures the current state as a [`Timestamp`] with components
    /// rendered in the given base.
    pub fn timestamp(&self, base: u32) -> Timestamp {
        Timestamp {
            id: self.id,
            vector: self.vector.iter().map(|c| c.text(base)).collect(),
        }
    }
}

impl fmt::Display for VectorClock {
    /// Renders the counters as `[a, b, c]` in base 10, ids excluded.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, counter) in self.vector.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{counter}")?;
        }
        write!(f, "]")
    }
}

impl Serialize for VectorClock {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.timestamp(MAX_BASE).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for VectorClock {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let ts = Timestamp::deserialize(deserializer)?;
        ts.to_clock().map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clock(id: usize, length: usize) -> VectorClock {
        VectorClock::builder().id(id).length(length).build().unwrap()
    }

    #[test]
    fn builder_validates_id_range() {
        assert!(VectorClock::builder().id(1).length(1).build().is_ok());
        assert!(VectorClock::builder().id(3).length(3).build().is_ok());

        let err = VectorClock::builder().id(0).length(3).build().unwrap_err();
        assert_eq!(err, ClockError::IdOutOfRange { id: 0, length: 3 });
        let err = VectorClock::builder().id(4).length(3).build().unwrap_err();
        assert_eq!(err, ClockError::IdOutOfRange { id: 4, length: 3 });
    }

    #[test]
    fn display_forms() {
        assert_eq!(VectorClock::default().to_string(), "[]");
        assert_eq!(clock(1, 1).to_string(), "[0]");
        assert_eq!(clock(1, 2).to_string(), "[0, 0]");
    }

    #[test]
    fn value_eq_ignores_ids() {
        let uninit = VectorClock::default();
        assert!(uninit.value_eq(&VectorClock::default()));

        let a = clock(1, 3);
        assert!(!a.value_eq(&uninit));
        assert!(a.value_eq(&clock(2, 3)));

        let mut b = clock(2, 3);
        b.tick_local();
        assert!(!a.value_eq(&b));
    }

    #[test]
    fn comparable_requires_equal_nonzero_lengths() {
        let uninit = VectorClock::default();
        assert_eq!(
            uninit.comparable(&VectorClock::default()),
            Err(ClockError::Uninitialized)
        );

        let a = clock(1, 3);
        assert_eq!(
            a.comparable(&VectorClock::default()),
            Err(ClockError::LengthMismatch(3, 0))
        );
        assert!(a.comparable(&clock(2, 3)).is_ok());
    }

    #[test]
    fn local_component_is_monotone() {
        let mut a = clock(2, 4);
        let mut prev = a.component(2).unwrap().clone();
        let mut peer = clock(3, 4);
        peer.tick_local();
        peer.tick_local();

        a.tick_local();
        assert!(a.component(2).unwrap() >= &prev);
        prev = a.component(2).unwrap().clone();

        a.tick_receive(&peer).unwrap();
        assert!(a.component(2).unwrap() >= &prev);
    }

    #[test]
    fn tick_receive_baseline() {
        // Two messages ping-ponged between ids 2 and 3 in a 4-process system.
        let mut clk_a = clock(2, 4);
        let mut clk_b = clock(3, 4);

        clk_a.tick_local();
        assert_eq!(clk_a.to_string(), "[0, 1, 0, 0]");
        clk_b.tick_receive(&clk_a).unwrap();
        assert_eq!(clk_b.to_string(), "[0, 1, 0, 0]");

        clk_b.tick_local();
        assert_eq!(clk_b.to_string(), "[0, 1, 1, 0]");
        clk_a.tick_receive(&clk_b).unwrap();
        assert_eq!(clk_a.to_string(), "[0, 1, 1, 0]");
    }

    #[test]
    fn tick_receive_rejects_incomparable_operands() {
        let mut a = clock(1, 3);
        let err = a.tick_receive(&clock(1, 2)).unwrap_err();
        assert_eq!(err, ClockError::LengthMismatch(3, 2));
        assert_eq!(a.to_string(), "[0, 0, 0]");

        let mut uninit = VectorClock::default();
        assert!(uninit.tick_receive(&clock(1, 3)).is_err());
    }

    #[test]
    fn tick_receive_rejects_pairwise_inconsistent_operand_unchanged() {
        // other claims two sends from process 1 that process 1 never made.
        let mut a = clock(1, 2);
        a.tick_local();

        let mut other = clock(2, 2);
        other.tick_local();
        other
            .tick_receive(&{
                let mut fake = clock(1, 2);
                fake.tick_local();
                fake.tick_local();
                fake
            })
            .unwrap();

        let err = a.tick_receive(&other).unwrap_err();
        assert!(matches!(err, ClockError::PairwiseInconsistent(..)));
        assert_eq!(a.to_string(), "[1, 0]");
    }

    #[test]
    fn less_than_same_id() {
        let a = clock(1, 3);
        let mut b = clock(1, 3);
        assert!(!a.less_than(&b));

        b.tick_local();
        assert!(a.less_than(&b));
        assert!(!b.less_than(&a));
    }

    #[test]
    fn less_than_and_concurrent_across_ids() {
        let mut a = clock(1, 3);
        let mut b = clock(3, 3);
        a.tick_local(); // [1, 0, 0]
        b.tick_local(); // [0, 0, 1]

        assert!(!a.less_than(&b));
        assert!(!b.less_than(&a));
        assert!(a.concurrent(&b));
        assert!(b.concurrent(&a));

        b.tick_receive(&a).unwrap(); // [1, 0, 1]
        assert!(a.less_than(&b));
        assert!(!b.less_than(&a));
        assert!(!a.concurrent(&b));
    }

    #[test]
    fn concurrent_is_false_for_same_id() {
        let mut a = clock(2, 3);
        let mut b = clock(2, 3);
        a.tick_local();
        b.tick_local();
        b.tick_local();
        assert!(!a.concurrent(&b));
    }

    #[test]
    fn ordering_predicates_are_mutually_exclusive() {
        // For pairwise-consistent clocks with different ids, at most one of
        // a < b, b < a, a || b holds.
        let mut a = clock(1, 2);
        let mut b = clock(2, 2);
        a.tick_local();
        b.tick_receive(&a).unwrap();
        b.tick_local();

        let relations = [a.less_than(&b), b.less_than(&a), a.concurrent(&b)];
        assert_eq!(relations.iter().filter(|held| **held).count(), 1);
        assert!(a.less_than(&b));
    }
}
