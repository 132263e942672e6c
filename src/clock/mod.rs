//! Logical and vector clocks.
//!
//! A [`LogicalClock`] is an unbounded counter. A [`VectorClock`] is a
//! fixed-length sequence of them owned by one process identity, with the
//! comparison predicates a monitor needs to reconstruct causal order. A
//! [`Timestamp`] is the wire form of a vector clock.

mod logical;
mod timestamp;
mod vector;

use thiserror::Error;

pub use logical::{LogicalClock, MAX_BASE};
pub use timestamp::Timestamp;
pub use vector::{VectorClock, VectorClockBuilder};

/// Errors raised by clock construction, parsing, and comparison.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClockError {
    #[error("cannot parse `{value}` as a nonnegative base {base} counter")]
    InvalidCounter { value: String, base: u32 },

    #[error("vector clock does not satisfy 1 <= id ({id}) <= length ({length})")]
    IdOutOfRange { id: usize, length: usize },

    #[error("vector clock uninitialized (length 0)")]
    Uninitialized,

    #[error("vector clocks have different lengths ({0} != {1})")]
    LengthMismatch(usize, usize),

    #[error("vector clocks are pairwise inconsistent: {0}, {1}")]
    PairwiseInconsistent(String, String),
}
