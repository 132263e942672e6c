//! Buffering of received messages for causal delivery.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use thiserror::Error;

use crate::clock::{ClockError, LogicalClock, VectorClock};

use super::Message;

/// Errors raised while accepting or releasing messages.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReceptacleError {
    #[error("message timestamp length ({got}) != receptacle length ({expected})")]
    LengthMismatch { got: usize, expected: usize },

    #[error(transparent)]
    Clock(#[from] ClockError),

    #[error(
        "cannot deliver message: timestamp[{sender}] ({timestamp}) is behind \
         the receptacle counter ({counter})"
    )]
    StaleTimestamp {
        sender: usize,
        timestamp: String,
        counter: String,
    },
}

/// An inconsistency detected during a release pass: the error and the
/// message whose timestamp caused it, already removed from the receptacle.
#[derive(Debug)]
pub struct Violation {
    pub error: ReceptacleError,
    pub offender: Message,
}

/// A set of messages received but not yet delivered to the consumer.
///
/// The receptacle releases messages in an order that preserves causal
/// precedence, so a monitor draining it observes a consistent run. Causal
/// delivery holds only under the sender convention documented on
/// [`VectorClock`]: processes tick the local component for sends and local
/// events, never for receives.
///
/// Accepting a message consumes it; the receptacle owns every pending
/// envelope together with the clock decoded from its timestamp.
#[derive(Debug, Default)]
pub struct MessageReceptacle {
    /// Per-process high-water marks: `counter[i]` is the highest component
    /// `i + 1` value already released.
    counter: Vec<LogicalClock>,
    /// Pending messages keyed by acceptance ticket, in receipt order.
    received: BTreeMap<u64, (Message, VectorClock)>,
    next_ticket: u64,
}

impl MessageReceptacle {
    /// Returns an empty receptacle for a system of `n` processes.
    pub fn new(n: usize) -> Self {
        Self {
            counter: vec![LogicalClock::new(); n],
            received: BTreeMap::new(),
            next_ticket: 0,
        }
    }

    /// Number of processes in the system.
    pub fn len(&self) -> usize {
        self.counter.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counter.is_empty()
    }

    /// Number of received messages not yet delivered.
    pub fn pending(&self) -> usize {
        self.received.len()
    }

    /// Accepts a message into the pending set, consuming it.
    ///
    /// Fails (returning the message untouched alongside the error) if the
    /// timestamp's length differs from the receptacle's or the timestamp
    /// does not decode.
    pub fn receive(&mut self, msg: Message) -> Result<(), (ReceptacleError, Message)> {
        if msg.timestamp.vector.len() != self.len() {
            let err = ReceptacleError::LengthMismatch {
                got: msg.timestamp.vector.len(),
                expected: self.len(),
            };
            return Err((err, msg));
        }

        let clock = match msg.timestamp.to_clock() {
            Ok(clock) => clock,
            Err(err) => return Err((err.into(), msg)),
        };

        let ticket = self.next_ticket;
        self.next_ticket += 1;
        self.received.insert(ticket, (msg, clock));
        Ok(())
    }

    /// Releases every pending message that is now deliverable, in an order
    /// consistent with causal precedence (concurrent messages in receipt
    /// order).
    ///
    /// A message is deliverable when it is exactly the next expected from
    /// its sender and no prerequisite from another process is outstanding.
    /// One pass is made over the pending set; a message made deliverable by
    /// a release later in the same pass is picked up by the next call.
    ///
    /// When a pending message turns out to carry a sender component behind
    /// the high-water mark, the pass stops: the offender is removed and
    /// returned in the [`Violation`] together with everything released so
    /// far. Deliverables gathered before the violation are still valid and
    /// must not be discarded.
    pub fn deliverables(&mut self) -> (Vec<Message>, Option<Violation>) {
        let mut delivery = Vec::new();
        let tickets: Vec<u64> = self.received.keys().copied().collect();

        for ticket in tickets {
            let (_, clock) = &self.received[&ticket];
            let sender = clock.id();
            let sender_component = clock.component(sender).expect("validated on receive");

            // Position of this timestamp relative to the next expected
            // message from its sender.
            let position = self.counter[sender - 1].cmp_offset(1, sender_component);
            if position == Ordering::Less {
                continue;
            }

            let gap_from_others = self.counter.iter().enumerate().any(|(idx, ctr)| {
                idx != sender - 1 && ctr < clock.component(idx + 1).expect("validated on receive")
            });
            if gap_from_others {
                continue;
            }

            if position == Ordering::Greater {
                if self.counter[sender - 1].cmp(sender_component) == Ordering::Greater {
                    let error = ReceptacleError::StaleTimestamp {
                        sender,
                        timestamp: sender_component.to_string(),
                        counter: self.counter[sender - 1].to_string(),
                    };
                    let (offender, _) = self.received.remove(&ticket).expect("ticket present");
                    return (delivery, Some(Violation { error, offender }));
                }
                // Sender component equals the high-water mark: neither the
                // next expected message nor provably inconsistent.
                continue;
            }

            let (msg, clock) = self.received.remove(&ticket).expect("ticket present");
            self.counter[sender - 1].set(clock.component(sender).expect("validated on receive"));
            delivery.push(msg);
        }

        (delivery, None)
    }
}
