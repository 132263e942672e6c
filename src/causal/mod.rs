//! Timestamped messages and the causal-delivery receptacle.
//!
//! A monitor process feeds received [`Message`]s into a
//! [`MessageReceptacle`] and drains them with
//! [`MessageReceptacle::deliverables`], which releases a message only once
//! everything that causally precedes it has been released.

mod message;
mod receptacle;

pub use message::Message;
pub use receptacle::{MessageReceptacle, ReceptacleError, Violation};
