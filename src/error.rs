use thiserror::Error;

use crate::causal::ReceptacleError;
use crate::clock::ClockError;
use crate::config::ConfigError;
use crate::server::{NodeError, WireError};

/// Crate-level convenience error.
///
/// Not a "god error": it is a thin wrapper over canonical capability errors.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Clock(#[from] ClockError),

    #[error(transparent)]
    Receptacle(#[from] ReceptacleError),

    #[error(transparent)]
    Wire(#[from] WireError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Node(#[from] NodeError),
}
