use thiserror::Error;

use crate::types::{BodyId, Tick};

/// Result type alias for gravity operations.
pub type GravityResult<T> = Result<T, GravityError>;

/// Every failure the simulation core can report.
///
/// Range and configuration errors are raised before anything is mutated, so a
/// failed call leaves the simulation exactly as it was.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GravityError {
    /// Tick selection, edit or creation outside the retained range.
    #[error("tick {tick} is outside the simulated range [{min}, {max}]")]
    InvalidTick {
        /// Requested tick.
        tick: Tick,
        /// Earliest tick that can still be loaded.
        min: Tick,
        /// Latest simulated tick.
        max: Tick,
    },

    /// Malformed or out-of-range configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The history budget cannot hold what must be retained.
    #[error("history budget of {budget} bytes cannot hold {required} retained bytes")]
    OutOfBudget {
        /// Configured ceiling in bytes.
        budget: u64,
        /// Bytes that could not be evicted plus the bytes being written.
        required: u64,
    },

    /// A record was written for an id the allocator never issued.
    #[error("unknown body {0}")]
    UnknownBody(BodyId),
}

impl GravityError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration(message.into())
    }
}
