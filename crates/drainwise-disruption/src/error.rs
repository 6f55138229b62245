//! Disruption scoring error types.

use drainwise_scheduling::SchedulingError;
use thiserror::Error;

/// Result type alias for disruption scoring.
pub type DisruptionResult<T> = Result<T, DisruptionError>;

/// Errors reported by disruption scoring.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DisruptionError {
    /// Price filtering left too little diversity for a `minValues`
    /// requirement. The caller should not use the narrowed set.
    #[error("validating minValues, {0}")]
    MinValues(#[source] SchedulingError),

    #[error("invalid duration {value:?}: {reason}")]
    InvalidDuration { value: String, reason: String },

    #[error("no offering price known for node {0}")]
    UnknownPrice(String),
}
