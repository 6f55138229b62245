//! Error types for the scheduling surface.

use thiserror::Error;

/// Result type alias for scheduling queries.
pub type SchedulingResult<T> = Result<T, SchedulingError>;

/// Errors reported by requirement construction and validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulingError {
    #[error("minValues requirement is not met for label {key}: need {min_values} distinct values, found {found}")]
    MinValuesNotSatisfied {
        key: String,
        min_values: usize,
        found: usize,
    },

    #[error("invalid requirement for label {key}: {reason}")]
    InvalidRequirement { key: String, reason: String },
}
