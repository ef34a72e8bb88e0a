//!
//! Error types of the forward likelihood evaluator
//!
//! Only contract violations of the caller are errors.
//! A zero-likelihood step is not an error and shows up as `-inf`/NaN in the result.
//!
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ForwardError {
    /// dimensions of `allprobs`, `delta` or transition matrices disagree
    #[error("shape mismatch: {0}")]
    Shape(String),

    /// period label `tod[step]` does not index into the pool of `n_periods` matrices
    #[error("period label out of range: tod[{step}]={label} but the pool has {n_periods} matrices")]
    PeriodOutOfRange {
        step: usize,
        label: usize,
        n_periods: usize,
    },

    /// strict mode found violations in [`crate::check::check_inputs`]
    #[error("input check found {0} violations")]
    Violations(usize),

    /// model file could not be read or written
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// model file is not valid json for [`crate::io::HmmInput`]
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ForwardError {
    /// short-hand of `ForwardError::Shape(format!(..))`
    pub fn shape<S: Into<String>>(message: S) -> Self {
        ForwardError::Shape(message.into())
    }
}

pub type Result<T> = std::result::Result<T, ForwardError>;
