use thiserror::Error;

use crate::chain::ChainError;

/// Errors returned by sampling, calculation and prediction.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum CoreError {
    /// `start` is zero or greater than `end`.
    #[error("Invalid height range: {start}..={end}")]
    InvalidRange { start: u64, end: u64 },

    /// Fewer usable block intervals than the configured minimum.
    #[error("Insufficient sample: {actual} block intervals, need at least {required}")]
    InsufficientSample { actual: usize, required: usize },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A chain query failed. Carries the operation and, when relevant, the height.
    #[error("{operation}{} failed: {source}", .height.map(at_height).unwrap_or_default())]
    Upstream {
        operation: &'static str,
        height: Option<u64>,
        #[source]
        source: ChainError,
    },

    /// The operation was cancelled before it finished.
    #[error("Operation cancelled")]
    Cancelled,
}

impl CoreError {
    #[must_use]
    pub fn upstream(operation: &'static str, height: Option<u64>, source: ChainError) -> Self {
        Self::Upstream { operation, height, source }
    }

    /// Returns the underlying chain error, if any.
    #[must_use]
    pub fn chain_error(&self) -> Option<&ChainError> {
        match self {
            Self::Upstream { source, .. } => Some(source),
            _ => None,
        }
    }
}

fn at_height(height: u64) -> String {
    format!(" at height {height}")
}

pub type CoreResult<T> = Result<T, CoreError>;
