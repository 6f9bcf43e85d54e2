//! Engine error types.
//!
//! Only boundary validation and session bookkeeping can fail. Everything
//! else in the engine (empty candidate sets, missing items, zero
//! information) resolves to a well-defined value instead of an error.

use thiserror::Error;

/// Errors raised by the adaptive-testing engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CatError {
    /// An IRT parameter or ability value is outside its domain.
    #[error("invalid {name}: {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    /// An answer was recorded while no item was pending.
    #[error("no item is pending an answer")]
    NoPendingItem,

    /// An answer was recorded for an item other than the pending one.
    #[error("answer for item '{got}' but item '{expected}' is pending")]
    UnexpectedItem { expected: String, got: String },

    /// A confidence rating outside `[0, 1]`.
    #[error("confidence must be within [0, 1], got {0}")]
    InvalidConfidence(f64),
}

impl CatError {
    pub(crate) fn invalid(name: &'static str, value: f64, reason: &'static str) -> Self {
        CatError::InvalidParameter {
            name,
            value,
            reason,
        }
    }

    /// Returns `true` if the error came from parameter validation.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            CatError::InvalidParameter { .. } | CatError::InvalidConfidence(_)
        )
    }
}

pub type CatResult<T> = std::result::Result<T, CatError>;
