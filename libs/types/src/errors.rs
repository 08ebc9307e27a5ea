//! Error types for identity and amount parsing

use thiserror::Error;

/// Errors raised while building numeric values from external input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NumericError {
    #[error("Invalid amount: {input:?} is not a non-negative decimal integer below 2^256")]
    InvalidAmount { input: String },

    #[error("Invalid amount: negative value {value}")]
    Negative { value: i64 },
}
