//! Ledger error types
//!
//! Every variant aborts the whole operation. The ledger never retries or
//! recovers internally; a failed call leaves state exactly as it found it.

use ledger_types::numeric::U256;
use thiserror::Error;

/// Errors surfaced by `deposit` and `withdraw`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Deposit amount must be greater than zero")]
    ZeroDepositAmount,

    #[error("Withdrawal amount must be greater than zero")]
    ZeroWithdrawalAmount,

    #[error("Deposit exceeds bank capacity: attempted {attempted}, available {available}")]
    ExceedsBankCapacity { attempted: U256, available: U256 },

    #[error("Insufficient balance: requested {requested}, available {available}")]
    InsufficientBalance { requested: U256, available: U256 },

    #[error("Withdrawal exceeds per-call threshold: requested {requested}, max {max}")]
    ExceedsWithdrawalThreshold { requested: U256, max: U256 },

    #[error("Transfer failed: {detail}")]
    TransferFailed { detail: String },
}

/// Errors raised while creating a ledger or loading its configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Capacity must be greater than zero")]
    ZeroCapacity,

    #[error("Withdrawal limit must be greater than zero")]
    ZeroWithdrawalLimit,

    #[error("Maximum call depth must be at least 1")]
    ZeroCallDepth,

    #[error("Invalid ledger config: {0}")]
    Parse(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_error_display() {
        let err = LedgerError::ExceedsBankCapacity {
            attempted: U256::from(950u64),
            available: U256::from(900u64),
        };
        assert_eq!(
            err.to_string(),
            "Deposit exceeds bank capacity: attempted 950, available 900"
        );
    }

    #[test]
    fn test_threshold_error_display() {
        let err = LedgerError::ExceedsWithdrawalThreshold {
            requested: U256::from(15u64),
            max: U256::from(10u64),
        };
        assert!(err.to_string().contains("requested 15, max 10"));
    }

    #[test]
    fn test_transfer_failed_display() {
        let err = LedgerError::TransferFailed {
            detail: "recipient rejected".to_string(),
        };
        assert_eq!(err.to_string(), "Transfer failed: recipient rejected");
    }

    #[test]
    fn test_config_error_from_toml() {
        let toml_err = toml::from_str::<toml::Table>("capacity = ").unwrap_err();
        let err: ConfigError = toml_err.into();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
