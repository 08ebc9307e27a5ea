//! Ledger creation parameters
//!
//! Capacity and withdrawal limit are fixed for the lifetime of a ledger.
//! They can be built in code or loaded from TOML:
//!
//! ```toml
//! capacity = "1000"
//! withdrawal_limit = "10"
//! max_call_depth = 64
//! ```

use ledger_types::numeric::U256;
use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

/// Default bound on nested transfer calls.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 64;

fn default_max_call_depth() -> usize {
    DEFAULT_MAX_CALL_DEPTH
}

/// Ledger configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LedgerConfig {
    /// Maximum aggregate balance the ledger may hold
    pub capacity: U256,
    /// Maximum amount a single withdrawal may move
    pub withdrawal_limit: U256,
    /// Maximum number of transfer calls that may be in flight at once
    #[serde(default = "default_max_call_depth")]
    pub max_call_depth: usize,
}

impl LedgerConfig {
    pub fn new(capacity: U256, withdrawal_limit: U256) -> Self {
        Self {
            capacity,
            withdrawal_limit,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }

    /// Override the nested call bound.
    pub fn with_max_call_depth(mut self, max_call_depth: usize) -> Self {
        self.max_call_depth = max_call_depth;
        self
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: LedgerConfig = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject parameters a ledger cannot be created with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity.is_zero() {
            return Err(ConfigError::ZeroCapacity);
        }
        if self.withdrawal_limit.is_zero() {
            return Err(ConfigError::ZeroWithdrawalLimit);
        }
        if self.max_call_depth == 0 {
            return Err(ConfigError::ZeroCallDepth);
        }
        Ok(())
    }
}
