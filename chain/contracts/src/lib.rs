//! Single-asset custodial ledger
//!
//! Tracks per-account balances against a fixed global capacity and caps the
//! value a single withdrawal may move. Withdrawals commit their debit before
//! handing control to the host's value-transfer primitive, so a recipient
//! that calls back into the ledger cannot spend the same funds twice.
//!
//! # Modules
//! - `ledger`: The Vault Ledger (deposit, withdraw, balance and stats queries)
//! - `transfer`: Value transfer channel contract and an in-memory host channel
//! - `journal`: Undo log that makes each operation all-or-nothing
//! - `events`: `DepositMade` / `WithdrawalMade` notifications
//! - `errors`: Ledger and configuration error types
//! - `config`: Creation parameters and TOML loading
//! - `snapshot`: Ordered state copies with a deterministic digest

pub mod config;
pub mod errors;
pub mod events;
pub mod journal;
pub mod ledger;
pub mod snapshot;
pub mod transfer;

pub use config::LedgerConfig;
pub use errors::{ConfigError, LedgerError};
pub use events::LedgerEvent;
pub use ledger::{BankStats, VaultLedger};
pub use transfer::{HostChannel, TransferChannel, TransferReceipt};
