//! Types library for the vault ledger
//!
//! Core type definitions shared by the ledger contract and its callers.
//!
//! # Modules
//! - `ids`: Account identity (`AccountId`)
//! - `numeric`: 256-bit unsigned amounts (`U256`)
//! - `errors`: Parsing errors for the types above

pub mod errors;
pub mod ids;
pub mod numeric;

