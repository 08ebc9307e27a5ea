//! Ledger notifications
//!
//! Events are immutable records appended to the ledger's log when an
//! operation completes. A rolled-back operation leaves no event behind.

use ledger_types::ids::AccountId;
use ledger_types::numeric::U256;
use serde::{Deserialize, Serialize};

/// Value credited to an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositMade {
    pub account: AccountId,
    pub amount: U256,
    pub new_balance: U256,
}

/// Value debited from an account and delivered through the transfer channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalMade {
    pub account: AccountId,
    pub amount: U256,
    pub remaining_balance: U256,
}

/// Enum wrapper for all ledger events, enabling uniform handling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEvent {
    DepositMade(DepositMade),
    WithdrawalMade(WithdrawalMade),
}

impl LedgerEvent {
    /// Account the event concerns.
    pub fn account(&self) -> AccountId {
        match self {
            LedgerEvent::DepositMade(e) => e.account,
            LedgerEvent::WithdrawalMade(e) => e.account,
        }
    }

    /// Amount moved by the operation.
    pub fn amount(&self) -> U256 {
        match self {
            LedgerEvent::DepositMade(e) => e.amount,
            LedgerEvent::WithdrawalMade(e) => e.amount,
        }
    }
}
