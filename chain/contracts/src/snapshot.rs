//! Ledger snapshots
//!
//! A snapshot is an ordered copy of the ledger state. Balances are kept in a
//! `BTreeMap` so serialization and the digest do not depend on hash map
//! iteration order: two ledgers holding the same state produce the same
//! digest.

use ledger_types::ids::AccountId;
use ledger_types::numeric::U256;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

const DIGEST_DOMAIN: &[u8] = b"vault-ledger/snapshot/v1";

/// Full ledger state at a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub capacity: U256,
    pub withdrawal_limit: U256,
    pub total_deposited: U256,
    pub deposit_count: u64,
    pub withdrawal_count: u64,
    /// Non-zero balances keyed by account
    pub balances: BTreeMap<AccountId, U256>,
    /// Length of the event log
    pub event_count: usize,
}

impl LedgerSnapshot {
    /// Sum of all balances, `None` on overflow.
    pub fn sum_of_balances(&self) -> Option<U256> {
        self.balances
            .values()
            .try_fold(U256::zero(), |acc, balance| acc.checked_add(*balance))
    }

    /// Hex SHA-256 over a fixed field order.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(DIGEST_DOMAIN);
        for amount in [self.capacity, self.withdrawal_limit, self.total_deposited] {
            hasher.update(amount.to_string().as_bytes());
            hasher.update(b"|");
        }
        hasher.update(self.deposit_count.to_be_bytes());
        hasher.update(self.withdrawal_count.to_be_bytes());
        hasher.update((self.event_count as u64).to_be_bytes());
        for (account, balance) in &self.balances {
            hasher.update(account.as_uuid().as_bytes());
            hasher.update(balance.to_string().as_bytes());
            hasher.update(b";");
        }
        format!("{:x}", hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> LedgerSnapshot {
        let mut balances = BTreeMap::new();
        balances.insert(AccountId::new(), U256::from(40u64));
        balances.insert(AccountId::new(), U256::from(60u64));
        LedgerSnapshot {
            capacity: U256::from(1000u64),
            withdrawal_limit: U256::from(10u64),
            total_deposited: U256::from(100u64),
            deposit_count: 2,
            withdrawal_count: 0,
            balances,
            event_count: 2,
        }
    }

    #[test]
    fn test_sum_of_balances() {
        assert_eq!(sample().sum_of_balances(), Some(U256::from(100u64)));
    }

    #[test]
    fn test_digest_is_stable() {
        let snapshot = sample();
        let digest = snapshot.digest();
        assert_eq!(digest.len(), 64);
        assert_eq!(digest, snapshot.clone().digest());
    }

    #[test]
    fn test_digest_changes_with_state() {
        let snapshot = sample();
        let mut changed = snapshot.clone();
        changed.withdrawal_count = 1;
        assert_ne!(snapshot.digest(), changed.digest());

        let mut rebalanced = snapshot.clone();
        let first = *rebalanced.balances.keys().next().unwrap();
        rebalanced.balances.insert(first, U256::from(41u64));
        assert_ne!(snapshot.digest(), rebalanced.digest());
    }

    #[test]
    fn test_snapshot_serializes_amounts_as_strings() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["total_deposited"], "100");
        assert_eq!(json["balances"].as_object().unwrap().len(), 2);
    }
}
