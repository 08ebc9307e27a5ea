//! Vault Ledger: balances, capacity and reentrancy-safe withdrawals
//!
//! The ledger exclusively owns every piece of mutable state:
//! - per-account balances (a zero balance is the same as no entry)
//! - the running total, bounded by a fixed capacity
//! - deposit and withdrawal counters
//! - the append-only event log
//!
//! Withdrawals follow checks-effects-interactions. The debit is committed
//! before the transfer channel runs, so a reentrant withdrawal against the
//! same funds sees the reduced balance and is rejected. Every mutation is
//! journaled; if the transfer fails, the operation is unwound together with
//! anything nested calls did in the meantime.

use ledger_types::ids::AccountId;
use ledger_types::numeric::U256;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, warn};

use crate::config::LedgerConfig;
use crate::errors::{ConfigError, LedgerError};
use crate::events::{DepositMade, LedgerEvent, WithdrawalMade};
use crate::journal::{Checkpoint, Journal, JournalEntry};
use crate::snapshot::LedgerSnapshot;
use crate::transfer::{TransferChannel, TransferReceipt};

/// Point-in-time view of the ledger totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankStats {
    pub total_deposited: U256,
    /// `capacity - total_deposited`
    pub available_capacity: U256,
    pub deposit_count: u64,
    pub withdrawal_count: u64,
}

/// Single-asset custodial ledger.
#[derive(Debug)]
pub struct VaultLedger {
    capacity: U256,
    withdrawal_limit: U256,
    max_call_depth: usize,
    total_deposited: U256,
    deposit_count: u64,
    withdrawal_count: u64,
    balances: HashMap<AccountId, U256>,
    /// Emitted events log (append-only)
    events: Vec<LedgerEvent>,
    journal: Journal,
    /// Transfers currently in flight
    call_depth: usize,
}

impl VaultLedger {
    /// Create a ledger with the default call depth bound.
    ///
    /// Fails if either limit is zero.
    pub fn new(capacity: U256, withdrawal_limit: U256) -> Result<Self, ConfigError> {
        Self::with_config(LedgerConfig::new(capacity, withdrawal_limit))
    }

    /// Create a ledger from a validated configuration.
    pub fn with_config(config: LedgerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        info!(
            capacity = %config.capacity,
            withdrawal_limit = %config.withdrawal_limit,
            max_call_depth = config.max_call_depth,
            "vault ledger created"
        );
        Ok(Self {
            capacity: config.capacity,
            withdrawal_limit: config.withdrawal_limit,
            max_call_depth: config.max_call_depth,
            total_deposited: U256::zero(),
            deposit_count: 0,
            withdrawal_count: 0,
            balances: HashMap::new(),
            events: Vec::new(),
            journal: Journal::new(),
            call_depth: 0,
        })
    }

    // ───────────────────────── Deposit ─────────────────────────

    /// Credit `amount` (the value attached to the call) to `caller`.
    ///
    /// Emits `DepositMade`.
    pub fn deposit(
        &mut self,
        caller: AccountId,
        amount: U256,
    ) -> Result<LedgerEvent, LedgerError> {
        if amount.is_zero() {
            warn!(account = %caller, "deposit rejected: zero amount");
            return Err(LedgerError::ZeroDepositAmount);
        }

        let exceeds = || LedgerError::ExceedsBankCapacity {
            attempted: amount,
            available: self.available_capacity(),
        };
        let new_total = match self.total_deposited.checked_add(amount) {
            Some(total) if total <= self.capacity => total,
            _ => {
                let err = exceeds();
                warn!(account = %caller, %amount, error = %err, "deposit rejected");
                return Err(err);
            }
        };
        // Bounded by new_total, so this only fails if the books are already broken.
        let new_balance = self
            .get_user_balance(&caller)
            .checked_add(amount)
            .ok_or_else(exceeds)?;

        self.write_balance(caller, new_balance);
        self.write_total_deposited(new_total);
        self.write_deposit_count(self.deposit_count.saturating_add(1));

        let event = LedgerEvent::DepositMade(DepositMade {
            account: caller,
            amount,
            new_balance,
        });
        self.emit(event.clone());
        self.finish_operation();

        debug!(account = %caller, %amount, %new_balance, "deposit accepted");
        Ok(event)
    }

    // ───────────────────────── Withdraw ─────────────────────────

    /// Debit `amount` from `caller` and send it through `channel`.
    ///
    /// Checks run in order: zero amount, balance, per-call threshold. The
    /// debit is applied before the channel is invoked. A failed or
    /// redirected transfer unwinds the whole operation, including anything
    /// the channel did to the ledger while it held control.
    ///
    /// Emits `WithdrawalMade`.
    pub fn withdraw<C>(
        &mut self,
        caller: AccountId,
        amount: U256,
        channel: &mut C,
    ) -> Result<LedgerEvent, LedgerError>
    where
        C: TransferChannel + ?Sized,
    {
        let checkpoint = self.journal.checkpoint();
        let result = self.execute_withdrawal(caller, amount, channel);
        if let Err(err) = &result {
            self.revert_to(checkpoint);
            warn!(
                account = %caller,
                %amount,
                depth = self.call_depth,
                error = %err,
                "withdrawal rejected"
            );
        }
        self.finish_operation();
        result
    }

    fn execute_withdrawal<C>(
        &mut self,
        caller: AccountId,
        amount: U256,
        channel: &mut C,
    ) -> Result<LedgerEvent, LedgerError>
    where
        C: TransferChannel + ?Sized,
    {
        // Checks
        if amount.is_zero() {
            return Err(LedgerError::ZeroWithdrawalAmount);
        }
        let balance = self.get_user_balance(&caller);
        if balance < amount {
            return Err(LedgerError::InsufficientBalance {
                requested: amount,
                available: balance,
            });
        }
        if amount > self.withdrawal_limit {
            return Err(LedgerError::ExceedsWithdrawalThreshold {
                requested: amount,
                max: self.withdrawal_limit,
            });
        }

        // Effects: committed before control leaves the ledger.
        // total_deposited >= balance >= amount, so neither subtraction wraps.
        self.write_balance(caller, balance - amount);
        self.write_total_deposited(self.total_deposited - amount);
        self.write_withdrawal_count(self.withdrawal_count.saturating_add(1));

        // Interaction
        let receipt = self.call_channel(caller, amount, channel)?;
        if !receipt.success {
            return Err(LedgerError::TransferFailed {
                detail: receipt.detail(),
            });
        }
        if receipt.recipient != caller {
            return Err(LedgerError::TransferFailed {
                detail: format!(
                    "recipient changed during transfer: expected {}, got {}",
                    caller, receipt.recipient
                ),
            });
        }
        debug_assert!(self.check_invariants(), "ledger invariants broken after transfer");

        let remaining_balance = self.get_user_balance(&caller);
        let event = LedgerEvent::WithdrawalMade(WithdrawalMade {
            account: caller,
            amount,
            remaining_balance,
        });
        self.emit(event.clone());

        debug!(account = %caller, %amount, %remaining_balance, "withdrawal completed");
        Ok(event)
    }

    fn call_channel<C>(
        &mut self,
        recipient: AccountId,
        amount: U256,
        channel: &mut C,
    ) -> Result<TransferReceipt, LedgerError>
    where
        C: TransferChannel + ?Sized,
    {
        if self.call_depth >= self.max_call_depth {
            return Err(LedgerError::TransferFailed {
                detail: format!("call depth limit of {} reached", self.max_call_depth),
            });
        }
        self.call_depth += 1;
        let receipt = channel.transfer(self, recipient, amount);
        self.call_depth -= 1;
        Ok(receipt)
    }

    // ───────────────────────── Queries ─────────────────────────

    /// Balance of `account`, zero if it never deposited.
    pub fn get_user_balance(&self, account: &AccountId) -> U256 {
        self.balances.get(account).copied().unwrap_or_default()
    }

    /// Consistent view of the current totals.
    pub fn get_bank_stats(&self) -> BankStats {
        BankStats {
            total_deposited: self.total_deposited,
            available_capacity: self.available_capacity(),
            deposit_count: self.deposit_count,
            withdrawal_count: self.withdrawal_count,
        }
    }

    pub fn capacity(&self) -> U256 {
        self.capacity
    }

    pub fn withdrawal_limit(&self) -> U256 {
        self.withdrawal_limit
    }

    pub fn max_call_depth(&self) -> usize {
        self.max_call_depth
    }

    /// Number of accounts holding a non-zero balance.
    pub fn account_count(&self) -> usize {
        self.balances.len()
    }

    fn available_capacity(&self) -> U256 {
        self.capacity.saturating_sub(self.total_deposited)
    }

    /// Check the accounting invariants:
    /// balances sum to the total, the total fits the capacity, and no
    /// zero balance is stored.
    pub fn check_invariants(&self) -> bool {
        let mut sum = U256::zero();
        for balance in self.balances.values() {
            if balance.is_zero() {
                return false;
            }
            sum = match sum.checked_add(*balance) {
                Some(s) => s,
                None => return false,
            };
        }
        sum == self.total_deposited && self.total_deposited <= self.capacity
    }

    /// Ordered copy of the full ledger state.
    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            capacity: self.capacity,
            withdrawal_limit: self.withdrawal_limit,
            total_deposited: self.total_deposited,
            deposit_count: self.deposit_count,
            withdrawal_count: self.withdrawal_count,
            balances: self
                .balances
                .iter()
                .map(|(account, balance)| (*account, *balance))
                .collect::<BTreeMap<_, _>>(),
            event_count: self.events.len(),
        }
    }

    // ───────────────────────── Events ─────────────────────────

    /// Get all emitted events.
    ///
    /// The log can only be read, never emptied, so a rollback always finds
    /// the entries it has to remove. Events appended while a withdrawal is
    /// in flight are provisional until it returns.
    pub fn events(&self) -> &[LedgerEvent] {
        &self.events
    }

    // ───────────────────────── Journaled writes ─────────────────────────

    fn write_balance(&mut self, account: AccountId, value: U256) {
        let previous = if value.is_zero() {
            self.balances.remove(&account)
        } else {
            self.balances.insert(account, value)
        };
        self.journal.record(JournalEntry::Balance { account, previous });
    }

    fn write_total_deposited(&mut self, value: U256) {
        let previous = std::mem::replace(&mut self.total_deposited, value);
        self.journal.record(JournalEntry::TotalDeposited(previous));
    }

    fn write_deposit_count(&mut self, value: u64) {
        let previous = std::mem::replace(&mut self.deposit_count, value);
        self.journal.record(JournalEntry::DepositCount(previous));
    }

    fn write_withdrawal_count(&mut self, value: u64) {
        let previous = std::mem::replace(&mut self.withdrawal_count, value);
        self.journal.record(JournalEntry::WithdrawalCount(previous));
    }

    fn emit(&mut self, event: LedgerEvent) {
        self.journal.record(JournalEntry::Event {
            previous_len: self.events.len(),
        });
        self.events.push(event);
    }

    fn revert_to(&mut self, checkpoint: Checkpoint) {
        for entry in self.journal.unwind(checkpoint) {
            match entry {
                JournalEntry::Balance {
                    account,
                    previous: Some(balance),
                } => {
                    self.balances.insert(account, balance);
                }
                JournalEntry::Balance {
                    account,
                    previous: None,
                } => {
                    self.balances.remove(&account);
                }
                JournalEntry::TotalDeposited(total) => self.total_deposited = total,
                JournalEntry::DepositCount(count) => self.deposit_count = count,
                JournalEntry::WithdrawalCount(count) => self.withdrawal_count = count,
                JournalEntry::Event { previous_len } => self.events.truncate(previous_len),
            }
        }
    }

    /// The journal only has to outlive the outermost operation.
    fn finish_operation(&mut self) {
        if self.call_depth == 0 {
            self.journal.clear();
        }
    }
}
