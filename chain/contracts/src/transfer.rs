//! Value Transfer Channel
//!
//! The ledger moves value out through a `TransferChannel` supplied by the
//! host. Sending value to an address may run logic the recipient controls,
//! so a channel receives the ledger itself and is free to call back into
//! any ledger operation before it returns. The ledger never assumes its
//! state is unchanged after a transfer.

use ledger_types::ids::AccountId;
use ledger_types::numeric::U256;
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

use crate::ledger::VaultLedger;

/// Result of a transfer attempt as reported by the channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReceipt {
    /// Address the value actually went to
    pub recipient: AccountId,
    pub success: bool,
    /// Optional diagnostic payload
    pub data: Vec<u8>,
}

impl TransferReceipt {
    /// Value reached `recipient`.
    pub fn delivered(recipient: AccountId) -> Self {
        Self {
            recipient,
            success: true,
            data: Vec::new(),
        }
    }

    /// Transfer to `recipient` failed with a diagnostic payload.
    pub fn rejected(recipient: AccountId, data: impl Into<Vec<u8>>) -> Self {
        Self {
            recipient,
            success: false,
            data: data.into(),
        }
    }

    /// Human-readable rendering of the diagnostic payload.
    pub fn detail(&self) -> String {
        if self.data.is_empty() {
            "transfer rejected without reason".to_string()
        } else {
            String::from_utf8_lossy(&self.data).into_owned()
        }
    }
}

/// Host primitive that moves value to an address.
pub trait TransferChannel {
    /// Attempt to move `amount` to `recipient`.
    ///
    /// Implementations may re-enter `ledger` (directly or through recipient
    /// logic) before returning.
    fn transfer(
        &mut self,
        ledger: &mut VaultLedger,
        recipient: AccountId,
        amount: U256,
    ) -> TransferReceipt;
}

/// Logic run by a recipient when it receives value through a `HostChannel`.
///
/// Returning `Err` rejects the incoming transfer.
pub trait RecipientHook {
    fn on_receive(
        &mut self,
        ledger: &mut VaultLedger,
        channel: &mut HostChannel,
        amount: U256,
    ) -> Result<(), String>;
}

/// Adapts a closure into a `RecipientHook`.
pub struct ClosureHook<F>(pub F);

impl<F> RecipientHook for ClosureHook<F>
where
    F: FnMut(&mut VaultLedger, &mut HostChannel, U256) -> Result<(), String>,
{
    fn on_receive(
        &mut self,
        ledger: &mut VaultLedger,
        channel: &mut HostChannel,
        amount: U256,
    ) -> Result<(), String> {
        (self.0)(ledger, channel, amount)
    }
}

/// In-memory host channel.
///
/// Credits recipient wallets and runs any hook registered for the
/// recipient. The wallet is credited before the hook runs; if the hook
/// rejects, every wallet change made since the transfer began is undone.
/// A hook does not observe transfers made while it is itself running.
#[derive(Default)]
pub struct HostChannel {
    wallets: HashMap<AccountId, U256>,
    hooks: HashMap<AccountId, Box<dyn RecipientHook>>,
    transfers: u64,
    total_sent: U256,
    /// Previous wallet value for every credit made by in-flight transfers
    undo: Vec<(AccountId, Option<U256>)>,
    depth: usize,
}

impl HostChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register recipient logic for `account`, replacing any previous hook.
    pub fn register_hook(&mut self, account: AccountId, hook: impl RecipientHook + 'static) {
        self.hooks.insert(account, Box::new(hook));
    }

    /// Register a closure as recipient logic for `account`.
    pub fn on_receive<F>(&mut self, account: AccountId, f: F)
    where
        F: FnMut(&mut VaultLedger, &mut HostChannel, U256) -> Result<(), String> + 'static,
    {
        self.register_hook(account, ClosureHook(f));
    }

    pub fn remove_hook(&mut self, account: &AccountId) -> bool {
        self.hooks.remove(account).is_some()
    }

    /// Total value delivered to `account`.
    pub fn received(&self, account: &AccountId) -> U256 {
        self.wallets.get(account).copied().unwrap_or_default()
    }

    /// Number of successful transfers.
    pub fn transfer_count(&self) -> u64 {
        self.transfers
    }

    /// Value delivered across all accounts.
    pub fn total_sent(&self) -> U256 {
        self.total_sent
    }

    fn credit(&mut self, recipient: AccountId, amount: U256) -> Result<(), String> {
        let previous = self.wallets.get(&recipient).copied();
        let credited = previous
            .unwrap_or_default()
            .checked_add(amount)
            .ok_or_else(|| format!("wallet of {recipient} would overflow"))?;
        let total_sent = self
            .total_sent
            .checked_add(amount)
            .ok_or_else(|| "total sent would overflow".to_string())?;

        self.undo.push((recipient, previous));
        self.wallets.insert(recipient, credited);
        self.total_sent = total_sent;
        self.transfers += 1;
        Ok(())
    }

    /// Undo wallet credits newest-first down to `checkpoint`.
    fn revert_wallets(&mut self, checkpoint: usize) {
        while self.undo.len() > checkpoint {
            let Some((account, previous)) = self.undo.pop() else {
                break;
            };
            match previous {
                Some(value) => {
                    self.wallets.insert(account, value);
                }
                None => {
                    self.wallets.remove(&account);
                }
            }
        }
    }

    fn deliver(
        &mut self,
        ledger: &mut VaultLedger,
        recipient: AccountId,
        amount: U256,
    ) -> Result<(), String> {
        self.credit(recipient, amount)?;
        match self.hooks.remove(&recipient) {
            Some(mut hook) => {
                debug!(%recipient, %amount, "running recipient hook");
                let outcome = hook.on_receive(ledger, self, amount);
                // Keep a replacement registered by the hook itself.
                self.hooks.entry(recipient).or_insert(hook);
                outcome
            }
            None => Ok(()),
        }
    }
}

impl fmt::Debug for HostChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostChannel")
            .field("wallets", &self.wallets)
            .field("hooked_accounts", &self.hooks.keys().collect::<Vec<_>>())
            .field("transfers", &self.transfers)
            .field("total_sent", &self.total_sent)
            .finish()
    }
}

impl TransferChannel for HostChannel {
    fn transfer(
        &mut self,
        ledger: &mut VaultLedger,
        recipient: AccountId,
        amount: U256,
    ) -> TransferReceipt {
        let checkpoint = self.undo.len();
        let saved_transfers = self.transfers;
        let saved_total = self.total_sent;

        self.depth += 1;
        let outcome = self.deliver(ledger, recipient, amount);
        self.depth -= 1;

        let receipt = match outcome {
            Ok(()) => TransferReceipt::delivered(recipient),
            Err(reason) => {
                self.revert_wallets(checkpoint);
                self.transfers = saved_transfers;
                self.total_sent = saved_total;
                debug!(%recipient, %amount, %reason, "recipient rejected transfer");
                TransferReceipt::rejected(recipient, reason)
            }
        };

        if self.depth == 0 {
            self.undo.clear();
        }
        receipt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger() -> VaultLedger {
        VaultLedger::new(U256::from(1000u64), U256::from(10u64)).unwrap()
    }

    #[test]
    fn test_receipt_detail() {
        let acc = AccountId::new();
        assert_eq!(
            TransferReceipt::rejected(acc, "out of gas").detail(),
            "out of gas"
        );
        assert_eq!(
            TransferReceipt::rejected(acc, Vec::new()).detail(),
            "transfer rejected without reason"
        );
        assert!(TransferReceipt::delivered(acc).success);
    }

    #[test]
    fn test_plain_transfer_credits_wallet() {
        let mut ledger = ledger();
        let mut channel = HostChannel::new();
        let acc = AccountId::new();

        let receipt = channel.transfer(&mut ledger, acc, U256::from(7u64));
        assert_eq!(receipt, TransferReceipt::delivered(acc));
        assert_eq!(channel.received(&acc), U256::from(7u64));
        assert_eq!(channel.transfer_count(), 1);
    }

    #[test]
    fn test_hook_sees_credited_wallet() {
        let mut ledger = ledger();
        let mut channel = HostChannel::new();
        let acc = AccountId::new();
        channel.on_receive(acc, move |_, channel, amount| {
            if channel.received(&acc) == amount {
                Ok(())
            } else {
                Err("wallet not credited".to_string())
            }
        });

        let receipt = channel.transfer(&mut ledger, acc, U256::from(3u64));
        assert!(receipt.success);
    }

    #[test]
    fn test_rejecting_hook_restores_wallets() {
        let mut ledger = ledger();
        let mut channel = HostChannel::new();
        let acc = AccountId::new();
        channel.on_receive(acc, |_, _, _| Err("no thanks".to_string()));

        let receipt = channel.transfer(&mut ledger, acc, U256::from(3u64));
        assert!(!receipt.success);
        assert_eq!(receipt.detail(), "no thanks");
        assert_eq!(channel.received(&acc), U256::zero());
        assert_eq!(channel.transfer_count(), 0);
    }

    #[test]
    fn test_hook_survives_transfer() {
        let mut ledger = ledger();
        let mut channel = HostChannel::new();
        let acc = AccountId::new();
        channel.on_receive(acc, |_, _, _| Err("always".to_string()));

        assert!(!channel.transfer(&mut ledger, acc, U256::one()).success);
        assert!(!channel.transfer(&mut ledger, acc, U256::one()).success);
        assert!(channel.remove_hook(&acc));
        assert!(channel.transfer(&mut ledger, acc, U256::one()).success);
    }

    #[test]
    fn test_total_sent_tracks_delivered_value() {
        let mut ledger = ledger();
        let mut channel = HostChannel::new();
        let a = AccountId::new();
        let b = AccountId::new();
        channel.on_receive(b, |_, _, _| Err("closed".to_string()));

        assert!(channel.transfer(&mut ledger, a, U256::from(4u64)).success);
        assert!(channel.transfer(&mut ledger, a, U256::from(5u64)).success);
        assert!(!channel.transfer(&mut ledger, b, U256::from(6u64)).success);

        assert_eq!(channel.total_sent(), U256::from(9u64));
        assert_eq!(channel.received(&a), U256::from(9u64));
        assert_eq!(channel.transfer_count(), 2);
    }

    #[test]
    fn test_rejection_undoes_nested_credits_only() {
        let mut ledger = ledger();
        let mut channel = HostChannel::new();
        let outer = AccountId::new();
        let inner = AccountId::new();
        let bystander = AccountId::new();

        assert!(channel.transfer(&mut ledger, bystander, U256::from(2u64)).success);
        assert!(channel.transfer(&mut ledger, inner, U256::from(1u64)).success);

        channel.on_receive(outer, move |ledger, channel, amount| {
            if !channel.transfer(ledger, inner, amount).success {
                return Err("inner transfer failed".to_string());
            }
            Err("outer changed its mind".to_string())
        });

        let receipt = channel.transfer(&mut ledger, outer, U256::from(5u64));
        assert_eq!(receipt.detail(), "outer changed its mind");

        assert_eq!(channel.received(&outer), U256::zero());
        assert_eq!(channel.received(&inner), U256::from(1u64));
        assert_eq!(channel.received(&bystander), U256::from(2u64));
        assert_eq!(channel.total_sent(), U256::from(3u64));
        assert_eq!(channel.transfer_count(), 2);
        assert!(channel.undo.is_empty());
    }

    #[test]
    fn test_accepted_nested_credits_are_kept() {
        let mut ledger = ledger();
        let mut channel = HostChannel::new();
        let outer = AccountId::new();
        let inner = AccountId::new();
        channel.on_receive(outer, move |ledger, channel, amount| {
            channel.transfer(ledger, inner, amount);
            Ok(())
        });

        assert!(channel.transfer(&mut ledger, outer, U256::from(3u64)).success);
        assert_eq!(channel.received(&outer), U256::from(3u64));
        assert_eq!(channel.received(&inner), U256::from(3u64));
        assert_eq!(channel.total_sent(), U256::from(6u64));
        assert!(channel.undo.is_empty());
    }
}
