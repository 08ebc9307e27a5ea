//! Undo journal for atomic ledger operations
//!
//! Every ledger mutation records the value it overwrote. An operation takes a
//! checkpoint before touching state; on failure the entries written after the
//! checkpoint are handed back newest-first so the ledger can restore them.
//! Entries written by nested (reentrant) calls sit above the outer
//! checkpoint, so reverting the outer call also undoes them.

use ledger_types::ids::AccountId;
use ledger_types::numeric::U256;

/// A single overwritten value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JournalEntry {
    /// Balance of `account` before the write (`None` if it had no entry)
    Balance {
        account: AccountId,
        previous: Option<U256>,
    },
    TotalDeposited(U256),
    DepositCount(u64),
    WithdrawalCount(u64),
    /// Length of the event log before an event was appended
    Event { previous_len: usize },
}

/// Position in the journal to revert to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Checkpoint(usize);

#[derive(Debug, Default)]
pub struct Journal {
    entries: Vec<JournalEntry>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the current position.
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint(self.entries.len())
    }

    pub fn record(&mut self, entry: JournalEntry) {
        self.entries.push(entry);
    }

    /// Remove and return every entry written since `checkpoint`, newest first.
    pub fn unwind(&mut self, checkpoint: Checkpoint) -> Vec<JournalEntry> {
        let start = checkpoint.0.min(self.entries.len());
        let mut undone = self.entries.split_off(start);
        undone.reverse();
        undone
    }

    /// Drop all entries once the outermost operation has committed.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
