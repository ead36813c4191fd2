use chrono::NaiveDate;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Mutex;

use crate::config::PostingConfig;
use crate::errors::{LendingError, Result};
use crate::ledger::{Account, ClosedPeriod, EntryStatus, JournalEntry};
use crate::types::{AccountId, EntryId, JournalReferenceType};

/// persistence boundary for the ledger
///
/// Implementations back onto a transactional store. Two obligations are not
/// expressible in the signatures and bind every implementation:
///
/// - `insert_journal_entry` lands the header and all lines as one atomic
///   unit, re-checks period closure inside the same transaction for entries
///   without approval, and, when inserting a reversal, flips the original
///   entry to `Reversed` in that same transaction.
/// - Lookups carry whatever timeout policy the backing store needs; none of
///   these calls may block indefinitely.
pub trait LedgerRepository: Send + Sync {
    fn account(&self, id: AccountId) -> Result<Account>;

    fn is_period_closed(&self, date: NaiveDate) -> Result<bool>;

    fn insert_journal_entry(&self, entry: &JournalEntry) -> Result<EntryId>;

    fn find_journal_entry(&self, id: EntryId) -> Result<JournalEntry>;

    /// lexicographically highest stored reference starting with `prefix`
    fn highest_reference_for_prefix(&self, prefix: &str) -> Result<Option<String>>;

    /// optimistically claim a loan reference; collides if already taken
    fn claim_reference(&self, reference: &str) -> Result<()>;
}

#[derive(Default)]
struct LedgerState {
    accounts: HashMap<AccountId, Account>,
    entries: HashMap<EntryId, JournalEntry>,
    closed_periods: HashSet<ClosedPeriod>,
    references: BTreeSet<String>,
}

/// in-memory ledger store
///
/// One mutex over the whole state makes every repository call indivisible,
/// the same guarantee a database transaction gives the production adapter.
/// Tests and demos use this directly.
pub struct InMemoryLedger {
    state: Mutex<LedgerState>,
    approver_role: String,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(LedgerState::default()),
            approver_role: PostingConfig::default().approver_role,
        }
    }

    pub fn with_approver_role(role: impl Into<String>) -> Self {
        Self {
            state: Mutex::new(LedgerState::default()),
            approver_role: role.into(),
        }
    }

    pub fn add_account(&self, account: Account) {
        let mut state = self.state.lock().expect("ledger state poisoned");
        state.accounts.insert(account.id, account);
    }

    pub fn close_period(&self, year: i32, month: u32) {
        let mut state = self.state.lock().expect("ledger state poisoned");
        state.closed_periods.insert(ClosedPeriod::new(year, month));
    }

    pub fn entry_count(&self) -> usize {
        let state = self.state.lock().expect("ledger state poisoned");
        state.entries.len()
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl LedgerRepository for InMemoryLedger {
    fn account(&self, id: AccountId) -> Result<Account> {
        let state = self.state.lock().expect("ledger state poisoned");
        state
            .accounts
            .get(&id)
            .cloned()
            .ok_or(LendingError::AccountNotFound { account_id: id })
    }

    fn is_period_closed(&self, date: NaiveDate) -> Result<bool> {
        let state = self.state.lock().expect("ledger state poisoned");
        Ok(state.closed_periods.contains(&ClosedPeriod::of_date(date)))
    }

    fn insert_journal_entry(&self, entry: &JournalEntry) -> Result<EntryId> {
        let mut state = self.state.lock().expect("ledger state poisoned");

        // period re-check under the same lock as the insert: a close that
        // landed after the poster's validation is still caught here
        let period = ClosedPeriod::of_date(entry.entry_date);
        if entry.approved_by.is_none() && state.closed_periods.contains(&period) {
            return Err(LendingError::PeriodClosed {
                year: period.year,
                month: period.month,
                required_role: self.approver_role.clone(),
            });
        }

        if entry.reference == JournalReferenceType::Reversal {
            let original_id =
                entry
                    .reference_id
                    .ok_or_else(|| LendingError::Repository {
                        message: "reversal entry without original reference".to_string(),
                    })?;
            let original =
                state
                    .entries
                    .get_mut(&original_id)
                    .ok_or(LendingError::EntryNotFound { entry_id: original_id })?;
            if original.status == EntryStatus::Reversed {
                return Err(LendingError::EntryAlreadyReversed { entry_id: original_id });
            }
            original.mark_reversed()?;
        }

        state.entries.insert(entry.id, entry.clone());
        Ok(entry.id)
    }

    fn find_journal_entry(&self, id: EntryId) -> Result<JournalEntry> {
        let state = self.state.lock().expect("ledger state poisoned");
        state
            .entries
            .get(&id)
            .cloned()
            .ok_or(LendingError::EntryNotFound { entry_id: id })
    }

    fn highest_reference_for_prefix(&self, prefix: &str) -> Result<Option<String>> {
        let state = self.state.lock().expect("ledger state poisoned");
        Ok(state
            .references
            .iter()
            .filter(|r| r.starts_with(prefix))
            .next_back()
            .cloned())
    }

    fn claim_reference(&self, reference: &str) -> Result<()> {
        let mut state = self.state.lock().expect("ledger state poisoned");
        if !state.references.insert(reference.to_string()) {
            return Err(LendingError::ReferenceCollision {
                reference: reference.to_string(),
            });
        }
        Ok(())
    }
}
