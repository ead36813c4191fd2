pub mod poster;
pub mod reference;
pub mod repository;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::decimal::Money;
use crate::errors::{LendingError, Result};
use crate::types::{AccountId, EntryId, JournalReferenceType};

pub use poster::{BackdateApproval, LedgerPoster, LineInput, PostingReceipt, PostingRequest};
pub use reference::{parse_reference, ReferenceGenerator, ReferenceParts};
pub use repository::{InMemoryLedger, LedgerRepository};

/// a ledger account a journal line can post against
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub code: String,
    pub name: String,
}

/// one line of a journal entry; exactly one side carries an amount
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JournalLine {
    pub account_id: AccountId,
    pub debit: Money,
    pub credit: Money,
}

impl JournalLine {
    pub fn debit(account_id: AccountId, amount: Money) -> Self {
        Self { account_id, debit: amount, credit: Money::ZERO }
    }

    pub fn credit(account_id: AccountId, amount: Money) -> Self {
        Self { account_id, debit: Money::ZERO, credit: amount }
    }

    /// exactly one positive side, the other zero
    pub fn is_well_formed(&self) -> bool {
        (self.debit.is_positive() && self.credit.is_zero())
            || (self.credit.is_positive() && self.debit.is_zero())
    }

    /// the reversing line: debit and credit swapped
    pub fn swapped(&self) -> Self {
        Self {
            account_id: self.account_id,
            debit: self.credit,
            credit: self.debit,
        }
    }
}

/// journal entry lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryStatus {
    Draft,
    Validated,
    Posted,
    /// terminal; reached only by posting a paired reversal entry
    Reversed,
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntryStatus::Draft => "draft",
            EntryStatus::Validated => "validated",
            EntryStatus::Posted => "posted",
            EntryStatus::Reversed => "reversed",
        };
        write!(f, "{name}")
    }
}

/// a double-entry journal entry; immutable once posted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: EntryId,
    pub reference: JournalReferenceType,
    pub reference_id: Option<EntryId>,
    pub description: String,
    pub entry_date: NaiveDate,
    pub posted_by: String,
    pub posted_at: DateTime<Utc>,
    /// present when governance approval cleared a backdate or closed period
    pub approved_by: Option<String>,
    pub status: EntryStatus,
    pub lines: Vec<JournalLine>,
}

impl JournalEntry {
    pub fn total_debits(&self) -> Money {
        self.lines.iter().map(|l| l.debit).fold(Money::ZERO, |acc, x| acc + x)
    }

    pub fn total_credits(&self) -> Money {
        self.lines.iter().map(|l| l.credit).fold(Money::ZERO, |acc, x| acc + x)
    }

    pub fn is_balanced(&self) -> bool {
        self.total_debits() == self.total_credits()
    }

    pub fn mark_validated(&mut self) -> Result<()> {
        self.transition(EntryStatus::Draft, EntryStatus::Validated)
    }

    pub fn mark_posted(&mut self) -> Result<()> {
        self.transition(EntryStatus::Validated, EntryStatus::Posted)
    }

    pub fn mark_reversed(&mut self) -> Result<()> {
        self.transition(EntryStatus::Posted, EntryStatus::Reversed)
    }

    fn transition(&mut self, from: EntryStatus, to: EntryStatus) -> Result<()> {
        if self.status != from {
            return Err(LendingError::InvalidEntryStatus {
                current: self.status.to_string(),
                expected: from.to_string(),
            });
        }
        self.status = to;
        Ok(())
    }
}

/// a year-month with posting locked; consulted, never mutated, by the poster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClosedPeriod {
    pub year: i32,
    pub month: u32,
}

impl ClosedPeriod {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    pub fn of_date(date: NaiveDate) -> Self {
        Self { year: date.year(), month: date.month() }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}
