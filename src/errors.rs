use chrono::NaiveDate;
use thiserror::Error;

use crate::decimal::{Money, Rate};
use crate::types::{AccountId, EntryId};

#[derive(Error, Debug)]
pub enum LendingError {
    #[error("invalid principal: {amount}")]
    InvalidPrincipal {
        amount: Money,
    },

    #[error("invalid term: {months} months")]
    InvalidTerm {
        months: u32,
    },

    #[error("invalid interest rate: {rate}")]
    InvalidRate {
        rate: Rate,
    },

    #[error("invalid payment amount: {amount}")]
    InvalidPaymentAmount {
        amount: Money,
    },

    #[error("malformed reference: {reference}")]
    MalformedReference {
        reference: String,
    },

    #[error("unbalanced entry: debits {debits}, credits {credits}")]
    Unbalanced {
        debits: Money,
        credits: Money,
    },

    #[error("entry needs at least two lines, got {count}")]
    InsufficientLines {
        count: usize,
    },

    #[error("line for account {account_id} must carry exactly one of debit or credit, both positive-or-zero")]
    InvalidLine {
        account_id: AccountId,
    },

    #[error("period {year}-{month:02} is closed; approval by {required_role} required")]
    PeriodClosed {
        year: i32,
        month: u32,
        required_role: String,
    },

    #[error("entry dated {entry_date} is outside the {window_days}-day backdate window; approval by {required_role} required")]
    BackdateApprovalRequired {
        entry_date: NaiveDate,
        window_days: u32,
        required_role: String,
    },

    #[error("account not found: {account_id}")]
    AccountNotFound {
        account_id: AccountId,
    },

    #[error("journal entry not found: {entry_id}")]
    EntryNotFound {
        entry_id: EntryId,
    },

    #[error("journal entry already reversed: {entry_id}")]
    EntryAlreadyReversed {
        entry_id: EntryId,
    },

    #[error("invalid entry status: current {current}, expected {expected}")]
    InvalidEntryStatus {
        current: String,
        expected: String,
    },

    #[error("reference already taken: {reference}")]
    ReferenceCollision {
        reference: String,
    },

    #[error("reference sequence exhausted for prefix {prefix}")]
    ReferenceExhausted {
        prefix: String,
    },

    #[error("repository error: {message}")]
    Repository {
        message: String,
    },

    #[error("calculation error: {message}")]
    CalculationError {
        message: String,
    },
}

impl LendingError {
    /// transient failures may succeed on retry; the rest need caller changes
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            LendingError::Repository { .. }
                | LendingError::ReferenceCollision { .. }
                | LendingError::ReferenceExhausted { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, LendingError>;
