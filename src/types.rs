use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Money;

/// unique identifier for a loan
pub type LoanId = Uuid;

/// unique identifier for a ledger account
pub type AccountId = Uuid;

/// unique identifier for a journal entry
pub type EntryId = Uuid;

/// interest regime for a loan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterestType {
    /// interest computed once on the original principal for the full term
    Flat,
    /// interest computed each period on the outstanding principal
    Reducing,
}

/// loan status derived from outstanding balances
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoanStatus {
    /// balances outstanding, collections ongoing
    Active,
    /// all three outstanding balances at zero
    Settled,
}

/// what a journal entry records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JournalReferenceType {
    Disbursement,
    Repayment,
    Expense,
    Transfer,
    Injection,
    Adjustment,
    Reversal,
    WriteOff,
}

/// the three balances a repayment is applied against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct OutstandingBalances {
    pub penalty: Money,
    pub interest: Money,
    pub principal: Money,
}

impl OutstandingBalances {
    pub fn new(penalty: Money, interest: Money, principal: Money) -> Self {
        Self { penalty, interest, principal }
    }

    pub fn total(&self) -> Money {
        self.penalty + self.interest + self.principal
    }

    pub fn is_settled(&self) -> bool {
        self.penalty.is_zero() && self.interest.is_zero() && self.principal.is_zero()
    }
}
