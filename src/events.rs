use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::types::{EntryId, JournalReferenceType, LoanId};

/// all events emitted by the lending core
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    // loan lifecycle events
    LoanDisbursed {
        loan_id: LoanId,
        reference: String,
        principal: Money,
        timestamp: DateTime<Utc>,
    },
    LoanSettled {
        loan_id: LoanId,
        final_payment: Money,
        timestamp: DateTime<Utc>,
    },

    // collection events
    RepaymentAllocated {
        loan_id: LoanId,
        amount: Money,
        to_penalty: Money,
        to_interest: Money,
        to_principal: Money,
        overpayment: Money,
        timestamp: DateTime<Utc>,
    },
    PenaltyAssessed {
        loan_id: LoanId,
        amount: Money,
        timestamp: DateTime<Utc>,
    },
    InstallmentCharged {
        loan_id: LoanId,
        month: u32,
        interest_portion: Money,
        timestamp: DateTime<Utc>,
    },
    ScheduleRecalculated {
        loan_id: LoanId,
        new_outstanding: Money,
        schedule_months: u32,
        timestamp: DateTime<Utc>,
    },

    // ledger events
    EntryPosted {
        entry_id: EntryId,
        reference: JournalReferenceType,
        entry_date: NaiveDate,
        debits: Money,
        credits: Money,
        timestamp: DateTime<Utc>,
    },
    EntryReversed {
        entry_id: EntryId,
        original_entry_id: EntryId,
        reason: String,
        timestamp: DateTime<Utc>,
    },
}

/// event store for collecting events during operations
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<Event>,
}

impl EventStore {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
        }
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
