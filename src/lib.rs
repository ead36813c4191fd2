pub mod config;
pub mod decimal;
pub mod errors;
pub mod events;
pub mod ledger;
pub mod loan;
pub mod payments;
pub mod types;

// re-export key types
pub use config::PostingConfig;
pub use decimal::{Money, Rate};
pub use errors::{LendingError, Result};
pub use events::{Event, EventStore};
pub use ledger::{
    parse_reference, Account, BackdateApproval, ClosedPeriod, EntryStatus, InMemoryLedger,
    JournalEntry, JournalLine, LedgerPoster, LedgerRepository, LineInput, PostingReceipt,
    PostingRequest, ReferenceGenerator,
};
pub use loan::Loan;
pub use payments::{
    allocate_repayment, amortize, recalculate_schedule, AmortizationResult, RepaymentAllocation,
    ScheduleEntry,
};
pub use types::{
    AccountId, EntryId, InterestType, JournalReferenceType, LoanId, LoanStatus,
    OutstandingBalances,
};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
