use chrono::{Datelike, NaiveDate};
use hourglass_rs::SafeTimeProvider;
use uuid::Uuid;

use crate::config::PostingConfig;
use crate::decimal::Money;
use crate::errors::{LendingError, Result};
use crate::events::{Event, EventStore};
use crate::ledger::repository::LedgerRepository;
use crate::ledger::{EntryStatus, JournalEntry, JournalLine};
use crate::types::{AccountId, EntryId, JournalReferenceType};

/// governance sign-off that clears backdate and closed-period controls
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackdateApproval {
    pub approved_by: String,
    pub role: String,
}

/// one requested journal line, before validation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineInput {
    pub account_id: AccountId,
    pub debit: Money,
    pub credit: Money,
}

impl LineInput {
    pub fn debit(account_id: AccountId, amount: Money) -> Self {
        Self { account_id, debit: amount, credit: Money::ZERO }
    }

    pub fn credit(account_id: AccountId, amount: Money) -> Self {
        Self { account_id, debit: Money::ZERO, credit: amount }
    }
}

/// journal posting request
#[derive(Debug, Clone, PartialEq)]
pub struct PostingRequest {
    pub reference: JournalReferenceType,
    pub reference_id: Option<EntryId>,
    pub description: String,
    pub lines: Vec<LineInput>,
    pub posted_by: String,
    /// defaults to today when absent
    pub entry_date: Option<NaiveDate>,
    pub approval: Option<BackdateApproval>,
}

/// what the caller gets back from a successful post
#[derive(Debug, Clone, PartialEq)]
pub struct PostingReceipt {
    pub entry_id: EntryId,
    pub reference: JournalReferenceType,
    pub entry_date: NaiveDate,
    pub total_debits: Money,
    pub total_credits: Money,
}

/// validates and atomically commits double-entry journal entries
pub struct LedgerPoster<'a, R: LedgerRepository> {
    repository: &'a R,
    config: PostingConfig,
    time: &'a SafeTimeProvider,
}

impl<'a, R: LedgerRepository> LedgerPoster<'a, R> {
    pub fn new(repository: &'a R, config: PostingConfig, time: &'a SafeTimeProvider) -> Self {
        Self { repository, config, time }
    }

    /// validate and post an entry: structure, balance, date governance,
    /// account existence, then one atomic insert
    pub fn post(&self, request: PostingRequest, events: &mut EventStore) -> Result<PostingReceipt> {
        let today = self.time.now().date_naive();
        let entry_date = request.entry_date.unwrap_or(today);

        let lines = build_lines(&request.lines)?;
        let mut entry = JournalEntry {
            id: Uuid::new_v4(),
            reference: request.reference,
            reference_id: request.reference_id,
            description: request.description,
            entry_date,
            posted_by: request.posted_by,
            posted_at: self.time.now(),
            approved_by: request.approval.as_ref().map(|a| a.approved_by.clone()),
            status: EntryStatus::Draft,
            lines,
        };

        let debits = entry.total_debits();
        let credits = entry.total_credits();
        if debits != credits {
            return Err(LendingError::Unbalanced { debits, credits });
        }

        self.check_entry_date(entry_date, today, request.approval.as_ref())?;

        for line in &entry.lines {
            self.repository.account(line.account_id)?;
        }

        entry.mark_validated()?;
        entry.mark_posted()?;
        // the insert is the posting act; the repository re-checks period
        // closure inside the same transaction
        let entry_id = self.repository.insert_journal_entry(&entry)?;

        tracing::info!(
            %entry_id,
            reference = ?entry.reference,
            %entry_date,
            %debits,
            "journal entry posted"
        );
        events.emit(Event::EntryPosted {
            entry_id,
            reference: entry.reference,
            entry_date,
            debits,
            credits,
            timestamp: self.time.now(),
        });

        Ok(PostingReceipt {
            entry_id,
            reference: entry.reference,
            entry_date,
            total_debits: debits,
            total_credits: credits,
        })
    }

    /// cancel a posted entry by posting its mirror image
    ///
    /// The original is never touched; a new entry tagged `Reversal` with
    /// every line's debit and credit swapped goes through the same atomic
    /// path, so cumulative balances self-correct without rewriting history.
    pub fn reverse(
        &self,
        original_entry_id: EntryId,
        reversed_by: &str,
        reason: &str,
        events: &mut EventStore,
    ) -> Result<PostingReceipt> {
        let original = self.repository.find_journal_entry(original_entry_id)?;

        if original.status == EntryStatus::Reversed {
            return Err(LendingError::EntryAlreadyReversed { entry_id: original_entry_id });
        }
        if original.status != EntryStatus::Posted {
            return Err(LendingError::InvalidEntryStatus {
                current: original.status.to_string(),
                expected: EntryStatus::Posted.to_string(),
            });
        }

        let lines = original
            .lines
            .iter()
            .map(|line| {
                let swapped = line.swapped();
                LineInput {
                    account_id: swapped.account_id,
                    debit: swapped.debit,
                    credit: swapped.credit,
                }
            })
            .collect();

        let receipt = self.post(
            PostingRequest {
                reference: JournalReferenceType::Reversal,
                reference_id: Some(original.id),
                description: format!("Reversal of entry {}: {reason}", original.id),
                lines,
                posted_by: reversed_by.to_string(),
                entry_date: None,
                approval: None,
            },
            events,
        )?;

        events.emit(Event::EntryReversed {
            entry_id: receipt.entry_id,
            original_entry_id: original.id,
            reason: reason.to_string(),
            timestamp: self.time.now(),
        });

        Ok(receipt)
    }

    fn check_entry_date(
        &self,
        entry_date: NaiveDate,
        today: NaiveDate,
        approval: Option<&BackdateApproval>,
    ) -> Result<()> {
        if approval.is_some() {
            return Ok(());
        }

        if self.repository.is_period_closed(entry_date)? {
            return Err(LendingError::PeriodClosed {
                year: entry_date.year(),
                month: entry_date.month(),
                required_role: self.config.approver_role.clone(),
            });
        }

        let days_back = (today - entry_date).num_days();
        if days_back > self.config.backdate_window_days as i64 {
            return Err(LendingError::BackdateApprovalRequired {
                entry_date,
                window_days: self.config.backdate_window_days,
                required_role: self.config.approver_role.clone(),
            });
        }

        Ok(())
    }
}

fn build_lines(inputs: &[LineInput]) -> Result<Vec<JournalLine>> {
    if inputs.len() < 2 {
        return Err(LendingError::InsufficientLines { count: inputs.len() });
    }

    inputs
        .iter()
        .map(|input| {
            let line = JournalLine {
                account_id: input.account_id,
                debit: input.debit.to_cents(),
                credit: input.credit.to_cents(),
            };
            if !line.is_well_formed() {
                return Err(LendingError::InvalidLine { account_id: input.account_id });
            }
            Ok(line)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::repository::InMemoryLedger;
    use crate::ledger::Account;
    use chrono::{TimeZone, Utc};
    use hourglass_rs::TimeSource;

    fn today() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 15, 9, 0, 0).unwrap()
    }

    fn ledger_with_accounts() -> (InMemoryLedger, AccountId, AccountId) {
        let ledger = InMemoryLedger::new();
        let cash = Uuid::new_v4();
        let portfolio = Uuid::new_v4();
        ledger.add_account(Account {
            id: cash,
            code: "1001".to_string(),
            name: "Cash on Hand".to_string(),
        });
        ledger.add_account(Account {
            id: portfolio,
            code: "1201".to_string(),
            name: "Loan Portfolio".to_string(),
        });
        (ledger, cash, portfolio)
    }

    fn disbursement_request(
        cash: AccountId,
        portfolio: AccountId,
        amount: Money,
    ) -> PostingRequest {
        PostingRequest {
            reference: JournalReferenceType::Disbursement,
            reference_id: None,
            description: "disbursement".to_string(),
            lines: vec![
                LineInput::debit(portfolio, amount),
                LineInput::credit(cash, amount),
            ],
            posted_by: "officer-1".to_string(),
            entry_date: None,
            approval: None,
        }
    }

    #[test]
    fn test_post_balanced_entry() {
        let (ledger, cash, portfolio) = ledger_with_accounts();
        let time = SafeTimeProvider::new(TimeSource::Test(today()));
        let poster = LedgerPoster::new(&ledger, PostingConfig::default(), &time);
        let mut events = EventStore::new();

        let receipt = poster
            .post(disbursement_request(cash, portfolio, Money::from_major(10_000)), &mut events)
            .unwrap();

        assert_eq!(receipt.total_debits, Money::from_major(10_000));
        assert_eq!(receipt.total_credits, Money::from_major(10_000));
        assert_eq!(receipt.entry_date, today().date_naive());

        let stored = ledger.find_journal_entry(receipt.entry_id).unwrap();
        assert_eq!(stored.status, EntryStatus::Posted);
        assert_eq!(stored.lines.len(), 2);
        assert!(matches!(events.events()[0], Event::EntryPosted { .. }));
    }

    #[test]
    fn test_unbalanced_entry_rejected() {
        let (ledger, cash, portfolio) = ledger_with_accounts();
        let time = SafeTimeProvider::new(TimeSource::Test(today()));
        let poster = LedgerPoster::new(&ledger, PostingConfig::default(), &time);
        let mut events = EventStore::new();

        let mut request = disbursement_request(cash, portfolio, Money::from_major(500));
        request.lines[1] = LineInput::credit(cash, Money::from_major(400));

        let result = poster.post(request, &mut events);
        match result {
            Err(LendingError::Unbalanced { debits, credits }) => {
                assert_eq!(debits, Money::from_major(500));
                assert_eq!(credits, Money::from_major(400));
            }
            other => panic!("expected Unbalanced, got {other:?}"),
        }
        assert_eq!(ledger.entry_count(), 0);
        assert!(events.events().is_empty());
    }

    #[test]
    fn test_backdate_outside_window_rejected() {
        let (ledger, cash, portfolio) = ledger_with_accounts();
        let time = SafeTimeProvider::new(TimeSource::Test(today()));
        let poster = LedgerPoster::new(&ledger, PostingConfig::default(), &time);
        let mut events = EventStore::new();

        let mut request = disbursement_request(cash, portfolio, Money::from_major(100));
        request.entry_date = Some(today().date_naive() - chrono::Duration::days(10));

        assert!(matches!(
            poster.post(request, &mut events),
            Err(LendingError::BackdateApprovalRequired { window_days: 3, .. })
        ));
    }

    #[test]
    fn test_backdate_inside_window_allowed() {
        let (ledger, cash, portfolio) = ledger_with_accounts();
        let time = SafeTimeProvider::new(TimeSource::Test(today()));
        let poster = LedgerPoster::new(&ledger, PostingConfig::default(), &time);
        let mut events = EventStore::new();

        let mut request = disbursement_request(cash, portfolio, Money::from_major(100));
        request.entry_date = Some(today().date_naive() - chrono::Duration::days(3));

        assert!(poster.post(request, &mut events).is_ok());
    }

    #[test]
    fn test_backdate_with_approval_allowed() {
        let (ledger, cash, portfolio) = ledger_with_accounts();
        let time = SafeTimeProvider::new(TimeSource::Test(today()));
        let poster = LedgerPoster::new(&ledger, PostingConfig::default(), &time);
        let mut events = EventStore::new();

        let mut request = disbursement_request(cash, portfolio, Money::from_major(100));
        request.entry_date = Some(today().date_naive() - chrono::Duration::days(10));
        request.approval = Some(BackdateApproval {
            approved_by: "supervisor-1".to_string(),
            role: "accounting supervisor".to_string(),
        });

        let receipt = poster.post(request, &mut events).unwrap();
        let stored = ledger.find_journal_entry(receipt.entry_id).unwrap();
        assert_eq!(stored.approved_by, Some("supervisor-1".to_string()));
    }

    #[test]
    fn test_closed_period_rejected_without_approval() {
        let (ledger, cash, portfolio) = ledger_with_accounts();
        ledger.close_period(2025, 12);
        let time = SafeTimeProvider::new(TimeSource::Test(today()));
        let poster = LedgerPoster::new(&ledger, PostingConfig::default(), &time);
        let mut events = EventStore::new();

        let mut request = disbursement_request(cash, portfolio, Money::from_major(100));
        request.entry_date = Some(NaiveDate::from_ymd_opt(2025, 12, 31).unwrap());

        assert!(matches!(
            poster.post(request.clone(), &mut events),
            Err(LendingError::PeriodClosed { year: 2025, month: 12, .. })
        ));

        request.approval = Some(BackdateApproval {
            approved_by: "supervisor-1".to_string(),
            role: "accounting supervisor".to_string(),
        });
        assert!(poster.post(request, &mut events).is_ok());
    }

    #[test]
    fn test_unknown_account_rejected() {
        let (ledger, cash, _) = ledger_with_accounts();
        let time = SafeTimeProvider::new(TimeSource::Test(today()));
        let poster = LedgerPoster::new(&ledger, PostingConfig::default(), &time);
        let mut events = EventStore::new();

        let request = disbursement_request(cash, Uuid::new_v4(), Money::from_major(100));
        assert!(matches!(
            poster.post(request, &mut events),
            Err(LendingError::AccountNotFound { .. })
        ));
        assert_eq!(ledger.entry_count(), 0);
    }

    #[test]
    fn test_single_line_rejected() {
        let (ledger, cash, _) = ledger_with_accounts();
        let time = SafeTimeProvider::new(TimeSource::Test(today()));
        let poster = LedgerPoster::new(&ledger, PostingConfig::default(), &time);
        let mut events = EventStore::new();

        let request = PostingRequest {
            reference: JournalReferenceType::Adjustment,
            reference_id: None,
            description: "half an entry".to_string(),
            lines: vec![LineInput::debit(cash, Money::from_major(100))],
            posted_by: "officer-1".to_string(),
            entry_date: None,
            approval: None,
        };
        assert!(matches!(
            poster.post(request, &mut events),
            Err(LendingError::InsufficientLines { count: 1 })
        ));
    }

    #[test]
    fn test_two_sided_line_rejected() {
        let (ledger, cash, portfolio) = ledger_with_accounts();
        let time = SafeTimeProvider::new(TimeSource::Test(today()));
        let poster = LedgerPoster::new(&ledger, PostingConfig::default(), &time);
        let mut events = EventStore::new();

        let mut request = disbursement_request(cash, portfolio, Money::from_major(100));
        request.lines[0] = LineInput {
            account_id: portfolio,
            debit: Money::from_major(100),
            credit: Money::from_major(100),
        };
        assert!(matches!(
            poster.post(request, &mut events),
            Err(LendingError::InvalidLine { .. })
        ));
    }

    #[test]
    fn test_reversal_swaps_every_line() {
        let (ledger, cash, portfolio) = ledger_with_accounts();
        let time = SafeTimeProvider::new(TimeSource::Test(today()));
        let poster = LedgerPoster::new(&ledger, PostingConfig::default(), &time);
        let mut events = EventStore::new();

        let receipt = poster
            .post(disbursement_request(cash, portfolio, Money::from_major(10_000)), &mut events)
            .unwrap();

        let reversal_receipt = poster
            .reverse(receipt.entry_id, "officer-2", "captured against wrong loan", &mut events)
            .unwrap();

        let original = ledger.find_journal_entry(receipt.entry_id).unwrap();
        let reversal = ledger.find_journal_entry(reversal_receipt.entry_id).unwrap();

        assert_eq!(original.status, EntryStatus::Reversed);
        assert_eq!(reversal.reference, JournalReferenceType::Reversal);
        assert_eq!(reversal.reference_id, Some(original.id));
        assert!(reversal.description.contains("captured against wrong loan"));

        for (original_line, reversed_line) in original.lines.iter().zip(&reversal.lines) {
            assert_eq!(reversed_line.debit, original_line.credit);
            assert_eq!(reversed_line.credit, original_line.debit);
            assert_eq!(reversed_line.account_id, original_line.account_id);
        }

        // reversing twice is refused
        assert!(matches!(
            poster.reverse(receipt.entry_id, "officer-2", "again", &mut events),
            Err(LendingError::EntryAlreadyReversed { .. })
        ));
    }

    #[test]
    fn test_reverse_missing_entry() {
        let (ledger, _, _) = ledger_with_accounts();
        let time = SafeTimeProvider::new(TimeSource::Test(today()));
        let poster = LedgerPoster::new(&ledger, PostingConfig::default(), &time);
        let mut events = EventStore::new();

        assert!(matches!(
            poster.reverse(Uuid::new_v4(), "officer-2", "nothing there", &mut events),
            Err(LendingError::EntryNotFound { .. })
        ));
    }
}
