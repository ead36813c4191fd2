use chrono::NaiveDate;
use hourglass_rs::SafeTimeProvider;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::{Money, Rate};
use crate::errors::{LendingError, Result};
use crate::events::{Event, EventStore};
use crate::ledger::reference::parse_reference;
use crate::payments::amortization::{amortize, AmortizationResult, ScheduleEntry};
use crate::payments::recalculation::recalculate_schedule;
use crate::payments::waterfall::{allocate_repayment, RepaymentAllocation};
use crate::types::{InterestType, LoanId, LoanStatus, OutstandingBalances};

/// a disbursed loan and its outstanding balances
///
/// Balances move only through [`Loan::charge_installment`],
/// [`Loan::assess_penalty`] and [`Loan::apply_repayment`]; the loan settles
/// itself when all three reach zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loan {
    pub loan_id: LoanId,
    pub reference: String,
    pub principal: Money,
    pub interest_rate: Rate,
    pub term_months: u32,
    pub interest_type: InterestType,
    pub disbursement_date: NaiveDate,
    pub outstanding: OutstandingBalances,
    pub status: LoanStatus,
}

impl Loan {
    /// create a loan at disbursement, returning it with its schedule
    ///
    /// Terms are validated by running them through the amortization engine;
    /// the reference must be format-valid.
    pub fn disburse(
        reference: String,
        principal: Money,
        interest_rate: Rate,
        term_months: u32,
        interest_type: InterestType,
        disbursement_date: NaiveDate,
        time: &SafeTimeProvider,
        events: &mut EventStore,
    ) -> Result<(Self, AmortizationResult)> {
        parse_reference(&reference)?;
        let amortization = amortize(principal, interest_rate, term_months, interest_type)?;

        let loan = Self {
            loan_id: Uuid::new_v4(),
            reference: reference.clone(),
            principal,
            interest_rate,
            term_months,
            interest_type,
            disbursement_date,
            outstanding: OutstandingBalances::new(Money::ZERO, Money::ZERO, principal),
            status: LoanStatus::Active,
        };

        events.emit(Event::LoanDisbursed {
            loan_id: loan.loan_id,
            reference,
            principal,
            timestamp: time.now(),
        });

        Ok((loan, amortization))
    }

    /// accrue a schedule entry's interest into the outstanding balance at
    /// its due month
    pub fn charge_installment(
        &mut self,
        entry: &ScheduleEntry,
        time: &SafeTimeProvider,
        events: &mut EventStore,
    ) {
        self.outstanding.interest += entry.interest_component;
        events.emit(Event::InstallmentCharged {
            loan_id: self.loan_id,
            month: entry.month,
            interest_portion: entry.interest_component,
            timestamp: time.now(),
        });
    }

    /// add an overdue penalty charge
    pub fn assess_penalty(
        &mut self,
        amount: Money,
        time: &SafeTimeProvider,
        events: &mut EventStore,
    ) -> Result<()> {
        if !amount.is_positive() {
            return Err(LendingError::InvalidPaymentAmount { amount });
        }
        self.outstanding.penalty += amount;
        events.emit(Event::PenaltyAssessed {
            loan_id: self.loan_id,
            amount,
            timestamp: time.now(),
        });
        Ok(())
    }

    /// run a collection through the waterfall and apply the result
    pub fn apply_repayment(
        &mut self,
        amount: Money,
        time: &SafeTimeProvider,
        events: &mut EventStore,
    ) -> Result<RepaymentAllocation> {
        let allocation = allocate_repayment(amount, &self.outstanding)?;
        self.outstanding = allocation.remaining;

        events.emit(Event::RepaymentAllocated {
            loan_id: self.loan_id,
            amount,
            to_penalty: allocation.penalty_paid,
            to_interest: allocation.interest_paid,
            to_principal: allocation.principal_paid,
            overpayment: allocation.overpayment,
            timestamp: time.now(),
        });

        if self.outstanding.is_settled() && self.status == LoanStatus::Active {
            self.status = LoanStatus::Settled;
            events.emit(Event::LoanSettled {
                loan_id: self.loan_id,
                final_payment: amount,
                timestamp: time.now(),
            });
        }

        Ok(allocation)
    }

    /// rebuild the remaining schedule after a restructuring or a large
    /// out-of-band principal payment
    pub fn restructure_schedule(
        &self,
        original: &[ScheduleEntry],
        time: &SafeTimeProvider,
        events: &mut EventStore,
    ) -> Result<Vec<ScheduleEntry>> {
        let schedule = recalculate_schedule(
            original,
            self.outstanding.principal,
            self.interest_rate,
            self.term_months,
        )?;

        events.emit(Event::ScheduleRecalculated {
            loan_id: self.loan_id,
            new_outstanding: self.outstanding.principal,
            schedule_months: schedule.len() as u32,
            timestamp: time.now(),
        });

        Ok(schedule)
    }

    pub fn is_settled(&self) -> bool {
        self.status == LoanStatus::Settled
    }
}
