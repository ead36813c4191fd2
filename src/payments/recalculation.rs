use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, MathematicalOps};

use crate::decimal::{Money, Rate};
use crate::errors::{LendingError, Result};
use crate::payments::amortization::ScheduleEntry;

/// regenerate the remaining schedule after an out-of-band principal change
///
/// Entries already elapsed (running balance above the new outstanding) are
/// preserved untouched. The tail keeps the existing installment as a fixed
/// payment and re-solves the remaining term; the final entry closes the
/// balance to exactly zero, shrinking the last installment when needed.
pub fn recalculate_schedule(
    original: &[ScheduleEntry],
    new_principal_outstanding: Money,
    rate: Rate,
    original_term: u32,
) -> Result<Vec<ScheduleEntry>> {
    if new_principal_outstanding.is_negative() {
        return Err(LendingError::InvalidPrincipal { amount: new_principal_outstanding });
    }
    if rate.is_negative() {
        return Err(LendingError::InvalidRate { rate });
    }
    // nothing to re-solve without a rate or a balance
    if rate.is_zero() || new_principal_outstanding.is_zero() {
        return Ok(original.to_vec());
    }

    if original.len() != original_term as usize {
        return Err(LendingError::CalculationError {
            message: format!(
                "original schedule has {} entries for a {original_term}-month term",
                original.len()
            ),
        });
    }

    let installment = original
        .first()
        .map(|entry| entry.installment)
        .ok_or_else(|| LendingError::CalculationError {
            message: "cannot recalculate an empty schedule".to_string(),
        })?;

    let prefix: Vec<ScheduleEntry> = original
        .iter()
        .take_while(|entry| entry.balance > new_principal_outstanding)
        .cloned()
        .collect();

    let remaining_months =
        solve_remaining_months(new_principal_outstanding, rate, installment)?;

    let mut schedule = prefix;
    let start_month = schedule.len() as u32;
    let r = rate.as_fraction();
    let mut balance = new_principal_outstanding;

    for offset in 1..=remaining_months {
        let month = start_month + offset;
        let interest = balance * r;
        let principal_part = installment - interest;

        if offset == remaining_months || principal_part >= balance {
            // close out: pay whatever principal is left, nothing dangles
            schedule.push(ScheduleEntry {
                month,
                installment: (balance + interest).to_cents(),
                principal_component: balance.to_cents(),
                interest_component: interest.to_cents(),
                balance: Money::ZERO,
            });
            break;
        }

        balance -= principal_part;
        schedule.push(ScheduleEntry {
            month,
            installment: installment.to_cents(),
            principal_component: principal_part.to_cents(),
            interest_component: interest.to_cents(),
            balance: balance.to_cents(),
        });
    }

    Ok(schedule)
}

/// closed-form remaining term at a fixed payment, rounded up
fn solve_remaining_months(balance: Money, rate: Rate, installment: Money) -> Result<u32> {
    let first_month_interest = balance * rate.as_fraction();
    if installment <= first_month_interest {
        return Err(LendingError::CalculationError {
            message: format!(
                "installment {installment} does not cover interest {} on balance {balance}",
                first_month_interest.to_cents()
            ),
        });
    }

    let ratio = balance.as_decimal() * rate.as_fraction() / installment.as_decimal()
        + Decimal::ONE;
    let growth = Decimal::ONE + rate.as_fraction();
    let months = (ratio.ln() / growth.ln()).ceil();

    months
        .to_u32()
        .filter(|m| *m > 0)
        .ok_or_else(|| LendingError::CalculationError {
            message: format!("remaining term solve produced {months} months"),
        })
}
