use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal::{compound_factor, Money, Rate};
use crate::errors::{LendingError, Result};
use crate::types::InterestType;

/// one month of an amortization schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub month: u32,
    pub installment: Money,
    pub principal_component: Money,
    pub interest_component: Money,
    pub balance: Money,
}

/// installment, totals and the full per-month schedule for a loan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationResult {
    pub installment: Money,
    pub total_interest: Money,
    pub total_payable: Money,
    pub schedule: Vec<ScheduleEntry>,
}

/// compute installment, totals and the monthly schedule for a loan
///
/// `rate` is per period. Figures are carried at full precision and rounded
/// to cents only as they land in the result.
pub fn amortize(
    principal: Money,
    rate: Rate,
    term_months: u32,
    interest_type: InterestType,
) -> Result<AmortizationResult> {
    if !principal.is_positive() {
        return Err(LendingError::InvalidPrincipal { amount: principal });
    }
    if term_months == 0 {
        return Err(LendingError::InvalidTerm { months: term_months });
    }
    if rate.is_negative() {
        return Err(LendingError::InvalidRate { rate });
    }

    let result = match interest_type {
        InterestType::Flat => amortize_flat(principal, rate, term_months),
        InterestType::Reducing => amortize_reducing(principal, rate, term_months),
    };

    reconcile(&result, principal, term_months);
    Ok(result)
}

/// flat: interest on the original principal for the whole term
fn amortize_flat(principal: Money, rate: Rate, term_months: u32) -> AmortizationResult {
    let n = Decimal::from(term_months);
    let total_interest = principal * rate.as_fraction() * n;
    let total_payable = principal + total_interest;
    let installment = total_payable / n;
    let principal_share = principal / n;
    let interest_share = total_interest / n;

    let mut schedule = Vec::with_capacity(term_months as usize);
    let mut balance = total_payable;

    for month in 1..=term_months {
        // balance tracks total payable, down one installment per month
        balance = (balance - installment).max(Money::ZERO);
        schedule.push(ScheduleEntry {
            month,
            installment: installment.to_cents(),
            principal_component: principal_share.to_cents(),
            interest_component: interest_share.to_cents(),
            balance: balance.to_cents(),
        });
    }

    close_final_entry(&mut schedule, principal);

    AmortizationResult {
        installment: installment.to_cents(),
        total_interest: total_interest.to_cents(),
        total_payable: total_payable.to_cents(),
        schedule,
    }
}

/// reducing balance: interest each month on the outstanding principal
fn amortize_reducing(principal: Money, rate: Rate, term_months: u32) -> AmortizationResult {
    let n = Decimal::from(term_months);
    let r = rate.as_fraction();

    // zero-rate loans are valid: equal principal slices, no interest
    let installment = if rate.is_zero() {
        principal / n
    } else {
        let factor = compound_factor(rate, term_months);
        principal * (r * factor) / (factor - Decimal::ONE)
    };

    let total_payable = installment * n;
    let total_interest = total_payable - principal;

    let mut schedule = Vec::with_capacity(term_months as usize);
    let mut balance = principal;

    for month in 1..=term_months {
        let interest = balance * r;
        let principal_part = (installment - interest).min(balance);
        balance = (balance - principal_part).max(Money::ZERO);
        schedule.push(ScheduleEntry {
            month,
            installment: installment.to_cents(),
            principal_component: principal_part.to_cents(),
            interest_component: interest.to_cents(),
            balance: balance.to_cents(),
        });
    }

    close_final_entry(&mut schedule, principal);

    AmortizationResult {
        installment: installment.to_cents(),
        total_interest: total_interest.to_cents(),
        total_payable: total_payable.to_cents(),
        schedule,
    }
}

/// absorb per-entry rounding drift into the last entry so the schedule
/// closes at exactly zero and principal components sum to the principal
fn close_final_entry(schedule: &mut [ScheduleEntry], principal: Money) {
    let paid_before_last: Money = schedule[..schedule.len() - 1]
        .iter()
        .map(|e| e.principal_component)
        .fold(Money::ZERO, |acc, x| acc + x);

    if let Some(last) = schedule.last_mut() {
        let residual = principal - paid_before_last - last.principal_component;
        if !residual.is_zero() && residual.abs() < Money::ONE {
            last.principal_component += residual;
            last.installment += residual;
        }
        last.balance = Money::ZERO;
    }
}

/// schedule-level sanity check: a failure here is a logic bug, not bad input
fn reconcile(result: &AmortizationResult, principal: Money, term_months: u32) {
    let principal_sum: Money = result
        .schedule
        .iter()
        .map(|e| e.principal_component)
        .fold(Money::ZERO, |acc, x| acc + x);
    let tolerance = Money::from_minor(term_months as i64, 2);
    let drift = (principal_sum - principal).abs();

    if drift > tolerance || !result.schedule[result.schedule.len() - 1].balance.is_zero() {
        tracing::error!(
            %principal,
            %principal_sum,
            term_months,
            "amortization schedule failed to reconcile"
        );
        debug_assert!(false, "amortization schedule failed to reconcile");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_flat_schedule() {
        let result = amortize(
            Money::from_major(100_000),
            Rate::from_percentage(5),
            12,
            InterestType::Flat,
        )
        .unwrap();

        assert_eq!(result.total_interest, Money::from_major(60_000));
        assert_eq!(result.total_payable, Money::from_major(160_000));
        assert_eq!(result.installment, Money::from_str_exact("13333.33").unwrap());
        assert_eq!(result.schedule.len(), 12);
        assert_eq!(
            result.schedule[0].principal_component,
            Money::from_str_exact("8333.33").unwrap()
        );
        assert_eq!(result.schedule[11].balance, Money::ZERO);
    }

    #[test]
    fn test_reducing_schedule() {
        let result = amortize(
            Money::from_major(100_000),
            Rate::from_percentage(5),
            12,
            InterestType::Reducing,
        )
        .unwrap();

        assert_eq!(result.installment, Money::from_str_exact("11282.54").unwrap());
        assert_eq!(result.schedule.len(), 12);

        // first month interest on the full principal
        assert_eq!(
            result.schedule[0].interest_component,
            Money::from_major(5_000)
        );
        assert_eq!(result.schedule[11].balance, Money::ZERO);

        // interest declines every month
        for i in 1..result.schedule.len() {
            assert!(
                result.schedule[i].interest_component < result.schedule[i - 1].interest_component
            );
        }

        // principal components reconcile to the principal
        let principal_sum: Money = result
            .schedule
            .iter()
            .map(|e| e.principal_component)
            .fold(Money::ZERO, |acc, x| acc + x);
        assert_eq!(principal_sum, Money::from_major(100_000));
    }

    #[test]
    fn test_reducing_zero_rate() {
        let result = amortize(
            Money::from_major(12_000),
            Rate::ZERO,
            12,
            InterestType::Reducing,
        )
        .unwrap();

        assert_eq!(result.installment, Money::from_major(1_000));
        assert_eq!(result.total_interest, Money::ZERO);
        assert_eq!(result.total_payable, Money::from_major(12_000));
        for entry in &result.schedule {
            assert_eq!(entry.interest_component, Money::ZERO);
        }
        assert_eq!(result.schedule[11].balance, Money::ZERO);
    }

    #[test]
    fn test_flat_zero_rate() {
        let result = amortize(
            Money::from_major(6_000),
            Rate::ZERO,
            6,
            InterestType::Flat,
        )
        .unwrap();

        assert_eq!(result.total_interest, Money::ZERO);
        assert_eq!(result.installment, Money::from_major(1_000));
        assert_eq!(result.schedule[5].balance, Money::ZERO);
    }

    #[test]
    fn test_rejects_bad_inputs() {
        assert!(matches!(
            amortize(Money::ZERO, Rate::from_percentage(5), 12, InterestType::Flat),
            Err(LendingError::InvalidPrincipal { .. })
        ));
        assert!(matches!(
            amortize(Money::from_major(1_000), Rate::from_percentage(5), 0, InterestType::Flat),
            Err(LendingError::InvalidTerm { .. })
        ));
        assert!(matches!(
            amortize(
                Money::from_major(1_000),
                Rate::from_fraction(dec!(-0.01)),
                12,
                InterestType::Reducing,
            ),
            Err(LendingError::InvalidRate { .. })
        ));
    }

    #[test]
    fn test_deterministic() {
        let a = amortize(
            Money::from_major(250_000),
            Rate::from_percent_decimal(dec!(1.75)),
            36,
            InterestType::Reducing,
        )
        .unwrap();
        let b = amortize(
            Money::from_major(250_000),
            Rate::from_percent_decimal(dec!(1.75)),
            36,
            InterestType::Reducing,
        )
        .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_single_month_term() {
        let result = amortize(
            Money::from_major(1_000),
            Rate::from_percentage(10),
            1,
            InterestType::Reducing,
        )
        .unwrap();

        assert_eq!(result.installment, Money::from_major(1_100));
        assert_eq!(result.schedule.len(), 1);
        assert_eq!(result.schedule[0].principal_component, Money::from_major(1_000));
        assert_eq!(result.schedule[0].balance, Money::ZERO);
    }
}
