use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::errors::{LendingError, Result};
use crate::types::OutstandingBalances;

/// how a cash payment was split across the outstanding balances
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RepaymentAllocation {
    pub penalty_paid: Money,
    pub interest_paid: Money,
    pub principal_paid: Money,
    pub overpayment: Money,
    pub remaining: OutstandingBalances,
    pub fully_paid: bool,
}

#[derive(Debug, Clone, Copy)]
enum WaterfallTier {
    Penalty,
    Interest,
    Principal,
}

// income recognition order is business policy, not configuration
const WATERFALL: [WaterfallTier; 3] = [
    WaterfallTier::Penalty,
    WaterfallTier::Interest,
    WaterfallTier::Principal,
];

/// split a payment across penalty, interest and principal, in that order
///
/// Each tier absorbs up to its outstanding balance; whatever survives the
/// principal tier is overpayment, whose disposition is the caller's policy.
pub fn allocate_repayment(
    amount: Money,
    outstanding: &OutstandingBalances,
) -> Result<RepaymentAllocation> {
    if !amount.is_positive() {
        return Err(LendingError::InvalidPaymentAmount { amount });
    }

    let fully_paid = amount >= outstanding.total();
    let mut remaining_balances = *outstanding;
    let mut available = amount;
    let mut penalty_paid = Money::ZERO;
    let mut interest_paid = Money::ZERO;
    let mut principal_paid = Money::ZERO;

    for tier in WATERFALL {
        let (balance, paid) = match tier {
            WaterfallTier::Penalty => (&mut remaining_balances.penalty, &mut penalty_paid),
            WaterfallTier::Interest => (&mut remaining_balances.interest, &mut interest_paid),
            WaterfallTier::Principal => (&mut remaining_balances.principal, &mut principal_paid),
        };

        let applied = available.min(*balance);
        *balance -= applied;
        *paid = applied;
        available -= applied;

        if available.is_zero() {
            break;
        }
    }

    let allocation = RepaymentAllocation {
        penalty_paid,
        interest_paid,
        principal_paid,
        overpayment: available,
        remaining: remaining_balances,
        fully_paid,
    };

    check_allocation(&allocation, amount, outstanding);
    Ok(allocation)
}

/// allocation identity check: a failure here is a logic bug, not bad input
fn check_allocation(
    allocation: &RepaymentAllocation,
    amount: Money,
    outstanding: &OutstandingBalances,
) {
    let applied = allocation.penalty_paid
        + allocation.interest_paid
        + allocation.principal_paid
        + allocation.overpayment;

    if applied != amount
        || allocation.penalty_paid > outstanding.penalty
        || allocation.interest_paid > outstanding.interest
        || allocation.principal_paid > outstanding.principal
    {
        tracing::error!(%amount, %applied, "repayment allocation failed identity check");
        debug_assert!(false, "repayment allocation failed identity check");
    }
}
