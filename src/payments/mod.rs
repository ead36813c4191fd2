pub mod amortization;
pub mod recalculation;
pub mod waterfall;

pub use amortization::{amortize, AmortizationResult, ScheduleEntry};
pub use recalculation::recalculate_schedule;
pub use waterfall::{allocate_repayment, RepaymentAllocation};
