mod engine;
mod solver;
mod types;

pub use engine::project;
pub use solver::{
    DEFAULT_EXTRA_PAYMENT_LADDER, ExtraPaymentOutcome, break_even_year, compare_extra_payments,
    payoff_year,
};
pub use types::{AmortizationYear, Config, Infeasibility, PmiEquityBasis, YearlySnapshot};
