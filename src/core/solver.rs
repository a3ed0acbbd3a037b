use serde::Serialize;

use super::engine::project;
use super::types::{Config, Infeasibility, YearlySnapshot};

/// Extra-payment candidates tried when the caller does not supply a ladder.
pub const DEFAULT_EXTRA_PAYMENT_LADDER: [f64; 6] = [0.0, 100.0, 250.0, 500.0, 1_000.0, 2_000.0];

/// Outcome of one full projection run with a candidate extra monthly payment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtraPaymentOutcome {
    pub extra_monthly_payment: f64,
    pub final_buying: f64,
    pub final_renting: f64,
    pub payoff_year: Option<u32>,
    pub break_even_year: Option<u32>,
}

/// Runs the projection once per ladder entry and ranks the outcomes by final
/// buying net worth, descending. Each candidate is an independent run on its
/// own modified config. Candidates whose larger payment fails the
/// affordability gate are dropped; if every candidate fails, the first
/// failure is returned.
pub fn compare_extra_payments(
    config: &Config,
    ladder: &[f64],
) -> Result<Vec<ExtraPaymentOutcome>, Infeasibility> {
    if ladder.is_empty() {
        return Ok(Vec::new());
    }

    let mut outcomes = Vec::with_capacity(ladder.len());
    let mut first_failure = None;
    for &extra_monthly_payment in ladder {
        let mut candidate = config.clone();
        candidate.extra_monthly_payment = extra_monthly_payment;
        match project(&candidate) {
            Ok(years) => outcomes.push(outcome_from(extra_monthly_payment, &years)),
            Err(err) => {
                if first_failure.is_none() {
                    first_failure = Some(err);
                }
            }
        }
    }

    match (outcomes.is_empty(), first_failure) {
        (true, Some(err)) => Err(err),
        _ => {
            outcomes.sort_by(|a, b| b.final_buying.total_cmp(&a.final_buying));
            Ok(outcomes)
        }
    }
}

/// First year the buying track overtakes the renting track, if it ever does.
pub fn break_even_year(years: &[YearlySnapshot]) -> Option<u32> {
    years.iter().find(|s| s.buying > s.renting).map(|s| s.year)
}

/// First year the loan balance is fully retired, if within the horizon.
pub fn payoff_year(years: &[YearlySnapshot]) -> Option<u32> {
    years.iter().find(|s| s.remaining_loan == 0.0).map(|s| s.year)
}

fn outcome_from(extra_monthly_payment: f64, years: &[YearlySnapshot]) -> ExtraPaymentOutcome {
    let last = years.last();
    ExtraPaymentOutcome {
        extra_monthly_payment,
        final_buying: last.map(|s| s.buying).unwrap_or(0.0),
        final_renting: last.map(|s| s.renting).unwrap_or(0.0),
        payoff_year: payoff_year(years),
        break_even_year: break_even_year(years),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PmiEquityBasis;

    fn sample_config() -> Config {
        Config {
            annual_salary_before_tax: 350_000.0,
            effective_tax_rate: 40.0,
            standard_deduction: 14_600.0,
            initial_investment: 1_000_000.0,
            monthly_misc_expenses: 1_500.0,
            home_price: 700_000.0,
            down_payment_percent: 20.0,
            effective_mortgage_rate: 6.5,
            mortgage_years: 30,
            pmi_rate: 0.5,
            property_tax_rate: 1.2,
            mello_roos_tax_rate: 0.1,
            closing_cost_percent: 1.0,
            annual_maintenance_rate: 1.0,
            monthly_hoa_fee: 0.0,
            monthly_home_insurance: 150.0,
            monthly_rent: 2_000.0,
            monthly_rental_income: 0.0,
            rent_deposit: 4_000.0,
            moving_cost_buying: 2_000.0,
            moving_cost_renting: 1_000.0,
            monthly_renter_insurance: 20.0,
            monthly_rent_utilities: 50.0,
            monthly_property_utilities: 250.0,
            monthly_quality_of_life: 500.0,
            home_appreciation: 4.5,
            investment_return: 8.0,
            rent_increase: 3.0,
            salary_growth_rate: 2.0,
            inflation_rate: 2.5,
            property_tax_assessment_cap: 2.0,
            mortgage_interest_deduction_cap: 750_000.0,
            x_axis_years: 40,
            pmi_equity_basis: PmiEquityBasis::OriginalPrice,
            extra_monthly_payment: 0.0,
        }
    }

    #[test]
    fn outcomes_are_ranked_by_final_buying_net_worth() {
        let config = sample_config();
        let outcomes = compare_extra_payments(&config, &DEFAULT_EXTRA_PAYMENT_LADDER)
            .expect("feasible config");

        assert_eq!(outcomes.len(), DEFAULT_EXTRA_PAYMENT_LADDER.len());
        for pair in outcomes.windows(2) {
            assert!(pair[0].final_buying >= pair[1].final_buying);
        }
    }

    #[test]
    fn larger_extra_payment_never_delays_payoff() {
        let config = sample_config();
        let outcomes =
            compare_extra_payments(&config, &[0.0, 500.0, 2_000.0]).expect("feasible config");

        let payoff_for = |extra: f64| {
            outcomes
                .iter()
                .find(|o| o.extra_monthly_payment == extra)
                .and_then(|o| o.payoff_year)
                .expect("loan pays off within horizon")
        };
        assert!(payoff_for(2_000.0) <= payoff_for(500.0));
        assert!(payoff_for(500.0) <= payoff_for(0.0));
    }

    #[test]
    fn break_even_year_is_stable_across_reruns() {
        let config = sample_config();
        let first = project(&config).expect("feasible");
        let second = project(&config).expect("feasible");
        assert_eq!(break_even_year(&first), break_even_year(&second));
    }

    #[test]
    fn infeasible_base_config_propagates_the_error() {
        let mut config = sample_config();
        config.initial_investment = 10_000.0;

        let err = compare_extra_payments(&config, &DEFAULT_EXTRA_PAYMENT_LADDER)
            .expect_err("gate must trip for every candidate");
        assert!(matches!(
            err,
            Infeasibility::InsufficientUpfrontCapital { .. }
        ));
    }

    #[test]
    fn unaffordable_candidates_are_dropped_from_the_ranking() {
        let mut config = sample_config();
        // Leave just enough monthly headroom that a huge extra payment trips
        // the income gate while the base payment passes.
        config.annual_salary_before_tax = 150_000.0;

        let outcomes =
            compare_extra_payments(&config, &[0.0, 50_000.0]).expect("base candidate survives");
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].extra_monthly_payment, 0.0);
    }

    #[test]
    fn empty_ladder_yields_no_outcomes() {
        let config = sample_config();
        let outcomes = compare_extra_payments(&config, &[]).expect("empty ladder is valid");
        assert!(outcomes.is_empty());
    }
}
