use serde::Serialize;

/// Which home value PMI eligibility is measured against. The original-price
/// basis means appreciation alone never removes PMI; only paid-down principal
/// does.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PmiEquityBasis {
    OriginalPrice,
    CurrentValue,
}

/// Full set of economic assumptions for one projection run. Rate fields hold
/// whole-number percents (6.5 means 6.5%) and are divided by 100 at point of
/// use; monetary fields are in currency units.
#[derive(Debug, Clone)]
pub struct Config {
    pub annual_salary_before_tax: f64,
    pub effective_tax_rate: f64,
    pub standard_deduction: f64,
    pub initial_investment: f64,
    pub monthly_misc_expenses: f64,
    pub home_price: f64,
    pub down_payment_percent: f64,
    pub effective_mortgage_rate: f64,
    pub mortgage_years: u32,
    pub pmi_rate: f64,
    pub property_tax_rate: f64,
    pub mello_roos_tax_rate: f64,
    pub closing_cost_percent: f64,
    pub annual_maintenance_rate: f64,
    pub monthly_hoa_fee: f64,
    pub monthly_home_insurance: f64,
    pub monthly_rent: f64,
    pub monthly_rental_income: f64,
    pub rent_deposit: f64,
    pub moving_cost_buying: f64,
    pub moving_cost_renting: f64,
    pub monthly_renter_insurance: f64,
    pub monthly_rent_utilities: f64,
    pub monthly_property_utilities: f64,
    pub monthly_quality_of_life: f64,
    pub home_appreciation: f64,
    pub investment_return: f64,
    pub rent_increase: f64,
    pub salary_growth_rate: f64,
    pub inflation_rate: f64,
    pub property_tax_assessment_cap: f64,
    pub mortgage_interest_deduction_cap: f64,
    pub x_axis_years: u32,
    pub pmi_equity_basis: PmiEquityBasis,
    pub extra_monthly_payment: f64,
}

impl Config {
    /// Number of simulated years; snapshots run 0..=horizon inclusive.
    pub fn horizon_years(&self) -> u32 {
        self.mortgage_years.max(self.x_axis_years)
    }
}

/// One year's complete financial state for both scenarios. Snapshot `year`
/// carries the state at the start of that year plus the flows scheduled
/// during it. Currency fields are rounded to the nearest whole unit at
/// emission; all internal accumulation stays unrounded.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearlySnapshot {
    pub year: u32,
    pub buying: f64,
    pub renting: f64,
    pub salary: f64,
    pub home_equity: f64,
    pub investments_buying: f64,
    pub investments_renting: f64,
    pub home_value: f64,
    pub remaining_loan: f64,
    pub yearly_principal_paid: f64,
    pub yearly_interest_paid: f64,
    pub monthly_payment: f64,
    pub available_monthly_investment: f64,
    pub monthly_rent: f64,
    pub annual_rent_costs: f64,
    pub monthly_rental_income: f64,
    pub yearly_tax_savings: f64,
    pub monthly_misc_expenses: f64,
}

/// Typed reasons a run cannot start. Either one aborts the projection before
/// any snapshot is produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind")]
pub enum Infeasibility {
    #[serde(rename_all = "camelCase")]
    InsufficientUpfrontCapital {
        required_upfront: f64,
        available_investment: f64,
    },
    #[serde(rename_all = "camelCase")]
    InsufficientMonthlyIncome {
        monthly_housing_costs: f64,
        monthly_misc_expenses: f64,
        monthly_take_home: f64,
    },
}

/// Principal/interest split of one simulated year of mortgage payments.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmortizationYear {
    pub interest_paid: f64,
    pub principal_paid: f64,
    pub ending_balance: f64,
}
