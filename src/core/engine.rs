use super::types::{AmortizationYear, Config, Infeasibility, PmiEquityBasis, YearlySnapshot};

/// Mutable per-year projection state. Owned by a single run and threaded
/// through the year loop; a snapshot reads it before it advances.
#[derive(Debug, Clone)]
struct YearState {
    salary: f64,
    monthly_rent: f64,
    monthly_rental_income: f64,
    home_value: f64,
    assessed_value: f64,
    loan_balance: f64,
    investments_buying: f64,
    investments_renting: f64,
    quality_of_life_accrued: f64,
    monthly_misc_expenses: f64,
    monthly_hoa_fee: f64,
    monthly_home_insurance: f64,
    monthly_property_utilities: f64,
    monthly_rent_utilities: f64,
    standard_deduction: f64,
}

/// Flows scheduled during one year, computed from pre-advance state.
#[derive(Debug, Clone, Copy)]
struct YearFlows {
    amortization: AmortizationYear,
    tax_savings: f64,
    net_owner_monthly: f64,
    buying_surplus_monthly: f64,
    renting_surplus_monthly: f64,
    monthly_renter_cost: f64,
}

/// Runs the full projection: affordability gate, then one snapshot per year
/// from 0 through max(mortgage term, display horizon). Identical configs
/// yield identical sequences.
pub fn project(config: &Config) -> Result<Vec<YearlySnapshot>, Infeasibility> {
    check_affordability(config)?;

    let down_payment = config.home_price * config.down_payment_percent / 100.0;
    let loan_origin = config.home_price - down_payment;
    let scheduled_payment = monthly_mortgage_payment(
        loan_origin,
        config.effective_mortgage_rate,
        config.mortgage_years,
    );

    let horizon = config.horizon_years();
    let mut snapshots = Vec::with_capacity(horizon as usize + 1);
    let mut state = initial_state(config);
    for year in 0..=horizon {
        let flows = year_flows(config, &state, scheduled_payment, loan_origin);
        snapshots.push(emit_snapshot(year, &state, &flows));
        state = advance_state(config, state, &flows);
    }
    Ok(snapshots)
}

fn check_affordability(config: &Config) -> Result<(), Infeasibility> {
    let down_payment = config.home_price * config.down_payment_percent / 100.0;
    let closing_costs = config.home_price * config.closing_cost_percent / 100.0;
    let required_upfront = down_payment + closing_costs + config.moving_cost_buying;
    if required_upfront > config.initial_investment {
        return Err(Infeasibility::InsufficientUpfrontCapital {
            required_upfront,
            available_investment: config.initial_investment,
        });
    }

    // Year-one figures only; later years are simulated, not re-validated.
    let loan_origin = config.home_price - down_payment;
    let payment = monthly_mortgage_payment(
        loan_origin,
        config.effective_mortgage_rate,
        config.mortgage_years,
    ) + effective_extra_payment(config, loan_origin);
    let property_tax = config.home_price * config.property_tax_rate / 100.0;
    let mello_roos_tax = config.home_price * config.mello_roos_tax_rate / 100.0;
    let maintenance = config.home_price * config.annual_maintenance_rate / 100.0;
    let pmi = monthly_pmi(config, config.home_price, loan_origin, loan_origin);
    let monthly_housing_costs = payment
        + property_tax / 12.0
        + mello_roos_tax / 12.0
        + config.monthly_home_insurance
        + maintenance / 12.0
        + pmi
        + config.monthly_property_utilities
        + config.monthly_hoa_fee;
    let monthly_take_home = monthly_take_home(config, config.annual_salary_before_tax);
    if monthly_housing_costs + config.monthly_misc_expenses > monthly_take_home {
        return Err(Infeasibility::InsufficientMonthlyIncome {
            monthly_housing_costs,
            monthly_misc_expenses: config.monthly_misc_expenses,
            monthly_take_home,
        });
    }
    Ok(())
}

fn initial_state(config: &Config) -> YearState {
    let down_payment = config.home_price * config.down_payment_percent / 100.0;
    let closing_costs = config.home_price * config.closing_cost_percent / 100.0;
    YearState {
        salary: config.annual_salary_before_tax,
        monthly_rent: config.monthly_rent,
        monthly_rental_income: config.monthly_rental_income,
        home_value: config.home_price,
        assessed_value: config.home_price,
        loan_balance: config.home_price - down_payment,
        investments_buying: config.initial_investment
            - down_payment
            - closing_costs
            - config.moving_cost_buying,
        investments_renting: config.initial_investment
            - config.rent_deposit
            - config.moving_cost_renting,
        quality_of_life_accrued: 0.0,
        monthly_misc_expenses: config.monthly_misc_expenses,
        monthly_hoa_fee: config.monthly_hoa_fee,
        monthly_home_insurance: config.monthly_home_insurance,
        monthly_property_utilities: config.monthly_property_utilities,
        monthly_rent_utilities: config.monthly_rent_utilities,
        standard_deduction: config.standard_deduction,
    }
}

fn year_flows(
    config: &Config,
    state: &YearState,
    scheduled_payment: f64,
    loan_origin: f64,
) -> YearFlows {
    let monthly_rate = config.effective_mortgage_rate / 100.0 / 12.0;
    let extra = if state.loan_balance > 0.0 {
        effective_extra_payment(config, loan_origin)
    } else {
        0.0
    };
    let amortization = amortize_year(state.loan_balance, scheduled_payment + extra, monthly_rate);

    let property_tax = state.assessed_value * config.property_tax_rate / 100.0;
    let mello_roos_tax = state.assessed_value * config.mello_roos_tax_rate / 100.0;
    let maintenance = state.home_value * config.annual_maintenance_rate / 100.0;
    let pmi = monthly_pmi(config, state.home_value, state.loan_balance, loan_origin);
    let tax_savings = yearly_tax_savings(
        config,
        amortization.interest_paid,
        property_tax,
        mello_roos_tax,
        state.standard_deduction,
    );

    // Actual dollars paid this year, so the payoff year charges only the
    // months the loan was still open.
    let mortgage_outlay_monthly =
        (amortization.interest_paid + amortization.principal_paid) / 12.0;
    let owner_outlay_monthly = mortgage_outlay_monthly
        + property_tax / 12.0
        + mello_roos_tax / 12.0
        + state.monthly_home_insurance
        + maintenance / 12.0
        + pmi
        + state.monthly_property_utilities
        + state.monthly_hoa_fee;
    let net_owner_monthly =
        owner_outlay_monthly - state.monthly_rental_income - tax_savings / 12.0;

    let take_home = monthly_take_home(config, state.salary);
    let monthly_renter_cost =
        state.monthly_rent + state.monthly_rent_utilities + config.monthly_renter_insurance;

    YearFlows {
        amortization,
        tax_savings,
        net_owner_monthly,
        buying_surplus_monthly: take_home - state.monthly_misc_expenses - net_owner_monthly,
        renting_surplus_monthly: take_home - state.monthly_misc_expenses - monthly_renter_cost,
        monthly_renter_cost,
    }
}

fn emit_snapshot(year: u32, state: &YearState, flows: &YearFlows) -> YearlySnapshot {
    let home_value = round_currency(state.home_value);
    let remaining_loan = round_currency(state.loan_balance);
    let home_equity = home_value - remaining_loan;
    YearlySnapshot {
        year,
        buying: round_currency(
            state.investments_buying + (state.home_value - state.loan_balance)
                + state.quality_of_life_accrued,
        ),
        renting: round_currency(state.investments_renting),
        salary: round_currency(state.salary),
        home_equity,
        investments_buying: round_currency(state.investments_buying),
        investments_renting: round_currency(state.investments_renting),
        home_value,
        remaining_loan,
        yearly_principal_paid: round_currency(flows.amortization.principal_paid),
        yearly_interest_paid: round_currency(flows.amortization.interest_paid),
        monthly_payment: round_currency(flows.net_owner_monthly),
        available_monthly_investment: round_currency(flows.buying_surplus_monthly),
        monthly_rent: round_currency(state.monthly_rent),
        annual_rent_costs: round_currency(12.0 * flows.monthly_renter_cost),
        monthly_rental_income: round_currency(state.monthly_rental_income),
        yearly_tax_savings: round_currency(flows.tax_savings),
        monthly_misc_expenses: round_currency(state.monthly_misc_expenses),
    }
}

fn advance_state(config: &Config, state: YearState, flows: &YearFlows) -> YearState {
    let monthly_return = config.investment_return / 100.0 / 12.0;
    let inflation = 1.0 + config.inflation_rate / 100.0;
    let rent_growth = 1.0 + config.rent_increase / 100.0;
    YearState {
        salary: state.salary * (1.0 + config.salary_growth_rate / 100.0),
        monthly_rent: state.monthly_rent * rent_growth,
        monthly_rental_income: state.monthly_rental_income * rent_growth,
        home_value: state.home_value * (1.0 + config.home_appreciation / 100.0),
        assessed_value: state.assessed_value * (1.0 + config.property_tax_assessment_cap / 100.0),
        loan_balance: flows.amortization.ending_balance,
        investments_buying: compound_year(
            state.investments_buying,
            flows.buying_surplus_monthly,
            monthly_return,
        ),
        investments_renting: compound_year(
            state.investments_renting,
            flows.renting_surplus_monthly,
            monthly_return,
        ),
        quality_of_life_accrued: state.quality_of_life_accrued
            + 12.0 * config.monthly_quality_of_life,
        monthly_misc_expenses: state.monthly_misc_expenses * inflation,
        monthly_hoa_fee: state.monthly_hoa_fee * inflation,
        monthly_home_insurance: state.monthly_home_insurance * inflation,
        monthly_property_utilities: state.monthly_property_utilities * inflation,
        monthly_rent_utilities: state.monthly_rent_utilities * inflation,
        standard_deduction: state.standard_deduction * inflation,
    }
}

/// Standard annuity payment; linear when the rate is zero.
fn monthly_mortgage_payment(principal: f64, annual_rate_percent: f64, years: u32) -> f64 {
    if principal <= 0.0 {
        return 0.0;
    }
    let periods = f64::from(years * 12);
    let monthly_rate = annual_rate_percent / 100.0 / 12.0;
    if monthly_rate == 0.0 {
        return principal / periods;
    }
    let growth = (1.0 + monthly_rate).powf(periods);
    principal * monthly_rate * growth / (growth - 1.0)
}

/// Twelve monthly interest/principal splits. Principal is clamped to the
/// remaining balance, so the balance ends at exactly zero and never goes
/// negative; a closed loan short-circuits to all-zero.
fn amortize_year(mut balance: f64, monthly_payment: f64, monthly_rate: f64) -> AmortizationYear {
    if balance <= 0.0 {
        return AmortizationYear {
            interest_paid: 0.0,
            principal_paid: 0.0,
            ending_balance: 0.0,
        };
    }
    let mut interest_paid = 0.0;
    let mut principal_paid = 0.0;
    for _ in 0..12 {
        if balance <= 0.0 {
            break;
        }
        let interest = balance * monthly_rate;
        let principal = (monthly_payment - interest).clamp(0.0, balance);
        interest_paid += interest;
        principal_paid += principal;
        balance -= principal;
    }
    AmortizationYear {
        interest_paid,
        principal_paid,
        ending_balance: balance.max(0.0),
    }
}

fn yearly_tax_savings(
    config: &Config,
    interest_paid: f64,
    property_tax: f64,
    mello_roos_tax: f64,
    standard_deduction: f64,
) -> f64 {
    let cap_share = (config.mortgage_interest_deduction_cap / config.home_price).min(1.0);
    let itemized = interest_paid * cap_share + property_tax + mello_roos_tax;
    (itemized - standard_deduction).max(0.0) * (config.effective_tax_rate / 100.0)
}

fn monthly_pmi(config: &Config, home_value: f64, loan_balance: f64, loan_origin: f64) -> f64 {
    if config.pmi_rate <= 0.0 || loan_balance <= 0.0 {
        return 0.0;
    }
    let basis = match config.pmi_equity_basis {
        PmiEquityBasis::OriginalPrice => config.home_price,
        PmiEquityBasis::CurrentValue => home_value,
    };
    if basis <= 0.0 {
        return 0.0;
    }
    let equity_share = (basis - loan_balance) / basis;
    if equity_share >= 0.20 {
        0.0
    } else {
        loan_origin * config.pmi_rate / 100.0 / 12.0
    }
}

/// Contribution first, growth second, each month; reversing the order is not
/// equivalent.
fn compound_year(mut balance: f64, monthly_contribution: f64, monthly_return: f64) -> f64 {
    for _ in 0..12 {
        balance += monthly_contribution;
        balance *= 1.0 + monthly_return;
    }
    balance
}

fn monthly_take_home(config: &Config, annual_salary: f64) -> f64 {
    annual_salary * (1.0 - config.effective_tax_rate / 100.0) / 12.0
}

fn effective_extra_payment(config: &Config, loan_origin: f64) -> f64 {
    if loan_origin > 0.0 {
        config.extra_monthly_payment
    } else {
        0.0
    }
}

fn round_currency(value: f64) -> f64 {
    value.round()
}
