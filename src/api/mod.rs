use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::core::{
    Config, DEFAULT_EXTRA_PAYMENT_LADDER, ExtraPaymentOutcome, Infeasibility, PmiEquityBasis,
    YearlySnapshot, compare_extra_payments, project,
};

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliPmiEquityBasis {
    OriginalPrice,
    CurrentValue,
}

impl From<CliPmiEquityBasis> for PmiEquityBasis {
    fn from(value: CliPmiEquityBasis) -> Self {
        match value {
            CliPmiEquityBasis::OriginalPrice => PmiEquityBasis::OriginalPrice,
            CliPmiEquityBasis::CurrentValue => PmiEquityBasis::CurrentValue,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiPmiEquityBasis {
    #[serde(alias = "originalPrice", alias = "original_price")]
    OriginalPrice,
    #[serde(alias = "currentValue", alias = "current_value")]
    CurrentValue,
}

impl From<ApiPmiEquityBasis> for CliPmiEquityBasis {
    fn from(value: ApiPmiEquityBasis) -> Self {
        match value {
            ApiPmiEquityBasis::OriginalPrice => CliPmiEquityBasis::OriginalPrice,
            ApiPmiEquityBasis::CurrentValue => CliPmiEquityBasis::CurrentValue,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ProjectPayload {
    annual_salary_before_tax: Option<f64>,
    effective_tax_rate: Option<f64>,
    standard_deduction: Option<f64>,
    initial_investment: Option<f64>,
    monthly_misc_expenses: Option<f64>,

    home_price: Option<f64>,
    down_payment_percent: Option<f64>,
    effective_mortgage_rate: Option<f64>,
    mortgage_years: Option<u32>,
    pmi_rate: Option<f64>,
    property_tax_rate: Option<f64>,
    mello_roos_tax_rate: Option<f64>,
    closing_cost_percent: Option<f64>,
    annual_maintenance_rate: Option<f64>,
    monthly_hoa_fee: Option<f64>,
    monthly_home_insurance: Option<f64>,
    monthly_rental_income: Option<f64>,
    monthly_property_utilities: Option<f64>,
    moving_cost_buying: Option<f64>,
    monthly_quality_of_life: Option<f64>,

    monthly_rent: Option<f64>,
    rent_deposit: Option<f64>,
    moving_cost_renting: Option<f64>,
    monthly_renter_insurance: Option<f64>,
    monthly_rent_utilities: Option<f64>,

    home_appreciation: Option<f64>,
    investment_return: Option<f64>,
    rent_increase: Option<f64>,
    salary_growth_rate: Option<f64>,
    inflation_rate: Option<f64>,
    property_tax_assessment_cap: Option<f64>,
    mortgage_interest_deduction_cap: Option<f64>,

    x_axis_years: Option<u32>,
    pmi_equity_basis: Option<ApiPmiEquityBasis>,
    extra_monthly_payment: Option<f64>,
    extra_payment_ladder: Option<ExtraPaymentLadder>,
}

/// Ladder of extra-payment candidates. JSON bodies send an array; the query
/// string cannot encode one, so a comma-separated form is accepted there.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ExtraPaymentLadder {
    Values(Vec<f64>),
    Csv(String),
}

impl ExtraPaymentLadder {
    fn into_values(self) -> Result<Vec<f64>, String> {
        let values = match self {
            ExtraPaymentLadder::Values(values) => values,
            ExtraPaymentLadder::Csv(raw) => {
                let mut values = Vec::new();
                for part in raw.split(',') {
                    let part = part.trim();
                    if part.is_empty() {
                        continue;
                    }
                    values.push(
                        part.parse::<f64>()
                            .map_err(|_| format!("Invalid extraPaymentLadder entry: {part}"))?,
                    );
                }
                values
            }
        };
        for value in &values {
            if !value.is_finite() || *value < 0.0 {
                return Err("extraPaymentLadder entries must be >= 0".to_string());
            }
        }
        Ok(values)
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "rentorbuy",
    about = "Buy-vs-rent net worth projector (amortization + tax deductions + monthly compounding)"
)]
struct Cli {
    #[arg(long)]
    annual_salary_before_tax: f64,
    #[arg(long, help = "Effective income tax rate in percent")]
    effective_tax_rate: f64,
    #[arg(long, default_value_t = 14_600.0)]
    standard_deduction: f64,
    #[arg(long, help = "Liquid capital available before upfront outlays")]
    initial_investment: f64,
    #[arg(long, default_value_t = 0.0)]
    monthly_misc_expenses: f64,
    #[arg(long)]
    home_price: f64,
    #[arg(long, default_value_t = 20.0, help = "Down payment in percent of price")]
    down_payment_percent: f64,
    #[arg(long, help = "Fixed mortgage rate in percent, e.g. 6.5")]
    effective_mortgage_rate: f64,
    #[arg(long, default_value_t = 30)]
    mortgage_years: u32,
    #[arg(
        long,
        default_value_t = 0.5,
        help = "Annual PMI rate in percent of the original loan, charged below 20% equity"
    )]
    pmi_rate: f64,
    #[arg(long, default_value_t = 1.2, help = "Annual property tax rate in percent of assessed value")]
    property_tax_rate: f64,
    #[arg(
        long,
        default_value_t = 0.0,
        help = "Secondary assessment (Mello-Roos) rate in percent of assessed value"
    )]
    mello_roos_tax_rate: f64,
    #[arg(long, default_value_t = 1.5, help = "One-time closing costs in percent of price")]
    closing_cost_percent: f64,
    #[arg(
        long,
        default_value_t = 1.0,
        help = "Annual maintenance in percent of current home value"
    )]
    annual_maintenance_rate: f64,
    #[arg(long, default_value_t = 0.0)]
    monthly_hoa_fee: f64,
    #[arg(long, default_value_t = 150.0)]
    monthly_home_insurance: f64,
    #[arg(long)]
    monthly_rent: f64,
    #[arg(long, default_value_t = 0.0, help = "Monthly income from renting out part of the home")]
    monthly_rental_income: f64,
    #[arg(long, default_value_t = 0.0)]
    rent_deposit: f64,
    #[arg(long, default_value_t = 0.0)]
    moving_cost_buying: f64,
    #[arg(long, default_value_t = 0.0)]
    moving_cost_renting: f64,
    #[arg(long, default_value_t = 20.0)]
    monthly_renter_insurance: f64,
    #[arg(long, default_value_t = 0.0)]
    monthly_rent_utilities: f64,
    #[arg(long, default_value_t = 0.0)]
    monthly_property_utilities: f64,
    #[arg(
        long,
        default_value_t = 0.0,
        help = "Monthly value imputed to owning, credited to buying net worth without compounding"
    )]
    monthly_quality_of_life: f64,
    #[arg(long, default_value_t = 4.5, help = "Annual home appreciation in percent")]
    home_appreciation: f64,
    #[arg(long, default_value_t = 8.0, help = "Annual investment return in percent")]
    investment_return: f64,
    #[arg(long, default_value_t = 3.0, help = "Annual rent increase in percent")]
    rent_increase: f64,
    #[arg(long, default_value_t = 2.0, help = "Annual salary growth in percent")]
    salary_growth_rate: f64,
    #[arg(long, default_value_t = 2.5, help = "Annual inflation in percent")]
    inflation_rate: f64,
    #[arg(
        long,
        default_value_t = 2.0,
        help = "Capped annual growth of the tax-assessed value in percent"
    )]
    property_tax_assessment_cap: f64,
    #[arg(
        long,
        default_value_t = 750_000.0,
        help = "Mortgage principal above which interest is only proportionally deductible"
    )]
    mortgage_interest_deduction_cap: f64,
    #[arg(long, default_value_t = 40, help = "Number of years to display")]
    x_axis_years: u32,
    #[arg(
        long,
        value_enum,
        default_value_t = CliPmiEquityBasis::OriginalPrice,
        help = "Whether PMI removal measures equity against the original price or the appreciated value"
    )]
    pmi_equity_basis: CliPmiEquityBasis,
    #[arg(
        long,
        default_value_t = 0.0,
        help = "Extra principal paid each month while the loan is open"
    )]
    extra_monthly_payment: f64,
}

#[derive(Debug)]
struct ApiRequest {
    config: Config,
    extra_payment_ladder: Option<Vec<f64>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectOkResponse {
    years: Vec<YearlySnapshot>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InfeasibleResponse {
    infeasible: Infeasibility,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CompareResponse {
    outcomes: Vec<ExtraPaymentOutcome>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn build_config(cli: Cli) -> Result<Config, String> {
    if !cli.home_price.is_finite() || cli.home_price <= 0.0 {
        return Err("--home-price must be > 0".to_string());
    }

    for (name, value) in [
        ("--annual-salary-before-tax", cli.annual_salary_before_tax),
        ("--standard-deduction", cli.standard_deduction),
        ("--initial-investment", cli.initial_investment),
        ("--monthly-misc-expenses", cli.monthly_misc_expenses),
        ("--monthly-hoa-fee", cli.monthly_hoa_fee),
        ("--monthly-home-insurance", cli.monthly_home_insurance),
        ("--monthly-rent", cli.monthly_rent),
        ("--monthly-rental-income", cli.monthly_rental_income),
        ("--rent-deposit", cli.rent_deposit),
        ("--moving-cost-buying", cli.moving_cost_buying),
        ("--moving-cost-renting", cli.moving_cost_renting),
        ("--monthly-renter-insurance", cli.monthly_renter_insurance),
        ("--monthly-rent-utilities", cli.monthly_rent_utilities),
        ("--monthly-property-utilities", cli.monthly_property_utilities),
        ("--monthly-quality-of-life", cli.monthly_quality_of_life),
        (
            "--mortgage-interest-deduction-cap",
            cli.mortgage_interest_deduction_cap,
        ),
        ("--extra-monthly-payment", cli.extra_monthly_payment),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(format!("{name} must be >= 0"));
        }
    }

    for (name, rate) in [
        ("--effective-tax-rate", cli.effective_tax_rate),
        ("--down-payment-percent", cli.down_payment_percent),
    ] {
        if !(0.0..=100.0).contains(&rate) {
            return Err(format!("{name} must be between 0 and 100"));
        }
    }

    for (name, rate) in [
        ("--effective-mortgage-rate", cli.effective_mortgage_rate),
        ("--pmi-rate", cli.pmi_rate),
        ("--property-tax-rate", cli.property_tax_rate),
        ("--mello-roos-tax-rate", cli.mello_roos_tax_rate),
        ("--closing-cost-percent", cli.closing_cost_percent),
        ("--annual-maintenance-rate", cli.annual_maintenance_rate),
    ] {
        if !rate.is_finite() || rate < 0.0 {
            return Err(format!("{name} must be >= 0"));
        }
    }

    for (name, rate) in [
        ("--home-appreciation", cli.home_appreciation),
        ("--investment-return", cli.investment_return),
        ("--rent-increase", cli.rent_increase),
        ("--salary-growth-rate", cli.salary_growth_rate),
        ("--inflation-rate", cli.inflation_rate),
        (
            "--property-tax-assessment-cap",
            cli.property_tax_assessment_cap,
        ),
    ] {
        if !rate.is_finite() || rate <= -100.0 {
            return Err(format!("{name} must be > -100"));
        }
    }

    if cli.mortgage_years == 0 {
        return Err("--mortgage-years must be > 0".to_string());
    }
    if cli.x_axis_years == 0 {
        return Err("--x-axis-years must be > 0".to_string());
    }

    Ok(Config {
        annual_salary_before_tax: cli.annual_salary_before_tax,
        effective_tax_rate: cli.effective_tax_rate,
        standard_deduction: cli.standard_deduction,
        initial_investment: cli.initial_investment,
        monthly_misc_expenses: cli.monthly_misc_expenses,
        home_price: cli.home_price,
        down_payment_percent: cli.down_payment_percent,
        effective_mortgage_rate: cli.effective_mortgage_rate,
        mortgage_years: cli.mortgage_years,
        pmi_rate: cli.pmi_rate,
        property_tax_rate: cli.property_tax_rate,
        mello_roos_tax_rate: cli.mello_roos_tax_rate,
        closing_cost_percent: cli.closing_cost_percent,
        annual_maintenance_rate: cli.annual_maintenance_rate,
        monthly_hoa_fee: cli.monthly_hoa_fee,
        monthly_home_insurance: cli.monthly_home_insurance,
        monthly_rent: cli.monthly_rent,
        monthly_rental_income: cli.monthly_rental_income,
        rent_deposit: cli.rent_deposit,
        moving_cost_buying: cli.moving_cost_buying,
        moving_cost_renting: cli.moving_cost_renting,
        monthly_renter_insurance: cli.monthly_renter_insurance,
        monthly_rent_utilities: cli.monthly_rent_utilities,
        monthly_property_utilities: cli.monthly_property_utilities,
        monthly_quality_of_life: cli.monthly_quality_of_life,
        home_appreciation: cli.home_appreciation,
        investment_return: cli.investment_return,
        rent_increase: cli.rent_increase,
        salary_growth_rate: cli.salary_growth_rate,
        inflation_rate: cli.inflation_rate,
        property_tax_assessment_cap: cli.property_tax_assessment_cap,
        mortgage_interest_deduction_cap: cli.mortgage_interest_deduction_cap,
        x_axis_years: cli.x_axis_years,
        pmi_equity_basis: cli.pmi_equity_basis.into(),
        extra_monthly_payment: cli.extra_monthly_payment,
    })
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route(
            "/api/project",
            get(project_get_handler).post(project_post_handler),
        )
        .route(
            "/api/compare",
            get(compare_get_handler).post(compare_post_handler),
        )
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    println!("rent-or-buy HTTP API listening on http://{addr}");
    println!("Local access: http://127.0.0.1:{port}/api/project");

    axum::serve(listener, app).await
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn project_get_handler(Query(payload): Query<ProjectPayload>) -> Response {
    project_handler_impl(payload)
}

async fn project_post_handler(Json(payload): Json<ProjectPayload>) -> Response {
    project_handler_impl(payload)
}

async fn compare_get_handler(Query(payload): Query<ProjectPayload>) -> Response {
    compare_handler_impl(payload)
}

async fn compare_post_handler(Json(payload): Json<ProjectPayload>) -> Response {
    compare_handler_impl(payload)
}

fn project_handler_impl(payload: ProjectPayload) -> Response {
    let request = match api_request_from_payload(payload) {
        Ok(request) => request,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };

    // Infeasibility is a result, not a transport error; both arms are 200.
    match project(&request.config) {
        Ok(years) => json_response(StatusCode::OK, ProjectOkResponse { years }),
        Err(infeasible) => json_response(StatusCode::OK, InfeasibleResponse { infeasible }),
    }
}

fn compare_handler_impl(payload: ProjectPayload) -> Response {
    let request = match api_request_from_payload(payload) {
        Ok(request) => request,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };

    let ladder = request
        .extra_payment_ladder
        .unwrap_or_else(|| DEFAULT_EXTRA_PAYMENT_LADDER.to_vec());
    match compare_extra_payments(&request.config, &ladder) {
        Ok(outcomes) => json_response(StatusCode::OK, CompareResponse { outcomes }),
        Err(infeasible) => json_response(StatusCode::OK, InfeasibleResponse { infeasible }),
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
fn api_request_from_json(json: &str) -> Result<ApiRequest, String> {
    let payload = serde_json::from_str::<ProjectPayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    api_request_from_payload(payload)
}

fn api_request_from_payload(payload: ProjectPayload) -> Result<ApiRequest, String> {
    let mut cli = default_cli_for_api();

    if let Some(v) = payload.annual_salary_before_tax {
        cli.annual_salary_before_tax = v;
    }
    if let Some(v) = payload.effective_tax_rate {
        cli.effective_tax_rate = v;
    }
    if let Some(v) = payload.standard_deduction {
        cli.standard_deduction = v;
    }
    if let Some(v) = payload.initial_investment {
        cli.initial_investment = v;
    }
    if let Some(v) = payload.monthly_misc_expenses {
        cli.monthly_misc_expenses = v;
    }

    if let Some(v) = payload.home_price {
        cli.home_price = v;
    }
    if let Some(v) = payload.down_payment_percent {
        cli.down_payment_percent = v;
    }
    if let Some(v) = payload.effective_mortgage_rate {
        cli.effective_mortgage_rate = v;
    }
    if let Some(v) = payload.mortgage_years {
        cli.mortgage_years = v;
    }
    if let Some(v) = payload.pmi_rate {
        cli.pmi_rate = v;
    }
    if let Some(v) = payload.property_tax_rate {
        cli.property_tax_rate = v;
    }
    if let Some(v) = payload.mello_roos_tax_rate {
        cli.mello_roos_tax_rate = v;
    }
    if let Some(v) = payload.closing_cost_percent {
        cli.closing_cost_percent = v;
    }
    if let Some(v) = payload.annual_maintenance_rate {
        cli.annual_maintenance_rate = v;
    }
    if let Some(v) = payload.monthly_hoa_fee {
        cli.monthly_hoa_fee = v;
    }
    if let Some(v) = payload.monthly_home_insurance {
        cli.monthly_home_insurance = v;
    }
    if let Some(v) = payload.monthly_rental_income {
        cli.monthly_rental_income = v;
    }
    if let Some(v) = payload.monthly_property_utilities {
        cli.monthly_property_utilities = v;
    }
    if let Some(v) = payload.moving_cost_buying {
        cli.moving_cost_buying = v;
    }
    if let Some(v) = payload.monthly_quality_of_life {
        cli.monthly_quality_of_life = v;
    }

    if let Some(v) = payload.monthly_rent {
        cli.monthly_rent = v;
    }
    if let Some(v) = payload.rent_deposit {
        cli.rent_deposit = v;
    }
    if let Some(v) = payload.moving_cost_renting {
        cli.moving_cost_renting = v;
    }
    if let Some(v) = payload.monthly_renter_insurance {
        cli.monthly_renter_insurance = v;
    }
    if let Some(v) = payload.monthly_rent_utilities {
        cli.monthly_rent_utilities = v;
    }

    if let Some(v) = payload.home_appreciation {
        cli.home_appreciation = v;
    }
    if let Some(v) = payload.investment_return {
        cli.investment_return = v;
    }
    if let Some(v) = payload.rent_increase {
        cli.rent_increase = v;
    }
    if let Some(v) = payload.salary_growth_rate {
        cli.salary_growth_rate = v;
    }
    if let Some(v) = payload.inflation_rate {
        cli.inflation_rate = v;
    }
    if let Some(v) = payload.property_tax_assessment_cap {
        cli.property_tax_assessment_cap = v;
    }
    if let Some(v) = payload.mortgage_interest_deduction_cap {
        cli.mortgage_interest_deduction_cap = v;
    }

    if let Some(v) = payload.x_axis_years {
        cli.x_axis_years = v;
    }
    if let Some(v) = payload.pmi_equity_basis {
        cli.pmi_equity_basis = v.into();
    }
    if let Some(v) = payload.extra_monthly_payment {
        cli.extra_monthly_payment = v;
    }

    let extra_payment_ladder = payload
        .extra_payment_ladder
        .map(ExtraPaymentLadder::into_values)
        .transpose()?;

    let config = build_config(cli)?;
    Ok(ApiRequest {
        config,
        extra_payment_ladder,
    })
}

fn default_cli_for_api() -> Cli {
    Cli {
        annual_salary_before_tax: 180_000.0,
        effective_tax_rate: 32.0,
        standard_deduction: 14_600.0,
        initial_investment: 250_000.0,
        monthly_misc_expenses: 2_000.0,
        home_price: 700_000.0,
        down_payment_percent: 20.0,
        effective_mortgage_rate: 6.5,
        mortgage_years: 30,
        pmi_rate: 0.5,
        property_tax_rate: 1.2,
        mello_roos_tax_rate: 0.0,
        closing_cost_percent: 1.5,
        annual_maintenance_rate: 1.0,
        monthly_hoa_fee: 0.0,
        monthly_home_insurance: 150.0,
        monthly_rent: 2_600.0,
        monthly_rental_income: 0.0,
        rent_deposit: 3_000.0,
        moving_cost_buying: 2_000.0,
        moving_cost_renting: 800.0,
        monthly_renter_insurance: 20.0,
        monthly_rent_utilities: 50.0,
        monthly_property_utilities: 250.0,
        monthly_quality_of_life: 0.0,
        home_appreciation: 4.5,
        investment_return: 8.0,
        rent_increase: 3.0,
        salary_growth_rate: 2.0,
        inflation_rate: 2.5,
        property_tax_assessment_cap: 2.0,
        mortgage_interest_deduction_cap: 750_000.0,
        x_axis_years: 40,
        pmi_equity_basis: CliPmiEquityBasis::OriginalPrice,
        extra_monthly_payment: 0.0,
    }
}
