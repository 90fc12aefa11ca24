use clap::{Args, ValueEnum};
use serde::Deserialize;

use crate::core::{Baseline, LOAN_DURATIONS, PropertyDraft, PropertyType, SimulationInput};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InputError {
    #[error("{field} must be a finite number >= 0")]
    Negative { field: &'static str },

    #[error("{field} must be a finite number")]
    NotFinite { field: &'static str },

    #[error("{field} must be between {min} and {max}")]
    OutOfRange {
        field: &'static str,
        min: f64,
        max: f64,
    },

    #[error("loanDuration must be one of {allowed:?} years, got {years}")]
    UnsupportedLoanDuration {
        years: u32,
        allowed: &'static [u32],
    },

    #[error("{0} name must not be empty")]
    MissingName(&'static str),

    #[error("monthlySalaries must contain at least one entry")]
    NoSalaries,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum CliPropertyType {
    House,
    Apartment,
    Estate,
    Land,
    Building,
    Other,
}

impl From<CliPropertyType> for PropertyType {
    fn from(value: CliPropertyType) -> Self {
        match value {
            CliPropertyType::House => PropertyType::House,
            CliPropertyType::Apartment => PropertyType::Apartment,
            CliPropertyType::Estate => PropertyType::Estate,
            CliPropertyType::Land => PropertyType::Land,
            CliPropertyType::Building => PropertyType::Building,
            CliPropertyType::Other => PropertyType::Other,
        }
    }
}

impl From<PropertyType> for CliPropertyType {
    fn from(value: PropertyType) -> Self {
        match value {
            PropertyType::House => CliPropertyType::House,
            PropertyType::Apartment => CliPropertyType::Apartment,
            PropertyType::Estate => CliPropertyType::Estate,
            PropertyType::Land => CliPropertyType::Land,
            PropertyType::Building => CliPropertyType::Building,
            PropertyType::Other => CliPropertyType::Other,
        }
    }
}

/// Simulation form fields as command-line flags. API payloads are laid
/// over [`default_simulation_args`], so the defaults here are also the
/// defaults of the web form.
#[derive(Args, Debug, Clone)]
pub struct SimulationArgs {
    #[arg(long, default_value = "")]
    pub name: String,
    #[arg(long = "type", value_enum, default_value_t = CliPropertyType::Estate)]
    pub property_type: CliPropertyType,
    #[arg(long, default_value_t = 0.0, help = "Purchase price")]
    pub price: f64,
    #[arg(long, default_value_t = 0.0, help = "Cash contributed upfront")]
    pub down_payment: f64,
    #[arg(long, default_value_t = 0.0, help = "Gross monthly rent before vacancy")]
    pub monthly_rent: f64,
    #[arg(long, default_value_t = 3.5, help = "Nominal annual loan rate in percent")]
    pub loan_rate: f64,
    #[arg(
        long,
        default_value_t = 20,
        help = "Loan duration in years: 5, 7, 10, 12, 15, 17, 20, 22, 25, 27 or 30"
    )]
    pub loan_duration: u32,
    #[arg(long, default_value_t = 0.0)]
    pub monthly_charges: f64,
    #[arg(long, default_value_t = 0.0, help = "Annual property tax")]
    pub property_tax: f64,
    #[arg(long, default_value_t = 0.0, help = "Annual insurance premium")]
    pub insurance: f64,
    #[arg(long, default_value_t = 0.0, help = "Annual maintenance budget")]
    pub maintenance: f64,
    #[arg(long, default_value_t = 0.0)]
    pub renovation_cost: f64,
    #[arg(
        long,
        default_value_t = 5.0,
        help = "Expected share of time unrented, in percent"
    )]
    pub vacancy_rate: f64,
}

pub fn default_simulation_args() -> SimulationArgs {
    SimulationArgs {
        name: String::new(),
        property_type: CliPropertyType::Estate,
        price: 0.0,
        down_payment: 0.0,
        monthly_rent: 0.0,
        loan_rate: 3.5,
        loan_duration: 20,
        monthly_charges: 0.0,
        property_tax: 0.0,
        insurance: 0.0,
        maintenance: 0.0,
        renovation_cost: 0.0,
        vacancy_rate: 5.0,
    }
}

pub fn build_input(args: SimulationArgs) -> Result<SimulationInput, InputError> {
    for (field, value) in [
        ("price", args.price),
        ("downPayment", args.down_payment),
        ("monthlyRent", args.monthly_rent),
        ("monthlyCharges", args.monthly_charges),
        ("propertyTax", args.property_tax),
        ("insurance", args.insurance),
        ("maintenance", args.maintenance),
        ("renovationCost", args.renovation_cost),
    ] {
        non_negative(field, value)?;
    }
    in_range("loanRate", args.loan_rate, 0.0, 100.0)?;
    in_range("vacancyRate", args.vacancy_rate, 0.0, 100.0)?;

    if !LOAN_DURATIONS.contains(&args.loan_duration) {
        return Err(InputError::UnsupportedLoanDuration {
            years: args.loan_duration,
            allowed: &LOAN_DURATIONS,
        });
    }

    Ok(SimulationInput {
        name: args.name.trim().to_string(),
        property_type: args.property_type.into(),
        price: args.price,
        down_payment: args.down_payment,
        monthly_rent: args.monthly_rent,
        loan_rate: args.loan_rate,
        loan_duration: args.loan_duration,
        monthly_charges: args.monthly_charges,
        property_tax: args.property_tax,
        insurance: args.insurance,
        maintenance: args.maintenance,
        renovation_cost: args.renovation_cost,
        vacancy_rate: args.vacancy_rate,
    })
}

/// Net worth may be negative when debt exceeds property value; it only
/// has to be a real number.
pub fn build_baseline(net_worth: f64, monthly_income: f64) -> Result<Baseline, InputError> {
    if !net_worth.is_finite() {
        return Err(InputError::NotFinite {
            field: "baselineNetWorth",
        });
    }
    if !monthly_income.is_finite() {
        return Err(InputError::NotFinite {
            field: "baselineMonthlyIncome",
        });
    }
    Ok(Baseline {
        net_worth,
        monthly_income,
    })
}

/// Simulation form as sent by the web UI. Field names follow the UI's
/// camelCase; the snake_case column names of the old row store are
/// accepted too.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SimulatePayload {
    name: Option<String>,
    #[serde(rename = "type", alias = "propertyType", alias = "property_type")]
    property_type: Option<PropertyType>,
    price: Option<f64>,
    #[serde(alias = "down_payment")]
    down_payment: Option<f64>,
    #[serde(alias = "monthly_rent")]
    monthly_rent: Option<f64>,
    #[serde(alias = "loan_rate")]
    loan_rate: Option<f64>,
    #[serde(alias = "loan_duration")]
    loan_duration: Option<u32>,
    #[serde(alias = "monthly_charges")]
    monthly_charges: Option<f64>,
    #[serde(alias = "property_tax")]
    property_tax: Option<f64>,
    insurance: Option<f64>,
    maintenance: Option<f64>,
    #[serde(alias = "renovation_cost")]
    renovation_cost: Option<f64>,
    #[serde(alias = "vacancy_rate")]
    vacancy_rate: Option<f64>,

    baseline_net_worth: Option<f64>,
    baseline_monthly_income: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulateRequest {
    pub input: SimulationInput,
    /// Only set when the payload carried baseline figures.
    pub baseline: Option<Baseline>,
}

pub fn request_from_payload(payload: SimulatePayload) -> Result<SimulateRequest, InputError> {
    let mut args = default_simulation_args();

    if let Some(v) = payload.name {
        args.name = v;
    }
    if let Some(v) = payload.property_type {
        args.property_type = v.into();
    }
    if let Some(v) = payload.price {
        args.price = v;
    }
    if let Some(v) = payload.down_payment {
        args.down_payment = v;
    }
    if let Some(v) = payload.monthly_rent {
        args.monthly_rent = v;
    }
    if let Some(v) = payload.loan_rate {
        args.loan_rate = v;
    }
    if let Some(v) = payload.loan_duration {
        args.loan_duration = v;
    }
    if let Some(v) = payload.monthly_charges {
        args.monthly_charges = v;
    }
    if let Some(v) = payload.property_tax {
        args.property_tax = v;
    }
    if let Some(v) = payload.insurance {
        args.insurance = v;
    }
    if let Some(v) = payload.maintenance {
        args.maintenance = v;
    }
    if let Some(v) = payload.renovation_cost {
        args.renovation_cost = v;
    }
    if let Some(v) = payload.vacancy_rate {
        args.vacancy_rate = v;
    }

    let input = build_input(args)?;
    let baseline = match (payload.baseline_net_worth, payload.baseline_monthly_income) {
        (None, None) => None,
        (net_worth, monthly_income) => Some(build_baseline(
            net_worth.unwrap_or(0.0),
            monthly_income.unwrap_or(0.0),
        )?),
    };

    Ok(SimulateRequest { input, baseline })
}

/// Only a named scenario can be saved.
pub fn require_name(input: &SimulationInput) -> Result<(), InputError> {
    if input.name.is_empty() {
        return Err(InputError::MissingName("simulation"));
    }
    Ok(())
}

pub fn validate_property(draft: PropertyDraft) -> Result<PropertyDraft, InputError> {
    if draft.name.trim().is_empty() {
        return Err(InputError::MissingName("property"));
    }
    non_negative("value", draft.value)?;
    non_negative("remainingCredit", draft.remaining_credit)?;
    non_negative("monthlyRent", draft.monthly_rent)?;
    if let Some(charges) = draft.monthly_charges {
        non_negative("monthlyCharges", charges)?;
    }

    Ok(PropertyDraft {
        name: draft.name.trim().to_string(),
        ..draft
    })
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PreferencesPayload {
    #[serde(alias = "rental_goal")]
    pub rental_goal: Option<f64>,
    #[serde(alias = "monthly_salaries")]
    pub monthly_salaries: Option<Vec<f64>>,
}

pub fn validate_preferences(payload: &PreferencesPayload) -> Result<(), InputError> {
    if let Some(goal) = payload.rental_goal {
        non_negative("rentalGoal", goal)?;
    }
    if let Some(salaries) = &payload.monthly_salaries {
        if salaries.is_empty() {
            return Err(InputError::NoSalaries);
        }
        for salary in salaries {
            non_negative("monthlySalaries", *salary)?;
        }
    }
    Ok(())
}

fn non_negative(field: &'static str, value: f64) -> Result<f64, InputError> {
    if !value.is_finite() || value < 0.0 {
        return Err(InputError::Negative { field });
    }
    Ok(value)
}

fn in_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<f64, InputError> {
    if !(min..=max).contains(&value) {
        return Err(InputError::OutOfRange { field, min, max });
    }
    Ok(value)
}
