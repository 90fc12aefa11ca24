use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Loan durations offered by the simulation form, in years.
pub const LOAN_DURATIONS: [u32; 11] = [5, 7, 10, 12, 15, 17, 20, 22, 25, 27, 30];

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    #[serde(alias = "maison")]
    House,
    #[serde(alias = "appartement")]
    Apartment,
    #[serde(alias = "château", alias = "chateau")]
    Estate,
    #[serde(alias = "terrain")]
    Land,
    #[serde(alias = "immeuble")]
    Building,
    #[serde(alias = "autre")]
    Other,
}

/// One buy-side scenario as entered by the user.
///
/// Amounts are in currency units, rates in percent. `property_tax`,
/// `insurance` and `maintenance` are annual figures; `monthly_charges` is
/// monthly.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationInput {
    pub name: String,
    #[serde(rename = "type")]
    pub property_type: PropertyType,
    pub price: f64,
    pub down_payment: f64,
    pub monthly_rent: f64,
    pub loan_rate: f64,
    pub loan_duration: u32,
    pub monthly_charges: f64,
    pub property_tax: f64,
    pub insurance: f64,
    pub maintenance: f64,
    pub renovation_cost: f64,
    pub vacancy_rate: f64,
}

/// Net worth and monthly income the simulated purchase is added on top of.
#[derive(Copy, Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Baseline {
    pub net_worth: f64,
    pub monthly_income: f64,
}

#[derive(Copy, Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    pub loan_amount: f64,
    pub monthly_payment: f64,
    pub monthly_cashflow: f64,
    pub annual_cashflow: f64,
    pub total_annual_income: f64,
    pub total_annual_expenses: f64,
    pub roi: f64,
    pub cap_rate: f64,
    pub cash_on_cash_return: f64,
    pub break_even_rent: f64,
    pub cumulative_net_worth: f64,
    pub cumulative_monthly_income: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedSimulation {
    pub id: Uuid,
    #[serde(flatten)]
    pub input: SimulationInput,
    pub results: SimulationResult,
    pub created_at: DateTime<Utc>,
}

/// A property the user actually owns.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub property_type: PropertyType,
    pub value: f64,
    pub remaining_credit: f64,
    pub monthly_rent: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_charges: Option<f64>,
    pub created_at: DateTime<Utc>,
}

/// Editable fields of a [`Property`].
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDraft {
    pub name: String,
    #[serde(rename = "type")]
    pub property_type: PropertyType,
    pub value: f64,
    #[serde(alias = "remaining_credit")]
    pub remaining_credit: f64,
    #[serde(alias = "monthly_rent")]
    pub monthly_rent: f64,
    #[serde(default, alias = "monthly_charges")]
    pub monthly_charges: Option<f64>,
}

impl PropertyDraft {
    pub fn into_property(self, id: Uuid, created_at: DateTime<Utc>) -> Property {
        Property {
            id,
            name: self.name,
            property_type: self.property_type,
            value: self.value,
            remaining_credit: self.remaining_credit,
            monthly_rent: self.monthly_rent,
            monthly_charges: self.monthly_charges,
            created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    pub rental_goal: f64,
    pub monthly_salaries: Vec<f64>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            rental_goal: 0.0,
            monthly_salaries: vec![0.0],
        }
    }
}
