use serde::Serialize;

use super::types::{Baseline, Property, SavedSimulation};

/// Share of gross rent that lenders count as borrower income.
pub const BANK_RENTAL_INCOME_SHARE: f64 = 0.7;

/// Largest share of monthly income lenders allow for loan repayments.
pub const DEBT_RATIO_CAP: f64 = 0.33;

/// Loan length, in years, used to estimate borrowing capacity.
pub const BORROWING_HORIZON_YEARS: u32 = 20;

/// Dashboard totals over the user's real properties and saved simulations.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSummary {
    pub property_count: usize,
    pub simulation_count: usize,
    pub total_value: f64,
    pub total_remaining_credit: f64,
    pub total_net_worth: f64,
    pub total_rental_income: f64,
    pub total_simulation_income: f64,
    pub total_income: f64,
    pub total_monthly_charges: f64,
    pub total_cashflow: f64,
}

impl PortfolioSummary {
    pub fn from_records(properties: &[Property], simulations: &[SavedSimulation]) -> Self {
        let total_value: f64 = properties.iter().map(|p| p.value).sum();
        let total_remaining_credit: f64 = properties.iter().map(|p| p.remaining_credit).sum();
        let total_rental_income: f64 = properties.iter().map(|p| p.monthly_rent).sum();
        let total_monthly_charges: f64 = properties
            .iter()
            .map(|p| p.monthly_charges.unwrap_or(0.0))
            .sum();
        // Saved simulations count at their gross rent, before vacancy.
        let total_simulation_income: f64 = simulations.iter().map(|s| s.input.monthly_rent).sum();
        let total_income = total_rental_income + total_simulation_income;

        Self {
            property_count: properties.len(),
            simulation_count: simulations.len(),
            total_value,
            total_remaining_credit,
            total_net_worth: properties
                .iter()
                .map(|p| p.value - p.remaining_credit)
                .sum(),
            total_rental_income,
            total_simulation_income,
            total_income,
            total_monthly_charges,
            total_cashflow: total_income - total_monthly_charges,
        }
    }

    /// Numbers a new simulation is stacked on: owned equity and real rent.
    pub fn baseline(&self) -> Baseline {
        Baseline {
            net_worth: self.total_net_worth,
            monthly_income: self.total_rental_income,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalProgress {
    pub goal: f64,
    pub percent: f64,
    pub reached: bool,
}

/// Progress of monthly cashflow toward the rental goal; `None` while no
/// goal is set.
pub fn goal_progress(monthly_cashflow: f64, rental_goal: f64) -> Option<GoalProgress> {
    if rental_goal <= 0.0 {
        return None;
    }
    Some(GoalProgress {
        goal: rental_goal,
        percent: monthly_cashflow / rental_goal * 100.0,
        reached: monthly_cashflow >= rental_goal,
    })
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Affordability {
    /// Positive when the down payment exceeds current net worth; negative
    /// values are the surplus.
    pub missing_amount: f64,
    pub can_afford: bool,
}

pub fn affordability(down_payment: f64, net_worth: f64) -> Affordability {
    let missing_amount = down_payment - net_worth;
    Affordability {
        missing_amount,
        can_afford: down_payment == 0.0 || missing_amount <= 0.0,
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HouseholdIncome {
    pub total_salary: f64,
    pub bank_rental_income: f64,
    pub include_rental_income: bool,
    pub total: f64,
    pub max_monthly_repayment: f64,
    /// Repayment cap sustained over the borrowing horizon, interest ignored.
    pub borrowing_capacity: f64,
}

pub fn household_income(
    salaries: &[f64],
    properties: &[Property],
    include_rental_income: bool,
) -> HouseholdIncome {
    let total_salary: f64 = salaries.iter().sum();
    let gross_rent: f64 = properties.iter().map(|p| p.monthly_rent).sum();
    let bank_rental_income = gross_rent * BANK_RENTAL_INCOME_SHARE;

    let total = if include_rental_income {
        total_salary + bank_rental_income
    } else {
        total_salary
    };
    let max_monthly_repayment = total * DEBT_RATIO_CAP;

    HouseholdIncome {
        total_salary,
        bank_rental_income,
        include_rental_income,
        total,
        max_monthly_repayment,
        borrowing_capacity: max_monthly_repayment * 12.0 * f64::from(BORROWING_HORIZON_YEARS),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::engine::compute_results;
    use crate::core::types::{PropertyDraft, PropertyType, SimulationInput};
    use chrono::Utc;
    use uuid::Uuid;

    const EPS: f64 = 1e-9;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn property(value: f64, credit: f64, rent: f64, charges: Option<f64>) -> Property {
        PropertyDraft {
            name: "Studio".to_string(),
            property_type: PropertyType::Apartment,
            value,
            remaining_credit: credit,
            monthly_rent: rent,
            monthly_charges: charges,
        }
        .into_property(Uuid::new_v4(), Utc::now())
    }

    fn saved(monthly_rent: f64) -> SavedSimulation {
        let input = SimulationInput {
            name: "Projet".to_string(),
            property_type: PropertyType::Building,
            price: 300_000.0,
            down_payment: 60_000.0,
            monthly_rent,
            loan_rate: 4.0,
            loan_duration: 25,
            monthly_charges: 100.0,
            property_tax: 1_500.0,
            insurance: 400.0,
            maintenance: 1_000.0,
            renovation_cost: 15_000.0,
            vacancy_rate: 8.0,
        };
        let results = compute_results(&input, Baseline::default());
        SavedSimulation {
            id: Uuid::new_v4(),
            input,
            results,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn summary_aggregates_properties_and_simulations() {
        let properties = [
            property(250_000.0, 120_000.0, 1_100.0, Some(150.0)),
            property(90_000.0, 0.0, 500.0, None),
        ];
        let simulations = [saved(2_000.0)];

        let summary = PortfolioSummary::from_records(&properties, &simulations);
        assert_eq!(summary.property_count, 2);
        assert_eq!(summary.simulation_count, 1);
        assert_approx(summary.total_value, 340_000.0);
        assert_approx(summary.total_remaining_credit, 120_000.0);
        assert_approx(summary.total_net_worth, 220_000.0);
        assert_approx(summary.total_rental_income, 1_600.0);
        assert_approx(summary.total_simulation_income, 2_000.0);
        assert_approx(summary.total_income, 3_600.0);
        assert_approx(summary.total_monthly_charges, 150.0);
        assert_approx(summary.total_cashflow, 3_450.0);

        let baseline = summary.baseline();
        assert_approx(baseline.net_worth, 220_000.0);
        assert_approx(baseline.monthly_income, 1_600.0);
    }

    #[test]
    fn empty_portfolio_has_zero_baseline() {
        let summary = PortfolioSummary::from_records(&[], &[]);
        assert_eq!(summary, PortfolioSummary::default());
        assert_eq!(summary.baseline(), Baseline::default());
    }

    #[test]
    fn goal_progress_requires_a_goal() {
        assert_eq!(goal_progress(1_500.0, 0.0), None);
        assert_eq!(goal_progress(1_500.0, -10.0), None);

        let progress = goal_progress(1_500.0, 2_000.0).expect("goal is set");
        assert_approx(progress.percent, 75.0);
        assert!(!progress.reached);

        let reached = goal_progress(2_000.0, 2_000.0).expect("goal is set");
        assert!(reached.reached);
    }

    #[test]
    fn affordability_compares_down_payment_with_net_worth() {
        let short = affordability(50_000.0, 30_000.0);
        assert_approx(short.missing_amount, 20_000.0);
        assert!(!short.can_afford);

        let surplus = affordability(20_000.0, 30_000.0);
        assert_approx(surplus.missing_amount, -10_000.0);
        assert!(surplus.can_afford);

        assert!(affordability(0.0, -5_000.0).can_afford);
    }

    #[test]
    fn household_income_counts_seventy_percent_of_rent() {
        let properties = [
            property(200_000.0, 0.0, 1_000.0, None),
            property(100_000.0, 0.0, 500.0, None),
        ];
        let salaries = [2_400.0, 1_900.0];

        let without = household_income(&salaries, &properties, false);
        assert_approx(without.total_salary, 4_300.0);
        assert_approx(without.bank_rental_income, 1_050.0);
        assert_approx(without.total, 4_300.0);
        assert_approx(without.max_monthly_repayment, 1_419.0);
        assert_approx(without.borrowing_capacity, 340_560.0);

        let with = household_income(&salaries, &properties, true);
        assert_approx(with.total, 5_350.0);
        assert_approx(with.max_monthly_repayment, 1_765.5);
        assert_approx(with.borrowing_capacity, 423_720.0);
    }
}
