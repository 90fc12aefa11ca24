use super::types::{Baseline, SimulationInput, SimulationResult};

const MONTHS_PER_YEAR: f64 = 12.0;

/// Runs the amortization and cashflow model for one scenario.
///
/// The result depends only on `input` and `baseline`. Degenerate numbers
/// (zero rate, zero or negative loan, zero investment) fall back to defined
/// values instead of dividing by zero; non-finite inputs are propagated and
/// must be rejected by the caller.
pub fn compute_results(input: &SimulationInput, baseline: Baseline) -> SimulationResult {
    let loan_amount = input.price - input.down_payment;
    let monthly_payment = monthly_payment(loan_amount, input.loan_rate, input.loan_duration);

    let effective_monthly_rent = effective_monthly_rent(input.monthly_rent, input.vacancy_rate);
    let total_monthly_expenses = monthly_payment
        + input.monthly_charges
        + input.property_tax / MONTHS_PER_YEAR
        + input.insurance / MONTHS_PER_YEAR
        + input.maintenance / MONTHS_PER_YEAR;

    let monthly_cashflow = effective_monthly_rent - total_monthly_expenses;
    let annual_cashflow = monthly_cashflow * MONTHS_PER_YEAR;
    let total_annual_income = effective_monthly_rent * MONTHS_PER_YEAR;
    let total_annual_expenses = total_monthly_expenses * MONTHS_PER_YEAR;

    let total_investment = input.down_payment + input.renovation_cost;
    let roi = percent_of(annual_cashflow, total_investment);

    let total_property_value = input.price + input.renovation_cost;
    let cap_rate = percent_of(total_annual_income, total_property_value);

    SimulationResult {
        loan_amount,
        monthly_payment,
        monthly_cashflow,
        annual_cashflow,
        total_annual_income,
        total_annual_expenses,
        roi,
        cap_rate,
        cash_on_cash_return: roi,
        break_even_rent: total_monthly_expenses,
        cumulative_net_worth: baseline.net_worth
            + (input.price + input.renovation_cost - loan_amount),
        cumulative_monthly_income: baseline.monthly_income + effective_monthly_rent,
    }
}

/// Fixed-rate annuity payment for `loan_amount` at `annual_rate_percent`
/// over `duration_years`.
pub fn monthly_payment(loan_amount: f64, annual_rate_percent: f64, duration_years: u32) -> f64 {
    if loan_amount <= 0.0 {
        return 0.0;
    }

    let total_payments = duration_years.saturating_mul(12);
    if total_payments == 0 {
        return loan_amount;
    }

    let monthly_rate = annual_rate_percent / 100.0 / MONTHS_PER_YEAR;
    if monthly_rate == 0.0 {
        return loan_amount / f64::from(total_payments);
    }

    let growth = (1.0 + monthly_rate).powf(f64::from(total_payments));
    loan_amount * monthly_rate * growth / (growth - 1.0)
}

pub fn effective_monthly_rent(monthly_rent: f64, vacancy_rate_percent: f64) -> f64 {
    monthly_rent * (1.0 - vacancy_rate_percent / 100.0)
}

fn percent_of(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator * 100.0
    } else {
        0.0
    }
}
