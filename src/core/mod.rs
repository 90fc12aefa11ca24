mod engine;
mod portfolio;
mod ranking;
mod types;

pub use engine::{compute_results, effective_monthly_rent, monthly_payment};
pub use portfolio::{
    Affordability, BANK_RENTAL_INCOME_SHARE, BORROWING_HORIZON_YEARS, DEBT_RATIO_CAP, GoalProgress,
    HouseholdIncome, PortfolioSummary, affordability, goal_progress, household_income,
};
pub use ranking::{
    Comparison, RankedSimulation, RankingError, ScoreBreakdown, best, compare, composite_score,
    rank, score_breakdown,
};
pub use types::{
    Baseline, LOAN_DURATIONS, Preferences, Property, PropertyDraft, PropertyType, SavedSimulation,
    SimulationInput, SimulationResult,
};
