use serde::Serialize;

use super::types::SavedSimulation;

pub const ROI_WEIGHT: f64 = 0.4;
pub const CASHFLOW_WEIGHT: f64 = 0.3;
pub const CAP_RATE_WEIGHT: f64 = 0.2;
pub const EFFICIENCY_WEIGHT: f64 = 0.1;
/// Upper bound on the down-payment efficiency term before weighting.
pub const EFFICIENCY_CAP: f64 = 20.0;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RankingError {
    #[error("no simulations to rank")]
    Empty,

    #[error("not enough data to compare: {found} simulation(s), at least 2 required")]
    NotEnoughSimulations { found: usize },
}

/// Weighted contribution of each criterion to a simulation's score.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub roi: f64,
    pub cashflow: f64,
    pub cap_rate: f64,
    pub down_payment_efficiency: f64,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedSimulation {
    /// 1-based; position 1 is the best simulation.
    pub position: usize,
    pub score: ScoreBreakdown,
    pub simulation: SavedSimulation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comparison {
    pub winner: RankedSimulation,
    pub ranking: Vec<RankedSimulation>,
}

/// Scores one simulation on its own. Only upside is rewarded: a negative
/// ROI, cashflow or cap rate contributes 0 to its term.
pub fn score_breakdown(simulation: &SavedSimulation) -> ScoreBreakdown {
    let results = &simulation.results;
    let positive_cashflow = results.monthly_cashflow.max(0.0);

    let efficiency = if simulation.input.down_payment > 0.0 {
        (positive_cashflow / simulation.input.down_payment * 100.0).min(EFFICIENCY_CAP)
    } else {
        0.0
    };

    let roi = results.roi.max(0.0) * ROI_WEIGHT;
    let cashflow = positive_cashflow * CASHFLOW_WEIGHT;
    let cap_rate = results.cap_rate.max(0.0) * CAP_RATE_WEIGHT;
    let down_payment_efficiency = efficiency * EFFICIENCY_WEIGHT;

    ScoreBreakdown {
        roi,
        cashflow,
        cap_rate,
        down_payment_efficiency,
        total: roi + cashflow + cap_rate + down_payment_efficiency,
    }
}

pub fn composite_score(simulation: &SavedSimulation) -> f64 {
    score_breakdown(simulation).total
}

/// Orders simulations from best to worst. Equal scores keep their input
/// order, so the result is deterministic for any input.
pub fn rank(simulations: Vec<SavedSimulation>) -> Vec<RankedSimulation> {
    let mut scored: Vec<(ScoreBreakdown, SavedSimulation)> = simulations
        .into_iter()
        .map(|simulation| (score_breakdown(&simulation), simulation))
        .collect();
    scored.sort_by(|(a, _), (b, _)| b.total.total_cmp(&a.total));

    scored
        .into_iter()
        .enumerate()
        .map(|(idx, (score, simulation))| RankedSimulation {
            position: idx + 1,
            score,
            simulation,
        })
        .collect()
}

/// The highest-scoring simulation; the earliest one wins a tie.
pub fn best(simulations: &[SavedSimulation]) -> Result<&SavedSimulation, RankingError> {
    let mut iter = simulations.iter();
    let first = iter.next().ok_or(RankingError::Empty)?;

    let (winner, _) = iter.fold(
        (first, composite_score(first)),
        |(leader, leader_score), current| {
            let score = composite_score(current);
            if score.total_cmp(&leader_score).is_gt() {
                (current, score)
            } else {
                (leader, leader_score)
            }
        },
    );
    Ok(winner)
}

/// Ranks at least two simulations and singles out the winner.
pub fn compare(simulations: Vec<SavedSimulation>) -> Result<Comparison, RankingError> {
    if simulations.len() < 2 {
        return Err(RankingError::NotEnoughSimulations {
            found: simulations.len(),
        });
    }

    let ranking = rank(simulations);
    let winner = ranking[0].clone();
    Ok(Comparison { winner, ranking })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{PropertyType, SimulationInput, SimulationResult};
    use chrono::{TimeZone, Utc};
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};
    use uuid::Uuid;

    const EPS: f64 = 1e-9;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn simulation(name: &str, down_payment: f64, roi: f64, cashflow: f64, cap_rate: f64) -> SavedSimulation {
        SavedSimulation {
            id: Uuid::new_v4(),
            input: SimulationInput {
                name: name.to_string(),
                property_type: PropertyType::Apartment,
                price: 150_000.0,
                down_payment,
                monthly_rent: 900.0,
                loan_rate: 3.5,
                loan_duration: 20,
                monthly_charges: 0.0,
                property_tax: 0.0,
                insurance: 0.0,
                maintenance: 0.0,
                renovation_cost: 0.0,
                vacancy_rate: 5.0,
            },
            results: SimulationResult {
                loan_amount: 150_000.0 - down_payment,
                monthly_payment: 0.0,
                monthly_cashflow: cashflow,
                annual_cashflow: cashflow * 12.0,
                total_annual_income: 0.0,
                total_annual_expenses: 0.0,
                roi,
                cap_rate,
                cash_on_cash_return: roi,
                break_even_rent: 0.0,
                cumulative_net_worth: 0.0,
                cumulative_monthly_income: 0.0,
            },
            created_at: Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(),
        }
    }

    fn names(ranking: &[RankedSimulation]) -> Vec<&str> {
        ranking
            .iter()
            .map(|r| r.simulation.input.name.as_str())
            .collect()
    }

    #[test]
    fn all_zero_simulation_scores_exactly_zero() {
        let sim = simulation("zero", 0.0, 0.0, 0.0, 0.0);
        assert_eq!(composite_score(&sim), 0.0);
    }

    #[test]
    fn score_weights_each_criterion() {
        let sim = simulation("weighted", 10_000.0, 8.0, 150.0, 6.0);
        let score = score_breakdown(&sim);

        assert_approx(score.roi, 3.2);
        assert_approx(score.cashflow, 45.0);
        assert_approx(score.cap_rate, 1.2);
        assert_approx(score.down_payment_efficiency, 0.15);
        assert_approx(score.total, 3.2 + 45.0 + 1.2 + 0.15);
    }

    #[test]
    fn negative_metrics_contribute_nothing() {
        let small_loss = simulation("small", 10_000.0, -1.0, -10.0, -0.5);
        let big_loss = simulation("big", 10_000.0, -40.0, -900.0, -3.0);

        assert_eq!(composite_score(&small_loss), 0.0);
        assert_eq!(composite_score(&big_loss), 0.0);
    }

    #[test]
    fn efficiency_term_is_capped() {
        let sim = simulation("tiny down payment", 100.0, 0.0, 500.0, 0.0);
        let score = score_breakdown(&sim);
        assert_approx(score.down_payment_efficiency, EFFICIENCY_CAP * EFFICIENCY_WEIGHT);
    }

    #[test]
    fn efficiency_term_is_zero_without_down_payment() {
        let sim = simulation("fully financed", 0.0, 0.0, 500.0, 0.0);
        assert_eq!(score_breakdown(&sim).down_payment_efficiency, 0.0);
    }

    #[test]
    fn rank_orders_two_simulations_by_score() {
        let weak = simulation("weak", 30_000.0, 2.0, 50.0, 4.0);
        let strong = simulation("strong", 30_000.0, 9.0, 300.0, 7.0);

        let ranking = rank(vec![weak, strong]);
        assert_eq!(ranking.len(), 2);
        assert_eq!(names(&ranking), vec!["strong", "weak"]);
        assert!(ranking[0].score.total >= ranking[1].score.total);
        assert_eq!(ranking[0].position, 1);
        assert_eq!(ranking[1].position, 2);
    }

    #[test]
    fn equal_scores_keep_input_order() {
        let first = simulation("first", 20_000.0, 5.0, 100.0, 6.0);
        let second = simulation("second", 20_000.0, 5.0, 100.0, 6.0);
        let third = simulation("third", 20_000.0, 5.0, 100.0, 6.0);
        let worse = simulation("worse", 20_000.0, 1.0, 10.0, 1.0);

        let ranking = rank(vec![worse.clone(), first.clone(), second.clone(), third.clone()]);
        assert_eq!(names(&ranking), vec!["first", "second", "third", "worse"]);
        assert_eq!(
            ranking.iter().map(|r| r.position).collect::<Vec<_>>(),
            vec![1, 2, 3, 4]
        );

        let sims = [first, second, third];
        assert_eq!(best(&sims).map(|s| s.input.name.as_str()), Ok("first"));
    }

    #[test]
    fn rank_of_nothing_is_empty() {
        assert!(rank(Vec::new()).is_empty());
    }

    #[test]
    fn best_of_one_is_that_simulation() {
        let only = simulation("only", 20_000.0, -3.0, -50.0, 2.0);
        let sims = [only.clone()];
        assert_eq!(best(&sims), Ok(&only));
    }

    #[test]
    fn best_of_none_is_an_error() {
        assert_eq!(best(&[]), Err(RankingError::Empty));
    }

    #[test]
    fn best_matches_first_ranked() {
        let sims = vec![
            simulation("a", 25_000.0, 3.0, 80.0, 5.0),
            simulation("b", 15_000.0, 7.5, 210.0, 6.2),
            simulation("c", 40_000.0, 6.0, 260.0, 5.1),
        ];
        let expected = best(&sims).cloned();
        let ranking = rank(sims);
        assert_eq!(expected, Ok(ranking[0].simulation.clone()));
    }

    #[test]
    fn compare_requires_two_simulations() {
        assert_eq!(
            compare(Vec::new()),
            Err(RankingError::NotEnoughSimulations { found: 0 })
        );
        assert_eq!(
            compare(vec![simulation("solo", 10_000.0, 5.0, 100.0, 5.0)]),
            Err(RankingError::NotEnoughSimulations { found: 1 })
        );

        let err = RankingError::NotEnoughSimulations { found: 1 };
        assert!(err.to_string().contains("not enough data to compare"));
    }

    #[test]
    fn compare_reports_winner_and_full_ranking() {
        let comparison = compare(vec![
            simulation("a", 25_000.0, 3.0, 80.0, 5.0),
            simulation("b", 15_000.0, 7.5, 210.0, 6.2),
        ])
        .expect("two simulations compare");

        assert_eq!(comparison.winner.simulation.input.name, "b");
        assert_eq!(comparison.winner.position, 1);
        assert_eq!(comparison.ranking.len(), 2);
        assert_eq!(comparison.ranking[0], comparison.winner);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_higher_roi_never_scores_lower(
            roi_bp in 0u32..5_000,
            extra_bp in 1u32..5_000,
            cashflow in -500i32..2_000,
            cap_bp in -200i32..2_000,
            down_payment in 0u32..200_000
        ) {
            let low = simulation(
                "low",
                down_payment as f64,
                roi_bp as f64 / 100.0,
                cashflow as f64,
                cap_bp as f64 / 100.0,
            );
            let mut high = low.clone();
            high.results.roi = (roi_bp + extra_bp) as f64 / 100.0;

            prop_assert!(composite_score(&high) >= composite_score(&low));
        }

        #[test]
        fn prop_rank_is_sorted_and_complete(
            metrics in proptest::collection::vec((-50i32..50, -1_000i32..3_000, -5i32..15, 0u32..100_000), 0..12)
        ) {
            let sims: Vec<SavedSimulation> = metrics
                .iter()
                .enumerate()
                .map(|(idx, (roi, cashflow, cap, dp))| {
                    simulation(&idx.to_string(), *dp as f64, *roi as f64, *cashflow as f64, *cap as f64)
                })
                .collect();
            let count = sims.len();

            let ranking = rank(sims);
            prop_assert_eq!(ranking.len(), count);
            for pair in ranking.windows(2) {
                prop_assert!(pair[0].score.total >= pair[1].score.total);
                prop_assert_eq!(pair[0].position + 1, pair[1].position);
                prop_assert!(pair[0].score.total >= 0.0);
            }
        }
    }
}
