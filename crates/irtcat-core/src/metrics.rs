//! Post-hoc diagnostics for a completed or ongoing session.
//!
//! The convergence trajectory re-estimates ability on every prefix of the
//! history, which is O(n²) in the session length. Sessions are short
//! (bounded by the question cap), and recomputing from scratch keeps every
//! point reproducible from the history alone.

use serde::{Deserialize, Serialize};

use crate::estimation::{estimate_ability, standard_error};
use crate::model::{ItemLookup, Response};
use crate::stopping::population_sd;
use crate::strategy::StrategyKind;

/// Bounds on the theoretical optimal session length.
pub const OPTIMAL_LENGTH_RANGE: (f64, f64) = (5.0, 30.0);

/// Information per question treated as full utilization.
pub const REFERENCE_INFORMATION: f64 = 2.0;

/// Number of trailing trajectory points used for ability stability.
pub const STABILITY_POINTS: usize = 3;

/// Ability and standard error after one more response.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConvergencePoint {
    /// 1-based question number.
    pub question: usize,
    pub ability: f64,
    pub standard_error: f64,
    pub correct: bool,
}

/// Session diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdaptiveMetrics {
    /// Strategy that drove selection.
    pub algorithm: StrategyKind,
    pub total_questions: usize,
    pub final_ability: f64,
    pub final_standard_error: f64,
    /// Share of correct responses.
    pub accuracy: f64,
    pub mean_response_secs: f64,
    pub convergence: Vec<ConvergencePoint>,
    /// Theoretical optimal length over actual length, capped at 1.
    pub algorithm_efficiency: f64,
    /// Recorded information gained relative to the reference per question.
    pub question_utilization: f64,
    /// One minus the spread of the last trajectory abilities.
    pub ability_stability: f64,
}

/// Theoretical optimal session length for a final ability:
/// `clamp(15 - 5·|θ|, 5, 30)`.
pub fn optimal_length(final_ability: f64) -> f64 {
    let (min, max) = OPTIMAL_LENGTH_RANGE;
    (15.0 - 5.0 * final_ability.abs()).clamp(min, max)
}

/// Build the diagnostics for a response history.
///
/// Responses whose item is missing from `lookup` are skipped entirely: they
/// count toward no total, ratio, or trajectory point.
pub fn build_metrics<L>(
    responses: &[Response],
    lookup: &L,
    final_ability: f64,
    algorithm: StrategyKind,
) -> AdaptiveMetrics
where
    L: ItemLookup + ?Sized,
{
    let resolved: Vec<Response> = responses
        .iter()
        .filter(|r| lookup.item(&r.item_id).is_some())
        .cloned()
        .collect();
    if resolved.len() < responses.len() {
        tracing::debug!(
            skipped = responses.len() - resolved.len(),
            "metrics skipped responses with unknown items"
        );
    }
    let responses = resolved.as_slice();

    let n = responses.len();
    let final_ability = if final_ability.is_finite() {
        final_ability
    } else {
        0.0
    };

    let convergence: Vec<ConvergencePoint> = (1..=n)
        .map(|len| {
            let prefix = &responses[..len];
            let ability = estimate_ability(prefix, lookup);
            ConvergencePoint {
                question: len,
                ability,
                standard_error: standard_error(prefix, lookup, ability),
                correct: prefix[len - 1].correct,
            }
        })
        .collect();

    if n == 0 {
        return AdaptiveMetrics {
            algorithm,
            total_questions: 0,
            final_ability,
            final_standard_error: standard_error(responses, lookup, final_ability),
            accuracy: 0.0,
            mean_response_secs: 0.0,
            convergence,
            algorithm_efficiency: 0.0,
            question_utilization: 0.0,
            ability_stability: 0.0,
        };
    }

    let count = n as f64;
    let accuracy = responses.iter().filter(|r| r.correct).count() as f64 / count;
    let mean_response_secs = responses.iter().map(|r| r.elapsed_secs).sum::<f64>() / count;
    let information: f64 = responses.iter().map(|r| r.information_gained).sum();

    let tail_start = convergence.len().saturating_sub(STABILITY_POINTS);
    let recent: Vec<f64> = convergence[tail_start..].iter().map(|p| p.ability).collect();

    AdaptiveMetrics {
        algorithm,
        total_questions: n,
        final_ability,
        final_standard_error: standard_error(responses, lookup, final_ability),
        accuracy,
        mean_response_secs,
        convergence,
        algorithm_efficiency: (optimal_length(final_ability) / count).min(1.0),
        question_utilization: information / (count * REFERENCE_INFORMATION),
        ability_stability: (1.0 - population_sd(&recent)).max(0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DifficultyBand, Item};

    fn bank() -> Vec<Item> {
        DifficultyBand::ALL
            .iter()
            .enumerate()
            .map(|(i, &band)| Item::builder(format!("q{i}"), band).build().unwrap())
            .collect()
    }

    fn history(n: usize) -> Vec<Response> {
        (0..n)
            .map(|i| {
                Response::new(format!("q{}", i % 4), i % 2 == 0)
                    .with_elapsed(10.0 + i as f64)
                    .with_selection(0.0, 0.5)
            })
            .collect()
    }

    #[test]
    fn optimal_length_is_clamped() {
        assert_eq!(optimal_length(0.0), 15.0);
        assert_eq!(optimal_length(-1.0), 10.0);
        assert_eq!(optimal_length(3.0), 5.0);
    }

    #[test]
    fn empty_history_yields_zeroed_metrics() {
        let metrics = build_metrics(&[], &bank(), 0.0, StrategyKind::Standard);
        assert_eq!(metrics.total_questions, 0);
        assert!(metrics.convergence.is_empty());
        assert_eq!(metrics.algorithm_efficiency, 0.0);
        assert_eq!(metrics.question_utilization, 0.0);
        assert_eq!(metrics.ability_stability, 0.0);
        assert_eq!(metrics.final_standard_error, 1.0);
    }

    #[test]
    fn trajectory_matches_prefix_estimates() {
        let bank = bank();
        let responses = history(8);
        let final_ability = estimate_ability(&responses, &bank);
        let metrics = build_metrics(&responses, &bank, final_ability, StrategyKind::Progressive);

        assert_eq!(metrics.convergence.len(), 8);
        assert_eq!(metrics.convergence[0].question, 1);
        let last = metrics.convergence.last().unwrap();
        assert_eq!(last.question, 8);
        assert!((last.ability - final_ability).abs() < 1e-12);
        assert!((metrics.final_standard_error - last.standard_error).abs() < 1e-12);
        assert!(metrics.convergence[0].correct);
        assert!(!metrics.convergence[1].correct);
    }

    #[test]
    fn summary_ratios() {
        let bank = bank();
        let responses = history(20);
        let metrics = build_metrics(&responses, &bank, 0.0, StrategyKind::Standard);

        assert_eq!(metrics.accuracy, 0.5);
        assert!((metrics.mean_response_secs - 19.5).abs() < 1e-12);
        // 15 optimal questions over 20 asked.
        assert!((metrics.algorithm_efficiency - 0.75).abs() < 1e-12);
        // 20 × 0.5 information over 20 × 2.0.
        assert!((metrics.question_utilization - 0.25).abs() < 1e-12);
        assert!(metrics.ability_stability > 0.0 && metrics.ability_stability <= 1.0);
    }

    #[test]
    fn efficiency_caps_at_one_for_short_sessions() {
        let metrics = build_metrics(&history(3), &bank(), 0.0, StrategyKind::Standard);
        assert_eq!(metrics.algorithm_efficiency, 1.0);
    }

    #[test]
    fn missing_items_do_not_break_metrics() {
        let bank = bank();
        let mut responses = history(6);
        let known = build_metrics(&responses, &bank, 0.2, StrategyKind::Standard);

        responses.insert(2, Response::new("pruned", false).with_elapsed(500.0));
        responses.push(Response::new("pruned", true).with_selection(0.0, 9.0));
        let metrics = build_metrics(&responses, &bank, 0.2, StrategyKind::Standard);

        assert_eq!(metrics.total_questions, 6);
        assert_eq!(metrics.convergence.len(), 6);
        assert_eq!(metrics, known);
    }
}
