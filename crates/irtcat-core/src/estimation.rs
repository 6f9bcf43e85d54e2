//! Maximum-likelihood ability estimation.
//!
//! Newton–Raphson (Fisher scoring) over the full response history,
//! starting from θ = 0. Responses whose item is not in the lookup are
//! skipped so that pruned item banks never break an estimate.

use crate::irt::{fisher_information_unchecked, probability_unchecked, slope_unchecked};
use crate::model::{AbilityEstimate, ItemLookup, Response};

/// Maximum Newton–Raphson iterations.
pub const MAX_ITERATIONS: usize = 50;

/// Updates smaller than this end the iteration.
pub const CONVERGENCE_TOLERANCE: f64 = 0.001;

/// Estimates are kept within `[-ABILITY_BOUND, ABILITY_BOUND]`.
///
/// All-correct and all-incorrect histories have no finite MLE; the bound
/// turns them into a well-defined extreme estimate.
pub const ABILITY_BOUND: f64 = 4.0;

/// Standard error reported when the history carries no information.
pub const MAX_STANDARD_ERROR: f64 = 1.0;

/// Estimate ability from a response history.
///
/// Returns `0.0` for an empty history (or one with no known items).
pub fn estimate_ability<L>(responses: &[Response], lookup: &L) -> f64
where
    L: ItemLookup + ?Sized,
{
    if responses.is_empty() {
        return 0.0;
    }

    let mut theta = 0.0;
    for iteration in 0..MAX_ITERATIONS {
        let mut derivative = 0.0;
        let mut information = 0.0;

        for response in responses {
            let Some(item) = lookup.item(&response.item_id) else {
                continue;
            };
            let params = item.params();
            let p = probability_unchecked(theta, params);
            let s = slope_unchecked(theta, params);

            if response.correct {
                derivative += s / p;
            } else {
                derivative -= s / (1.0 - p);
            }
            information += s * s / (p * (1.0 - p));
        }

        if !(information.is_finite() && information > 0.0) {
            tracing::debug!(iteration, "no usable information, stopping at θ={theta:.4}");
            break;
        }

        let update = derivative / information;
        theta = (theta + update).clamp(-ABILITY_BOUND, ABILITY_BOUND);

        if update.abs() < CONVERGENCE_TOLERANCE {
            break;
        }
        if iteration + 1 == MAX_ITERATIONS {
            tracing::debug!("ability estimate did not converge, last update {update:.5}");
        }
    }

    theta
}

/// Total Fisher information of a history at `ability`.
pub fn total_information<L>(responses: &[Response], lookup: &L, ability: f64) -> f64
where
    L: ItemLookup + ?Sized,
{
    if !ability.is_finite() {
        return 0.0;
    }
    responses
        .iter()
        .filter_map(|r| lookup.item(&r.item_id))
        .map(|item| fisher_information_unchecked(ability, item.params()))
        .sum()
}

/// Standard error of an ability estimate: `1 / √ΣI`.
///
/// Returns [`MAX_STANDARD_ERROR`] when the history carries no information.
pub fn standard_error<L>(responses: &[Response], lookup: &L, ability: f64) -> f64
where
    L: ItemLookup + ?Sized,
{
    let information = total_information(responses, lookup, ability);
    if information > 0.0 {
        1.0 / information.sqrt()
    } else {
        MAX_STANDARD_ERROR
    }
}

/// Ability and standard error for a history.
pub fn estimate<L>(responses: &[Response], lookup: &L) -> AbilityEstimate
where
    L: ItemLookup + ?Sized,
{
    let ability = estimate_ability(responses, lookup);
    AbilityEstimate {
        ability,
        standard_error: standard_error(responses, lookup, ability),
        sequence: responses.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DifficultyBand, Item};

    fn four_item_bank(guessing: f64) -> Vec<Item> {
        DifficultyBand::ALL
            .iter()
            .enumerate()
            .map(|(i, &band)| {
                Item::builder(format!("q{i}"), band)
                    .guessing(guessing)
                    .build()
                    .unwrap()
            })
            .collect()
    }

    fn alternating(n: usize) -> Vec<Response> {
        (0..n)
            .map(|i| Response::new(format!("q{}", i % 4), i % 2 == 0))
            .collect()
    }

    #[test]
    fn empty_history_is_zero() {
        let bank = four_item_bank(0.25);
        assert_eq!(estimate_ability(&[], &bank), 0.0);
        let est = estimate(&[], &bank);
        assert_eq!(est.standard_error, MAX_STANDARD_ERROR);
        assert_eq!(est.sequence, 0);
    }

    #[test]
    fn unknown_items_are_skipped() {
        let bank = four_item_bank(0.25);
        let mut responses = alternating(8);
        let baseline = estimate_ability(&responses, &bank);
        responses.insert(3, Response::new("retired-item", true));
        responses.push(Response::new("another-missing", false));
        let with_missing = estimate_ability(&responses, &bank);
        assert!((baseline - with_missing).abs() < 1e-12);
    }

    #[test]
    fn only_unknown_items_behaves_like_empty() {
        let bank = four_item_bank(0.25);
        let responses = vec![Response::new("gone", true), Response::new("gone", false)];
        assert_eq!(estimate_ability(&responses, &bank), 0.0);
        assert_eq!(standard_error(&responses, &bank, 0.0), MAX_STANDARD_ERROR);
    }

    #[test]
    fn extreme_patterns_stay_bounded() {
        let bank = four_item_bank(0.25);
        let all_correct: Vec<_> = (0..6)
            .map(|i| Response::new(format!("q{}", i % 4), true))
            .collect();
        let all_wrong: Vec<_> = (0..6)
            .map(|i| Response::new(format!("q{}", i % 4), false))
            .collect();
        let high = estimate_ability(&all_correct, &bank);
        let low = estimate_ability(&all_wrong, &bank);
        assert!(high.is_finite() && high > 1.0 && high <= ABILITY_BOUND);
        assert!(low.is_finite() && low < -1.0 && low >= -ABILITY_BOUND);
    }

    #[test]
    fn more_correct_answers_raise_the_estimate() {
        let bank = four_item_bank(0.25);
        let mostly_wrong: Vec<_> = (0..8)
            .map(|i| Response::new(format!("q{}", i % 4), i % 4 == 0))
            .collect();
        let mostly_right: Vec<_> = (0..8)
            .map(|i| Response::new(format!("q{}", i % 4), i % 4 != 3))
            .collect();
        assert!(estimate_ability(&mostly_right, &bank) > estimate_ability(&mostly_wrong, &bank));
    }

    #[test]
    fn estimate_is_a_stationary_point() {
        let bank = four_item_bank(0.0);
        let responses = alternating(10);
        let theta = estimate_ability(&responses, &bank);

        // The log-likelihood is maximized: nudging θ either way lowers it.
        let log_likelihood = |t: f64| -> f64 {
            responses
                .iter()
                .map(|r| {
                    let item = bank.item(&r.item_id).unwrap();
                    let p = probability_unchecked(t, item.params());
                    if r.correct { p.ln() } else { (1.0 - p).ln() }
                })
                .sum()
        };
        let at = log_likelihood(theta);
        assert!(at >= log_likelihood(theta + 0.05));
        assert!(at >= log_likelihood(theta - 0.05));
    }

    #[test]
    fn standard_error_shrinks_as_responses_accumulate() {
        let bank = four_item_bank(0.25);
        let responses = alternating(20);
        let mut previous = f64::INFINITY;
        for n in 1..=responses.len() {
            let se = standard_error(&responses[..n], &bank, 0.3);
            assert!(se <= previous, "SE grew at n={n}: {se} > {previous}");
            previous = se;
        }
    }

    #[test]
    fn standard_error_is_inverse_root_information() {
        let bank = four_item_bank(0.25);
        let responses = alternating(4);
        let info = total_information(&responses, &bank, 0.0);
        let se = standard_error(&responses, &bank, 0.0);
        assert!((se - 1.0 / info.sqrt()).abs() < 1e-12);
    }
}
