//! Three-parameter logistic (3PL) item response model.
//!
//! `P(correct | θ) = c + (1 - c) / (1 + exp(-a(θ - b)))`, clamped to
//! `[PROBABILITY_FLOOR, PROBABILITY_CEILING]` so that downstream
//! log-likelihood terms never see 0 or 1.

use crate::error::CatResult;
use crate::model::{
    validate_discrimination, validate_finite, validate_guessing, ItemParameters,
};

/// Lower clamp for response probabilities.
pub const PROBABILITY_FLOOR: f64 = 0.01;

/// Upper clamp for response probabilities.
pub const PROBABILITY_CEILING: f64 = 0.99;

#[inline]
pub(crate) fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let exp_x = x.exp();
        exp_x / (1.0 + exp_x)
    }
}

/// Probability of a correct response under the 3PL model.
///
/// Rejects non-finite ability or difficulty, discrimination `<= 0` and
/// guessing outside `[0, 1)` instead of clamping them.
pub fn probability_correct(
    ability: f64,
    difficulty: f64,
    discrimination: f64,
    guessing: f64,
) -> CatResult<f64> {
    validate_finite("ability", ability)?;
    validate_finite("difficulty", difficulty)?;
    validate_discrimination(discrimination)?;
    validate_guessing(guessing)?;
    Ok(raw_probability(ability, difficulty, discrimination, guessing))
}

/// [`probability_correct`] for an already validated parameter set.
pub fn probability_for(ability: f64, params: &ItemParameters) -> CatResult<f64> {
    validate_finite("ability", ability)?;
    Ok(probability_unchecked(ability, params))
}

#[inline]
pub(crate) fn probability_unchecked(ability: f64, params: &ItemParameters) -> f64 {
    raw_probability(
        ability,
        params.difficulty(),
        params.discrimination(),
        params.guessing(),
    )
}

#[inline]
fn raw_probability(ability: f64, difficulty: f64, discrimination: f64, guessing: f64) -> f64 {
    let p = guessing + (1.0 - guessing) * sigmoid(discrimination * (ability - difficulty));
    p.clamp(PROBABILITY_FLOOR, PROBABILITY_CEILING)
}

/// Derivative of the unclamped 3PL curve with respect to ability.
///
/// Equal to `a(1-c)·exp(-z) / (1 + exp(-z))²` with `z = a(θ - b)`,
/// evaluated as `a(1-c)·σ(z)(1-σ(z))` to stay finite for large `|z|`.
#[inline]
pub(crate) fn slope_unchecked(ability: f64, params: &ItemParameters) -> f64 {
    let a = params.discrimination();
    let s = sigmoid(a * (ability - params.difficulty()));
    a * (1.0 - params.guessing()) * s * (1.0 - s)
}

/// Selection information of an item at `ability`: `a²·p·(1-p)`.
pub fn item_information(ability: f64, params: &ItemParameters) -> CatResult<f64> {
    validate_finite("ability", ability)?;
    Ok(information_unchecked(ability, params))
}

#[inline]
pub(crate) fn information_unchecked(ability: f64, params: &ItemParameters) -> f64 {
    let a = params.discrimination();
    let p = probability_unchecked(ability, params);
    a * a * p * (1.0 - p)
}

/// Fisher information a response contributes to the likelihood:
/// `s² / (p(1-p))`.
#[inline]
pub(crate) fn fisher_information_unchecked(ability: f64, params: &ItemParameters) -> f64 {
    let p = probability_unchecked(ability, params);
    let s = slope_unchecked(ability, params);
    s * s / (p * (1.0 - p))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CatError;
    use crate::model::Difficulty;

    fn params(b: f64, a: f64, c: f64) -> ItemParameters {
        ItemParameters::new(Difficulty::Calibrated { value: b }, a, c).unwrap()
    }

    #[test]
    fn probability_at_difficulty_is_midpoint_above_guessing() {
        let p = probability_correct(0.4, 0.4, 1.0, 0.25).unwrap();
        assert!((p - 0.625).abs() < 1e-12, "got {p}");
    }

    #[test]
    fn probability_without_guessing_is_logistic() {
        let p = probability_correct(0.0, 0.5, 1.0, 0.0).unwrap();
        let expected = 1.0 / (1.0 + 0.5f64.exp());
        assert!((p - expected).abs() < 1e-12);
    }

    #[test]
    fn probability_is_clamped() {
        assert_eq!(probability_correct(50.0, 0.0, 1.0, 0.25).unwrap(), 0.99);
        assert_eq!(probability_correct(-50.0, 0.0, 1.0, 0.0).unwrap(), 0.01);
        // Extreme arguments must not overflow into NaN.
        assert_eq!(probability_correct(1e6, -1e6, 10.0, 0.0).unwrap(), 0.99);
    }

    #[test]
    fn probability_monotone_in_ability() {
        for &(b, a, c) in &[(0.2, 1.0, 0.25), (-1.0, 2.5, 0.0), (0.8, 0.3, 0.5)] {
            let mut previous = 0.0;
            for step in -80..=80 {
                let theta = step as f64 * 0.1;
                let p = probability_correct(theta, b, a, c).unwrap();
                assert!(p >= previous, "non-monotone at θ={theta}: {p} < {previous}");
                assert!((PROBABILITY_FLOOR..=PROBABILITY_CEILING).contains(&p));
                previous = p;
            }
        }
    }

    #[test]
    fn invalid_inputs_are_rejected() {
        assert!(matches!(
            probability_correct(f64::NAN, 0.0, 1.0, 0.25),
            Err(CatError::InvalidParameter { name: "ability", .. })
        ));
        assert!(probability_correct(0.0, f64::INFINITY, 1.0, 0.25).is_err());
        assert!(probability_correct(0.0, 0.0, -1.0, 0.25).is_err());
        assert!(probability_correct(0.0, 0.0, 1.0, 1.0).is_err());
        assert!(probability_correct(0.0, 0.0, 1.0, -0.01).is_err());
    }

    #[test]
    fn information_peaks_near_difficulty() {
        let item = params(0.5, 1.5, 0.0);
        let at_b = item_information(0.5, &item).unwrap();
        let far = item_information(3.0, &item).unwrap();
        assert!((at_b - 1.5 * 1.5 * 0.25).abs() < 1e-12);
        assert!(far < at_b);
    }

    #[test]
    fn slope_matches_closed_form() {
        let item = params(0.3, 1.2, 0.2);
        let theta = -0.4;
        let z: f64 = 1.2 * (theta - 0.3);
        let expected = 1.2 * 0.8 * (-z).exp() / (1.0 + (-z).exp()).powi(2);
        assert!((slope_unchecked(theta, &item) - expected).abs() < 1e-12);
    }

    #[test]
    fn fisher_information_is_positive_and_finite() {
        let item = params(0.0, 1.0, 0.25);
        for theta in [-4.0, 0.0, 4.0] {
            let info = fisher_information_unchecked(theta, &item);
            assert!(info.is_finite() && info > 0.0);
        }
    }
}
