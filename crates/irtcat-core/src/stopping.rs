//! Session stopping rule.
//!
//! Checked in order: minimum exposure, hard length cap, precision target,
//! and, for longer sessions, stabilization of the recent estimates.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::estimation::{estimate_ability, standard_error};
use crate::model::{ItemLookup, Response};

/// Sessions always continue below this many responses.
pub const MIN_QUESTIONS: usize = 5;

/// Default precision target for the standard error.
pub const DEFAULT_TARGET_SE: f64 = 0.3;

/// Default hard cap on session length.
pub const DEFAULT_MAX_QUESTIONS: usize = 30;

/// Histories at least this long are checked for stabilization.
pub const STABILITY_MIN_QUESTIONS: usize = 10;

/// Number of trailing prefixes compared for stabilization.
pub const STABILITY_WINDOW: usize = 5;

/// Standard deviation below which recent estimates count as stable.
pub const STABILITY_THRESHOLD: f64 = 0.1;

/// Why a session stopped or continues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Fewer than [`MIN_QUESTIONS`] responses.
    MinimumExposure,
    /// The maximum number of questions has been asked.
    MaxQuestions,
    /// The standard error reached the target.
    PrecisionReached,
    /// Recent estimates stopped moving.
    Stabilized,
    /// None of the stopping conditions holds.
    Continue,
}

impl StopReason {
    pub fn should_continue(self) -> bool {
        matches!(self, StopReason::MinimumExposure | StopReason::Continue)
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::MinimumExposure => write!(f, "minimum_exposure"),
            StopReason::MaxQuestions => write!(f, "max_questions"),
            StopReason::PrecisionReached => write!(f, "precision_reached"),
            StopReason::Stabilized => write!(f, "stabilized"),
            StopReason::Continue => write!(f, "continue"),
        }
    }
}

/// Stopping rule parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoppingRule {
    pub max_questions: usize,
    pub target_se: f64,
}

impl Default for StoppingRule {
    fn default() -> Self {
        Self {
            max_questions: DEFAULT_MAX_QUESTIONS,
            target_se: DEFAULT_TARGET_SE,
        }
    }
}

impl StoppingRule {
    pub fn new(max_questions: usize, target_se: f64) -> Self {
        Self {
            max_questions,
            target_se,
        }
    }

    /// Decide whether the session continues, and why.
    pub fn decide<L>(&self, responses: &[Response], lookup: &L, ability: f64) -> StopReason
    where
        L: ItemLookup + ?Sized,
    {
        let n = responses.len();
        if n < MIN_QUESTIONS {
            return StopReason::MinimumExposure;
        }
        if n >= self.max_questions {
            return StopReason::MaxQuestions;
        }
        if standard_error(responses, lookup, ability) <= self.target_se {
            return StopReason::PrecisionReached;
        }
        if n >= STABILITY_MIN_QUESTIONS
            && recent_estimates_sd(responses, lookup) < STABILITY_THRESHOLD
        {
            return StopReason::Stabilized;
        }
        StopReason::Continue
    }
}

/// Whether a session should ask another question.
pub fn should_continue<L>(
    responses: &[Response],
    lookup: &L,
    ability: f64,
    max_questions: usize,
    target_se: f64,
) -> bool
where
    L: ItemLookup + ?Sized,
{
    StoppingRule::new(max_questions, target_se)
        .decide(responses, lookup, ability)
        .should_continue()
}

/// Population standard deviation of the estimates on the last
/// [`STABILITY_WINDOW`] prefixes of the history.
fn recent_estimates_sd<L>(responses: &[Response], lookup: &L) -> f64
where
    L: ItemLookup + ?Sized,
{
    let n = responses.len();
    let first = n.saturating_sub(STABILITY_WINDOW - 1).max(1);
    let estimates: Vec<f64> = (first..=n)
        .map(|len| estimate_ability(&responses[..len], lookup))
        .collect();
    population_sd(&estimates)
}

pub(crate) fn population_sd(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt()
}
