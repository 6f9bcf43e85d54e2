//! Selection strategy variants.
//!
//! Each variant narrows the candidate set or adjusts the constraints and
//! then delegates to [`select_next`]. Variants are plain data: the same
//! inputs always produce the same selection.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::model::{DifficultyBand, Item, ItemLookup, Response, SelectionConstraints};
use crate::selection::{select_among, select_next, Selection};

/// Number of recent responses inspected by the progressive and
/// fatigue-aware strategies.
pub const RECENT_WINDOW: usize = 3;

/// Recent accuracy at or above which progressive selection steps up.
pub const PROGRESS_UP_ACCURACY: f64 = 0.8;

/// Recent accuracy at or below which progressive selection steps down.
pub const PROGRESS_DOWN_ACCURACY: f64 = 0.4;

/// Recent-to-overall response time ratio that signals fatigue.
pub const FATIGUE_RATIO: f64 = 1.3;

/// Confidence at or above which a response counts as confident.
pub const HIGH_CONFIDENCE: f64 = 0.7;

/// Confidence at or below which a response counts as unconfident.
pub const LOW_CONFIDENCE: f64 = 0.3;

/// Strategy used to select items, with its parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SelectionStrategy {
    /// Plain maximum-information selection.
    #[default]
    Standard,
    /// Prefer items in the mission's target bands.
    MissionAligned { target_bands: Vec<DifficultyBand> },
    /// Prefer items in the goal's subjects, spread evenly across them.
    GoalAligned { subjects: Vec<String> },
    /// Start easy and step bands up or down with recent accuracy.
    Progressive,
    /// Step down a band when recent answers slow down.
    FatigueAware,
    /// Counter over- or under-confidence with harder or easier bands.
    ConfidenceAware,
}

/// Parameter-free name of a [`SelectionStrategy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Standard,
    MissionAligned,
    GoalAligned,
    Progressive,
    FatigueAware,
    ConfidenceAware,
}

impl SelectionStrategy {
    pub fn kind(&self) -> StrategyKind {
        match self {
            SelectionStrategy::Standard => StrategyKind::Standard,
            SelectionStrategy::MissionAligned { .. } => StrategyKind::MissionAligned,
            SelectionStrategy::GoalAligned { .. } => StrategyKind::GoalAligned,
            SelectionStrategy::Progressive => StrategyKind::Progressive,
            SelectionStrategy::FatigueAware => StrategyKind::FatigueAware,
            SelectionStrategy::ConfidenceAware => StrategyKind::ConfidenceAware,
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StrategyKind::Standard => "standard",
            StrategyKind::MissionAligned => "mission_aligned",
            StrategyKind::GoalAligned => "goal_aligned",
            StrategyKind::Progressive => "progressive",
            StrategyKind::FatigueAware => "fatigue_aware",
            StrategyKind::ConfidenceAware => "confidence_aware",
        };
        f.write_str(name)
    }
}

impl FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "standard" | "max_info" => Ok(StrategyKind::Standard),
            "mission_aligned" | "mission" => Ok(StrategyKind::MissionAligned),
            "goal_aligned" | "goal" => Ok(StrategyKind::GoalAligned),
            "progressive" => Ok(StrategyKind::Progressive),
            "fatigue_aware" | "fatigue" => Ok(StrategyKind::FatigueAware),
            "confidence_aware" | "confidence" => Ok(StrategyKind::ConfidenceAware),
            other => Err(format!("unknown selection strategy: {other}")),
        }
    }
}

/// Select the next item using a strategy variant.
///
/// When a variant's restriction leaves no admissible item, selection falls
/// back to the caller's constraints alone.
pub fn select_with_strategy<'a, L>(
    strategy: &SelectionStrategy,
    candidates: &'a [Item],
    ability: f64,
    history: &[Response],
    lookup: &L,
    constraints: Option<&SelectionConstraints>,
) -> Option<Selection<'a>>
where
    L: ItemLookup + ?Sized,
{
    let base = constraints.cloned().unwrap_or_default();

    let restricted = match strategy {
        SelectionStrategy::Standard => None,
        SelectionStrategy::MissionAligned { target_bands } => {
            Some(base.clone().with_bands(intersect_bands(&base, target_bands)))
        }
        SelectionStrategy::GoalAligned { subjects } => {
            if let Some(narrowed) = goal_constraints(&base, subjects) {
                let in_goal = candidates
                    .iter()
                    .filter(|item| subjects.iter().any(|s| s == item.subject()));
                if let Some(selection) = select_among(in_goal, ability, history, lookup, &narrowed)
                {
                    return Some(selection);
                }
                tracing::debug!("no items in goal subjects, falling back");
            }
            None
        }
        SelectionStrategy::Progressive => {
            let band = progressive_band(history, lookup, ability);
            Some(base.clone().with_bands(intersect_bands(&base, &[band])))
        }
        SelectionStrategy::FatigueAware => fatigued(history).then(|| {
            let band = current_band(history, lookup, ability).easier();
            base.clone().with_bands(intersect_bands(&base, &[band]))
        }),
        SelectionStrategy::ConfidenceAware => confidence_bands(history, lookup, ability)
            .map(|bands| base.clone().with_bands(intersect_bands(&base, &bands))),
    };

    if let Some(narrowed) = restricted {
        if let Some(selection) = select_next(candidates, ability, history, lookup, Some(&narrowed))
        {
            return Some(selection);
        }
        tracing::debug!(
            strategy = %strategy.kind(),
            "strategy restriction left no items, falling back"
        );
    }
    select_next(candidates, ability, history, lookup, Some(&base))
}

/// `wanted` bands that the caller's own constraints also allow.
fn intersect_bands(
    base: &SelectionConstraints,
    wanted: &[DifficultyBand],
) -> Vec<DifficultyBand> {
    match &base.difficulty_bands {
        Some(allowed) => wanted
            .iter()
            .copied()
            .filter(|band| allowed.contains(band))
            .collect(),
        None => wanted.to_vec(),
    }
}

/// Even subject distribution over the goal's subjects.
fn goal_constraints(
    base: &SelectionConstraints,
    subjects: &[String],
) -> Option<SelectionConstraints> {
    if subjects.is_empty() {
        return None;
    }
    let share = 1.0 / subjects.len() as f64;
    let distribution: BTreeMap<String, f64> =
        subjects.iter().map(|s| (s.clone(), share)).collect();
    Some(base.clone().with_subject_distribution(distribution))
}

/// Band of the last answered item, or the band nearest the ability.
pub fn current_band<L>(history: &[Response], lookup: &L, ability: f64) -> DifficultyBand
where
    L: ItemLookup + ?Sized,
{
    history
        .last()
        .and_then(|r| lookup.item(&r.item_id))
        .map(Item::band)
        .unwrap_or_else(|| DifficultyBand::nearest(ability))
}

fn recent(history: &[Response]) -> &[Response] {
    &history[history.len().saturating_sub(RECENT_WINDOW)..]
}

fn progressive_band<L>(history: &[Response], lookup: &L, ability: f64) -> DifficultyBand
where
    L: ItemLookup + ?Sized,
{
    if history.is_empty() {
        return DifficultyBand::Beginner;
    }
    let window = recent(history);
    let accuracy = window.iter().filter(|r| r.correct).count() as f64 / window.len() as f64;
    let band = current_band(history, lookup, ability);
    if accuracy >= PROGRESS_UP_ACCURACY {
        band.harder()
    } else if accuracy <= PROGRESS_DOWN_ACCURACY {
        band.easier()
    } else {
        band
    }
}

fn fatigued(history: &[Response]) -> bool {
    if history.is_empty() {
        return false;
    }
    let overall = history.iter().map(|r| r.elapsed_secs).sum::<f64>() / history.len() as f64;
    if overall <= 0.0 {
        return false;
    }
    let window = recent(history);
    let recent_mean = window.iter().map(|r| r.elapsed_secs).sum::<f64>() / window.len() as f64;
    recent_mean / overall > FATIGUE_RATIO
}

fn confidence_bands<L>(
    history: &[Response],
    lookup: &L,
    ability: f64,
) -> Option<Vec<DifficultyBand>>
where
    L: ItemLookup + ?Sized,
{
    let mut overconfident = 0usize;
    let mut underconfident = 0usize;
    for response in history {
        match response.confidence {
            Some(c) if !response.correct && c >= HIGH_CONFIDENCE => overconfident += 1,
            Some(c) if response.correct && c <= LOW_CONFIDENCE => underconfident += 1,
            _ => {}
        }
    }

    let band = current_band(history, lookup, ability);
    match overconfident.cmp(&underconfident) {
        std::cmp::Ordering::Greater => Some(
            DifficultyBand::ALL
                .into_iter()
                .filter(|b| *b >= band)
                .collect(),
        ),
        std::cmp::Ordering::Less => Some(
            DifficultyBand::ALL
                .into_iter()
                .filter(|b| *b <= band)
                .collect(),
        ),
        std::cmp::Ordering::Equal => None,
    }
}
