//! Maximum-information item selection.
//!
//! Candidates are filtered by the hard constraints, scored by their
//! information at the current ability, re-weighted toward under-represented
//! subjects, and the best one is returned. Ties go to the candidate listed
//! first.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::irt::information_unchecked;
use crate::model::{Item, ItemLookup, Response, SelectionConstraints};

/// Number of most recent responses checked for `avoid_recent_topics`.
pub const RECENT_TOPIC_WINDOW: usize = 3;

/// Weight for a subject below its target share.
pub const UNDER_REPRESENTED_WEIGHT: f64 = 1.5;

/// Weight for a subject at or above its target share.
pub const OVER_REPRESENTED_WEIGHT: f64 = 0.8;

/// The item chosen by [`select_next`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Selection<'a> {
    pub item: &'a Item,
    /// Information of the item at the selection ability. Recorded on the
    /// response as the information gained.
    pub information: f64,
    /// Information after subject weighting; the ranking key.
    pub score: f64,
}

/// Select the most informative admissible item.
///
/// Items already answered in `history` are never offered again, with or
/// without constraints.
///
/// Returns `None` when no candidate survives filtering. A non-finite
/// `ability` is treated as `0.0`.
pub fn select_next<'a, L>(
    candidates: &'a [Item],
    ability: f64,
    history: &[Response],
    lookup: &L,
    constraints: Option<&SelectionConstraints>,
) -> Option<Selection<'a>>
where
    L: ItemLookup + ?Sized,
{
    let default_constraints = SelectionConstraints::default();
    let constraints = constraints.unwrap_or(&default_constraints);
    select_among(candidates, ability, history, lookup, constraints)
}

/// [`select_next`] over any ordered sequence of candidates.
pub(crate) fn select_among<'a, I, L>(
    candidates: I,
    ability: f64,
    history: &[Response],
    lookup: &L,
    constraints: &SelectionConstraints,
) -> Option<Selection<'a>>
where
    I: IntoIterator<Item = &'a Item>,
    L: ItemLookup + ?Sized,
{
    let ability = if ability.is_finite() { ability } else { 0.0 };

    let administered: HashSet<&str> = history.iter().map(|r| r.item_id.as_str()).collect();
    let recent_topics = recent_topics(history, lookup, &constraints.avoid_recent_topics);
    let subject_shares = constraints
        .subject_distribution
        .as_ref()
        .map(|_| subject_shares(history, lookup));

    let mut considered = 0usize;
    let mut best: Option<Selection<'a>> = None;
    for item in candidates {
        considered += 1;
        if administered.contains(item.id()) {
            continue;
        }
        if recent_topics.contains(item.topic()) {
            continue;
        }
        if let Some(bands) = &constraints.difficulty_bands {
            if !bands.contains(&item.band()) {
                continue;
            }
        }

        let information = information_unchecked(ability, item.params());
        let weight = match (&constraints.subject_distribution, &subject_shares) {
            (Some(targets), Some(shares)) => {
                let target = targets.get(item.subject()).copied().unwrap_or(0.0);
                let current = shares.get(item.subject()).copied().unwrap_or(0.0);
                if current < target {
                    UNDER_REPRESENTED_WEIGHT
                } else {
                    OVER_REPRESENTED_WEIGHT
                }
            }
            _ => 1.0,
        };
        let score = information * weight;

        if best.map_or(true, |b| score > b.score) {
            best = Some(Selection {
                item,
                information,
                score,
            });
        }
    }

    if best.is_none() {
        tracing::debug!(considered, "no candidate survived selection constraints");
    }
    best
}

/// Topics from `avoid` that were answered within the recent window.
fn recent_topics<'h, L>(
    history: &'h [Response],
    lookup: &'h L,
    avoid: &[String],
) -> HashSet<&'h str>
where
    L: ItemLookup + ?Sized,
{
    if avoid.is_empty() {
        return HashSet::new();
    }
    let start = history.len().saturating_sub(RECENT_TOPIC_WINDOW);
    history[start..]
        .iter()
        .filter_map(|r| lookup.item(&r.item_id))
        .map(Item::topic)
        .filter(|topic| avoid.iter().any(|a| a.as_str() == *topic))
        .collect()
}

/// Share of the history each subject accounts for.
///
/// Responses to unknown items count toward the total but no subject.
fn subject_shares<'h, L>(history: &'h [Response], lookup: &'h L) -> HashMap<&'h str, f64>
where
    L: ItemLookup + ?Sized,
{
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for item in history.iter().filter_map(|r| lookup.item(&r.item_id)) {
        *counts.entry(item.subject()).or_default() += 1;
    }
    let total = history.len().max(1) as f64;
    counts
        .into_iter()
        .map(|(subject, count)| (subject, count as f64 / total))
        .collect()
}
