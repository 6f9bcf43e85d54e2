//! Session controller.
//!
//! Drives one adaptive-testing session against an [`ItemRepository`]:
//! select an item, record the answer, re-estimate, and check the stopping
//! rule. Only the administered items are retained; candidates are fetched
//! from the repository for every selection.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CatError, CatResult};
use crate::estimation::estimate;
use crate::metrics::{build_metrics, AdaptiveMetrics};
use crate::model::{AbilityEstimate, Item, Response, SelectionConstraints};
use crate::stopping::{StopReason, StoppingRule};
use crate::strategy::{select_with_strategy, SelectionStrategy};
use crate::traits::{Answer, Examinee, ItemQuery, ItemRepository};

/// Per-session settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub stopping: StoppingRule,
    #[serde(default)]
    pub strategy: SelectionStrategy,
    #[serde(default)]
    pub constraints: SelectionConstraints,
    /// Filter applied when fetching candidates.
    #[serde(default)]
    pub query: ItemQuery,
}

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SessionEnd {
    /// The stopping rule ended the session.
    Stopped { reason: StopReason },
    /// No admissible item remained before the stopping rule fired.
    ItemsExhausted,
}

impl fmt::Display for SessionEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionEnd::Stopped { reason } => write!(f, "{reason}"),
            SessionEnd::ItemsExhausted => write!(f, "items_exhausted"),
        }
    }
}

/// Result of recording one answer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Step {
    pub estimate: AbilityEstimate,
    pub reason: StopReason,
}

/// Final state of a completed session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: Uuid,
    pub examinee_id: String,
    pub estimate: AbilityEstimate,
    pub end: SessionEnd,
    pub responses: Vec<Response>,
    pub metrics: AdaptiveMetrics,
}

#[derive(Debug, Clone)]
struct PendingItem {
    item: Item,
    ability: f64,
    information: f64,
}

/// One adaptive-testing session.
pub struct CatSession {
    id: Uuid,
    repository: Arc<dyn ItemRepository>,
    config: SessionConfig,
    administered: HashMap<String, Item>,
    responses: Vec<Response>,
    estimate: AbilityEstimate,
    pending: Option<PendingItem>,
    end: Option<SessionEnd>,
}

impl CatSession {
    pub fn new(repository: Arc<dyn ItemRepository>, config: SessionConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            repository,
            config,
            administered: HashMap::new(),
            responses: Vec::new(),
            estimate: AbilityEstimate::initial(),
            pending: None,
            end: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn responses(&self) -> &[Response] {
        &self.responses
    }

    /// Current ability estimate.
    pub fn estimate(&self) -> AbilityEstimate {
        self.estimate
    }

    /// How the session ended, if it has.
    pub fn end(&self) -> Option<SessionEnd> {
        self.end
    }

    /// Stopping rule verdict for the current history.
    pub fn stop_reason(&self) -> StopReason {
        self.config
            .stopping
            .decide(&self.responses, &self.administered, self.estimate.ability)
    }

    /// Whether another item should be presented.
    pub fn should_continue(&self) -> bool {
        self.end.is_none() && self.stop_reason().should_continue()
    }

    /// The next item to present, or `None` once the session has ended.
    ///
    /// Calling this again before the answer is recorded returns the same
    /// pending item.
    pub async fn next_item(&mut self) -> Result<Option<Item>> {
        if self.end.is_some() {
            return Ok(None);
        }
        if let Some(pending) = &self.pending {
            return Ok(Some(pending.item.clone()));
        }

        let mut query = self.config.query.clone();
        query
            .exclude_ids
            .extend(self.responses.iter().map(|r| r.item_id.clone()));
        let candidates = self
            .repository
            .fetch_items(&query)
            .await
            .with_context(|| format!("failed to fetch items from {}", self.repository.name()))?;

        let ability = self.estimate.ability;
        let chosen = select_with_strategy(
            &self.config.strategy,
            &candidates,
            ability,
            &self.responses,
            &self.administered,
            Some(&self.config.constraints),
        )
        .map(|s| (s.item.clone(), s.information));

        match chosen {
            Some((item, information)) => {
                tracing::debug!(session = %self.id, item = item.id(), information, "selected item");
                self.pending = Some(PendingItem {
                    item: item.clone(),
                    ability,
                    information,
                });
                Ok(Some(item))
            }
            None => {
                tracing::info!(
                    session = %self.id,
                    answered = self.responses.len(),
                    "no admissible items left"
                );
                self.end = Some(SessionEnd::ItemsExhausted);
                Ok(None)
            }
        }
    }

    /// Record the answer to the pending item and re-estimate.
    pub fn record_answer(&mut self, item_id: &str, answer: Answer) -> CatResult<Step> {
        let Some(pending) = self.pending.take() else {
            return Err(CatError::NoPendingItem);
        };
        if pending.item.id() != item_id {
            let expected = pending.item.id().to_string();
            self.pending = Some(pending);
            return Err(CatError::UnexpectedItem {
                expected,
                got: item_id.to_string(),
            });
        }
        if let Some(confidence) = answer.confidence {
            if !(0.0..=1.0).contains(&confidence) {
                self.pending = Some(pending);
                return Err(CatError::InvalidConfidence(confidence));
            }
        }
        if !(answer.elapsed_secs.is_finite() && answer.elapsed_secs >= 0.0) {
            self.pending = Some(pending);
            return Err(CatError::invalid(
                "elapsed_secs",
                answer.elapsed_secs,
                "must be finite and >= 0",
            ));
        }

        let mut response = Response::new(item_id, answer.correct)
            .with_elapsed(answer.elapsed_secs)
            .with_selection(pending.ability, pending.information);
        response.confidence = answer.confidence;

        self.administered
            .insert(pending.item.id().to_string(), pending.item);
        self.responses.push(response);
        self.estimate = estimate(&self.responses, &self.administered);

        let reason = self.stop_reason();
        if !reason.should_continue() {
            tracing::info!(
                session = %self.id,
                answered = self.responses.len(),
                ability = self.estimate.ability,
                standard_error = self.estimate.standard_error,
                ?reason,
                "session stopped"
            );
            self.end = Some(SessionEnd::Stopped { reason });
        }

        Ok(Step {
            estimate: self.estimate,
            reason,
        })
    }

    /// Diagnostics for the responses recorded so far.
    pub fn metrics(&self) -> AdaptiveMetrics {
        build_metrics(
            &self.responses,
            &self.administered,
            self.estimate.ability,
            self.config.strategy.kind(),
        )
    }

    /// Present items to an examinee until the session ends.
    pub async fn run_to_completion(&mut self, examinee: &dyn Examinee) -> Result<SessionSummary> {
        while let Some(item) = self.next_item().await? {
            let answer = examinee
                .answer(&item)
                .await
                .with_context(|| format!("examinee {} failed on {}", examinee.id(), item.id()))?;
            self.record_answer(item.id(), answer)?;
        }

        let end = self.end.unwrap_or(SessionEnd::Stopped {
            reason: self.stop_reason(),
        });
        Ok(SessionSummary {
            session_id: self.id,
            examinee_id: examinee.id().to_string(),
            estimate: self.estimate,
            end,
            responses: self.responses.clone(),
            metrics: self.metrics(),
        })
    }
}
