//! Request/response surface for stateless callers.
//!
//! Each request carries the item bank slice and the response history, so
//! the handlers are pure functions and can sit behind any transport. The
//! CLI reads these as JSON.

use serde::{Deserialize, Serialize};

use crate::estimation::estimate;
use crate::metrics::{build_metrics, AdaptiveMetrics};
use crate::model::{Item, Response, SelectionConstraints};
use crate::stopping::{StopReason, StoppingRule};
use crate::strategy::{select_with_strategy, SelectionStrategy};

/// Ask for the next item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NextItemRequest {
    /// Candidate items. Also used to resolve the history.
    #[serde(default)]
    pub items: Vec<Item>,
    #[serde(default)]
    pub history: Vec<Response>,
    /// Ability to select at; estimated from the history when absent.
    #[serde(default)]
    pub ability: Option<f64>,
    #[serde(default)]
    pub constraints: Option<SelectionConstraints>,
    #[serde(default)]
    pub strategy: SelectionStrategy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum NextItemResponse {
    Item {
        item: Item,
        ability: f64,
        information: f64,
        score: f64,
    },
    NoItemAvailable,
}

pub fn next_item(request: &NextItemRequest) -> NextItemResponse {
    let ability = request
        .ability
        .unwrap_or_else(|| estimate(&request.history, &request.items).ability);
    match select_with_strategy(
        &request.strategy,
        &request.items,
        ability,
        &request.history,
        &request.items,
        request.constraints.as_ref(),
    ) {
        Some(selection) => NextItemResponse::Item {
            item: selection.item.clone(),
            ability,
            information: selection.information,
            score: selection.score,
        },
        None => NextItemResponse::NoItemAvailable,
    }
}

/// Ask for the current estimate and the stopping decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimateRequest {
    #[serde(default)]
    pub items: Vec<Item>,
    #[serde(default)]
    pub history: Vec<Response>,
    #[serde(default)]
    pub stopping: StoppingRule,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EstimateResponse {
    pub ability: f64,
    pub standard_error: f64,
    /// Number of responses the estimate is based on.
    pub sequence: usize,
    #[serde(rename = "continue")]
    pub should_continue: bool,
    pub reason: StopReason,
}

pub fn estimate_session(request: &EstimateRequest) -> EstimateResponse {
    let current = estimate(&request.history, &request.items);
    let reason = request
        .stopping
        .decide(&request.history, &request.items, current.ability);
    EstimateResponse {
        ability: current.ability,
        standard_error: current.standard_error,
        sequence: current.sequence,
        should_continue: reason.should_continue(),
        reason,
    }
}

/// Ask for session diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsRequest {
    #[serde(default)]
    pub items: Vec<Item>,
    #[serde(default)]
    pub history: Vec<Response>,
    /// Final ability; estimated from the history when absent.
    #[serde(default)]
    pub final_ability: Option<f64>,
    #[serde(default)]
    pub strategy: SelectionStrategy,
}

pub fn session_metrics(request: &MetricsRequest) -> AdaptiveMetrics {
    let final_ability = request
        .final_ability
        .unwrap_or_else(|| estimate(&request.history, &request.items).ability);
    build_metrics(
        &request.history,
        &request.items,
        final_ability,
        request.strategy.kind(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DifficultyBand;

    fn items() -> Vec<Item> {
        DifficultyBand::ALL
            .iter()
            .enumerate()
            .map(|(i, &band)| Item::builder(format!("q{i}"), band).build().unwrap())
            .collect()
    }

    #[test]
    fn next_item_request_from_json() {
        let json = r#"{
            "items": [
                {"id": "q0", "band": "beginner"},
                {"id": "q1", "band": "expert", "guessing": 0.0}
            ],
            "history": [{"item_id": "q0", "correct": true}],
            "strategy": {"kind": "standard"}
        }"#;
        let request: NextItemRequest = serde_json::from_str(json).unwrap();
        match next_item(&request) {
            NextItemResponse::Item { item, ability, .. } => {
                assert_eq!(item.id(), "q1");
                assert!(ability > 0.0);
            }
            NextItemResponse::NoItemAvailable => panic!("expected an item"),
        }
    }

    #[test]
    fn exhausted_bank_reports_no_item() {
        let request = NextItemRequest {
            items: items(),
            history: (0..4).map(|i| Response::new(format!("q{i}"), true)).collect(),
            ability: Some(0.0),
            constraints: None,
            strategy: SelectionStrategy::Standard,
        };
        let response = next_item(&request);
        assert_eq!(response, NextItemResponse::NoItemAvailable);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "no_item_available");
    }

    #[test]
    fn estimate_response_uses_continue_key() {
        let request = EstimateRequest {
            items: items(),
            history: (0..10)
                .map(|i| Response::new(format!("q{}", i % 4), i % 2 == 0))
                .collect(),
            stopping: StoppingRule::new(10, 0.3),
        };
        let response = estimate_session(&request);
        assert!(!response.should_continue);
        assert_eq!(response.reason, StopReason::MaxQuestions);
        assert_eq!(response.sequence, 10);

        let json = serde_json::to_value(response).unwrap();
        assert_eq!(json["continue"], false);
        assert_eq!(json["reason"], "max_questions");
    }

    #[test]
    fn empty_estimate_request_continues() {
        let request: EstimateRequest = serde_json::from_str(r#"{"items": []}"#).unwrap();
        let response = estimate_session(&request);
        assert_eq!(response.ability, 0.0);
        assert_eq!(response.standard_error, 1.0);
        assert!(response.should_continue);
    }

    #[test]
    fn estimate_request_accepts_partial_stopping() {
        let request: EstimateRequest = serde_json::from_str(
            r#"{"items": [], "history": [], "stopping": {"max_questions": 10}}"#,
        )
        .unwrap();
        assert_eq!(request.stopping, StoppingRule::new(10, 0.3));
    }

    #[test]
    fn metrics_request_estimates_final_ability() {
        let history: Vec<Response> = (0..6)
            .map(|i| Response::new(format!("q{}", i % 4), i < 3))
            .collect();
        let request = MetricsRequest {
            items: items(),
            history: history.clone(),
            final_ability: None,
            strategy: SelectionStrategy::Progressive,
        };
        let metrics = session_metrics(&request);
        assert_eq!(metrics.total_questions, 6);
        assert_eq!(
            metrics.final_ability,
            estimate(&history, &request.items).ability
        );
        assert_eq!(metrics.algorithm, crate::strategy::StrategyKind::Progressive);
    }
}
