//! Collaborator traits for the session layer.
//!
//! The engine itself is synchronous and pure; these async traits describe
//! the question repository and the answer source a session controller
//! talks to. [`MemoryRepository`] serves a loaded item bank, and
//! `irtcat-sim` implements [`Examinee`] for simulated test-takers.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::bank::ItemBank;
use crate::model::{DifficultyBand, Item};

// ---------------------------------------------------------------------------
// Question repository
// ---------------------------------------------------------------------------

/// Source of candidate items. The engine never writes to it.
#[async_trait]
pub trait ItemRepository: Send + Sync {
    /// Human-readable repository name.
    fn name(&self) -> &str;

    /// Items matching the query, in a stable order.
    async fn fetch_items(&self, query: &ItemQuery) -> anyhow::Result<Vec<Item>>;
}

/// Filter for [`ItemRepository::fetch_items`]. Empty lists match everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemQuery {
    #[serde(default)]
    pub subjects: Vec<String>,
    #[serde(default)]
    pub bands: Vec<DifficultyBand>,
    /// Ids to leave out, typically the items already administered.
    #[serde(default)]
    pub exclude_ids: Vec<String>,
}

impl ItemQuery {
    /// Whether an item satisfies the query.
    pub fn matches(&self, item: &Item) -> bool {
        (self.subjects.is_empty() || self.subjects.iter().any(|s| s == item.subject()))
            && (self.bands.is_empty() || self.bands.contains(&item.band()))
            && !self.exclude_ids.iter().any(|id| id == item.id())
    }
}

/// In-memory repository over a loaded [`ItemBank`].
#[derive(Debug, Clone)]
pub struct MemoryRepository {
    bank: Arc<ItemBank>,
}

impl MemoryRepository {
    pub fn new(bank: ItemBank) -> Self {
        Self {
            bank: Arc::new(bank),
        }
    }

    pub fn from_shared(bank: Arc<ItemBank>) -> Self {
        Self { bank }
    }

    pub fn bank(&self) -> &ItemBank {
        &self.bank
    }
}

#[async_trait]
impl ItemRepository for MemoryRepository {
    fn name(&self) -> &str {
        &self.bank.name
    }

    async fn fetch_items(&self, query: &ItemQuery) -> anyhow::Result<Vec<Item>> {
        Ok(self
            .bank
            .items()
            .iter()
            .filter(|item| query.matches(item))
            .cloned()
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Answer source
// ---------------------------------------------------------------------------

/// A test-taker answering the items a session presents.
#[async_trait]
pub trait Examinee: Send + Sync {
    /// Identifier used in logs and reports.
    fn id(&self) -> &str;

    /// Answer one item.
    async fn answer(&self, item: &Item) -> anyhow::Result<Answer>;
}

/// The learner's answer to one item.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub correct: bool,
    pub elapsed_secs: f64,
    #[serde(default)]
    pub confidence: Option<f64>,
}

impl Answer {
    pub fn new(correct: bool, elapsed_secs: f64) -> Self {
        Self {
            correct,
            elapsed_secs,
            confidence: None,
        }
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }
}
