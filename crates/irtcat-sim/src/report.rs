//! Simulation report types with JSON persistence and recovery statistics.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use irtcat_core::session::SessionSummary;
use irtcat_core::strategy::StrategyKind;

use crate::runner::SimulationConfig;

/// One simulated session together with the ability it should recover.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatedSession {
    pub true_ability: f64,
    pub summary: SessionSummary,
}

impl SimulatedSession {
    /// Estimated minus true ability.
    pub fn error(&self) -> f64 {
        self.summary.estimate.ability - self.true_ability
    }
}

/// How well a batch of sessions recovered the true abilities.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecoveryStats {
    pub sessions: usize,
    /// Mean of estimated minus true ability.
    pub bias: f64,
    /// Root mean squared estimation error.
    pub rmse: f64,
    pub mean_absolute_error: f64,
    /// Pearson correlation between true and estimated abilities.
    pub correlation: f64,
    pub mean_length: f64,
    pub mean_standard_error: f64,
    pub mean_accuracy: f64,
    /// Sessions per end condition.
    pub end_counts: BTreeMap<String, usize>,
}

/// Compute recovery statistics over completed sessions.
pub fn compute_recovery_stats(sessions: &[SimulatedSession]) -> RecoveryStats {
    if sessions.is_empty() {
        return RecoveryStats::default();
    }
    let bias = mean_of(sessions, |s| s.error());
    let rmse = mean_of(sessions, |s| s.error().powi(2)).sqrt();
    let mean_absolute_error = mean_of(sessions, |s| s.error().abs());
    let mean_length = mean_of(sessions, |s| s.summary.responses.len() as f64);
    let mean_standard_error = mean_of(sessions, |s| s.summary.estimate.standard_error);
    let mean_accuracy = mean_of(sessions, |s| s.summary.metrics.accuracy);

    let mut end_counts: BTreeMap<String, usize> = BTreeMap::new();
    for session in sessions {
        *end_counts.entry(session.summary.end.to_string()).or_default() += 1;
    }

    let truth: Vec<f64> = sessions.iter().map(|s| s.true_ability).collect();
    let estimates: Vec<f64> = sessions.iter().map(|s| s.summary.estimate.ability).collect();

    RecoveryStats {
        sessions: sessions.len(),
        bias,
        rmse,
        mean_absolute_error,
        correlation: pearson(&truth, &estimates),
        mean_length,
        mean_standard_error,
        mean_accuracy,
        end_counts,
    }
}

fn mean_of<F>(sessions: &[SimulatedSession], f: F) -> f64
where
    F: Fn(&SimulatedSession) -> f64,
{
    sessions.iter().map(f).sum::<f64>() / sessions.len() as f64
}

/// Pearson correlation, or 0 when either side has no variance.
fn pearson(xs: &[f64], ys: &[f64]) -> f64 {
    let n = xs.len() as f64;
    if xs.len() < 2 {
        return 0.0;
    }
    let mx = xs.iter().sum::<f64>() / n;
    let my = ys.iter().sum::<f64>() / n;
    let mut cov = 0.0;
    let mut vx = 0.0;
    let mut vy = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        cov += (x - mx) * (y - my);
        vx += (x - mx).powi(2);
        vy += (y - my).powi(2);
    }
    if vx <= 0.0 || vy <= 0.0 {
        return 0.0;
    }
    cov / (vx.sqrt() * vy.sqrt())
}

/// A complete simulation report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    /// Name of the item repository.
    pub repository: String,
    pub strategy: StrategyKind,
    /// Base seed the examinees were drawn from.
    pub seed: u64,
    pub config: SimulationConfig,
    pub sessions: Vec<SimulatedSession>,
    /// Sessions that failed with an error.
    pub failed: usize,
    pub stats: RecoveryStats,
    /// Total wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

impl SimulationReport {
    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: SimulationReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }
}
