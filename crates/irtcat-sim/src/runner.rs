//! Batch simulation runner.
//!
//! Runs many independent sessions against one repository, each with its
//! own simulated examinee, bounded by a semaphore.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use futures::stream::{FuturesUnordered, StreamExt};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use uuid::Uuid;

use irtcat_core::config::CatConfig;
use irtcat_core::session::{CatSession, SessionConfig, SessionSummary};
use irtcat_core::traits::ItemRepository;

use crate::examinee::SimulatedExaminee;
use crate::report::{compute_recovery_stats, SimulatedSession, SimulationReport};

/// Configuration for a simulation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Number of simulated examinees.
    pub examinees: usize,
    /// True abilities are drawn uniformly from this range.
    pub ability_range: (f64, f64),
    /// Maximum concurrent sessions.
    pub parallelism: usize,
    /// Base seed; examinee `i` uses `seed + i`. Random when unset.
    pub seed: Option<u64>,
    /// Multiplier on response times for every examinee.
    pub pace: f64,
    /// Per-item slowdown for every examinee.
    pub fatigue: f64,
    /// Whether examinees report confidence.
    pub report_confidence: bool,
    pub session: SessionConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            examinees: 100,
            ability_range: (-2.0, 2.0),
            parallelism: 4,
            seed: None,
            pace: 1.0,
            fatigue: 0.0,
            report_confidence: false,
            session: SessionConfig::default(),
        }
    }
}

impl SimulationConfig {
    /// Run settings from a loaded configuration file.
    pub fn from_config(config: &CatConfig) -> Self {
        Self {
            parallelism: config.parallelism,
            seed: config.seed,
            pace: config.examinee.pace,
            fatigue: config.examinee.fatigue,
            report_confidence: config.examinee.report_confidence,
            session: config.session_config(),
            ..Default::default()
        }
    }
}

/// Progress reporting trait.
pub trait ProgressReporter: Send + Sync {
    fn on_session_start(&self, examinee_id: &str, true_ability: f64);
    fn on_session_complete(&self, session: &SimulatedSession);
    fn on_session_error(&self, examinee_id: &str, error: &str);
    fn on_run_complete(&self, total: usize, completed: usize, failed: usize, elapsed: Duration);
}

/// No-op progress reporter.
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn on_session_start(&self, _: &str, _: f64) {}
    fn on_session_complete(&self, _: &SimulatedSession) {}
    fn on_session_error(&self, _: &str, _: &str) {}
    fn on_run_complete(&self, _: usize, _: usize, _: usize, _: Duration) {}
}

/// Runs simulated sessions against a repository.
pub struct Simulator {
    repository: Arc<dyn ItemRepository>,
    config: SimulationConfig,
}

impl Simulator {
    pub fn new(repository: Arc<dyn ItemRepository>, config: SimulationConfig) -> Self {
        Self { repository, config }
    }

    /// True abilities for every examinee, reproducible from the base seed.
    pub fn true_abilities(&self, seed: u64) -> Vec<f64> {
        let (low, high) = self.config.ability_range;
        let mut rng = StdRng::seed_from_u64(seed);
        (0..self.config.examinees)
            .map(|_| {
                if high > low {
                    rng.gen_range(low..high)
                } else {
                    low
                }
            })
            .collect()
    }

    /// Run every session and aggregate the results.
    pub async fn run(&self, progress: &dyn ProgressReporter) -> Result<SimulationReport> {
        anyhow::ensure!(self.config.parallelism > 0, "parallelism must be at least 1");

        let start = Instant::now();
        let run_id = Uuid::new_v4();
        let seed = self.config.seed.unwrap_or_else(rand::random);
        let semaphore = Arc::new(Semaphore::new(self.config.parallelism));

        tracing::info!(
            %run_id,
            examinees = self.config.examinees,
            repository = self.repository.name(),
            seed,
            "starting simulation"
        );

        let mut futures = FuturesUnordered::new();

        for (index, true_ability) in self.true_abilities(seed).into_iter().enumerate() {
            let examinee_id = format!("examinee-{index:04}");
            let mut examinee = SimulatedExaminee::new(
                examinee_id.clone(),
                true_ability,
                seed.wrapping_add(index as u64),
            )
            .with_pace(self.config.pace)
            .with_fatigue(self.config.fatigue);
            if self.config.report_confidence {
                examinee = examinee.with_confidence();
            }

            let repository = Arc::clone(&self.repository);
            let semaphore = Arc::clone(&semaphore);
            let session_config = self.config.session.clone();
            progress.on_session_start(&examinee_id, true_ability);

            futures.push(async move {
                let inner = async move {
                    let _permit = semaphore
                        .acquire_owned()
                        .await
                        .map_err(|_| anyhow::anyhow!("semaphore closed"))?;
                    let mut session = CatSession::new(repository, session_config);
                    let summary: SessionSummary = session.run_to_completion(&examinee).await?;
                    Ok::<_, anyhow::Error>(SimulatedSession {
                        true_ability,
                        summary,
                    })
                };
                (examinee_id, inner.await)
            });
        }

        let mut sessions = Vec::new();
        let mut failed = 0usize;
        let total = futures.len();

        while let Some((examinee_id, result)) = futures.next().await {
            match result {
                Ok(session) => {
                    progress.on_session_complete(&session);
                    sessions.push(session);
                }
                Err(e) => {
                    tracing::error!("session failed for {examinee_id}: {e:#}");
                    progress.on_session_error(&examinee_id, &e.to_string());
                    failed += 1;
                }
            }
        }

        // Completion order is nondeterministic.
        sessions.sort_by(|a, b| a.summary.examinee_id.cmp(&b.summary.examinee_id));

        let elapsed = start.elapsed();
        progress.on_run_complete(total, sessions.len(), failed, elapsed);
        tracing::info!(%run_id, completed = sessions.len(), failed, "simulation finished");

        let stats = compute_recovery_stats(&sessions);
        Ok(SimulationReport {
            id: run_id,
            created_at: chrono::Utc::now(),
            repository: self.repository.name().to_string(),
            strategy: self.config.session.strategy.kind(),
            seed,
            config: self.config.clone(),
            sessions,
            failed,
            stats,
            duration_ms: elapsed.as_millis() as u64,
        })
    }
}
