//! Configuration loading.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::session::SessionConfig;
use crate::stopping::{StoppingRule, DEFAULT_MAX_QUESTIONS, DEFAULT_TARGET_SE};
use crate::strategy::SelectionStrategy;

/// Top-level irtcat configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatConfig {
    /// Hard cap on session length.
    #[serde(default = "default_max_questions")]
    pub max_questions: usize,
    /// Standard error at which a session stops.
    #[serde(default = "default_target_se")]
    pub target_se: f64,
    /// Item selection strategy.
    #[serde(default)]
    pub strategy: SelectionStrategy,
    /// Max concurrent simulated sessions.
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
    /// Seed for simulated examinees; random when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Output directory for reports.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Behaviour of simulated examinees.
    #[serde(default)]
    pub examinee: ExamineeProfile,
}

/// How simulated examinees pace themselves and report confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExamineeProfile {
    /// Multiplier on every item's expected response time.
    pub pace: f64,
    /// Extra pace added per item already answered.
    pub fatigue: f64,
    /// Report a confidence with every answer.
    pub report_confidence: bool,
}

impl Default for ExamineeProfile {
    fn default() -> Self {
        Self {
            pace: 1.0,
            fatigue: 0.0,
            report_confidence: false,
        }
    }
}

fn default_max_questions() -> usize {
    DEFAULT_MAX_QUESTIONS
}
fn default_target_se() -> f64 {
    DEFAULT_TARGET_SE
}
fn default_parallelism() -> usize {
    4
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./irtcat-results")
}

impl Default for CatConfig {
    fn default() -> Self {
        Self {
            max_questions: default_max_questions(),
            target_se: default_target_se(),
            strategy: SelectionStrategy::default(),
            parallelism: default_parallelism(),
            seed: None,
            output_dir: default_output_dir(),
            examinee: ExamineeProfile::default(),
        }
    }
}

impl CatConfig {
    pub fn stopping_rule(&self) -> StoppingRule {
        StoppingRule::new(self.max_questions, self.target_se)
    }

    /// Session settings derived from this configuration.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            stopping: self.stopping_rule(),
            strategy: self.strategy.clone(),
            ..Default::default()
        }
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("failed to serialize config")
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `irtcat.toml` in the current directory
/// 2. `~/.config/irtcat/config.toml`
///
/// Environment variable overrides: `IRTCAT_MAX_QUESTIONS`, `IRTCAT_TARGET_SE`,
/// `IRTCAT_SEED`.
pub fn load_config() -> Result<CatConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<CatConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("irtcat.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<CatConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => CatConfig::default(),
    };

    apply_overrides(&mut config, |name| std::env::var(name).ok())?;
    validate_config(&config)?;
    Ok(config)
}

/// Apply `IRTCAT_*` overrides read through `var`.
fn apply_overrides<F>(config: &mut CatConfig, var: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = var("IRTCAT_MAX_QUESTIONS") {
        config.max_questions = value
            .trim()
            .parse()
            .with_context(|| format!("invalid IRTCAT_MAX_QUESTIONS: {value}"))?;
    }
    if let Some(value) = var("IRTCAT_TARGET_SE") {
        config.target_se = value
            .trim()
            .parse()
            .with_context(|| format!("invalid IRTCAT_TARGET_SE: {value}"))?;
    }
    if let Some(value) = var("IRTCAT_SEED") {
        config.seed = Some(
            value
                .trim()
                .parse()
                .with_context(|| format!("invalid IRTCAT_SEED: {value}"))?,
        );
    }
    Ok(())
}

fn validate_config(config: &CatConfig) -> Result<()> {
    anyhow::ensure!(
        config.max_questions > 0,
        "max_questions must be at least 1"
    );
    anyhow::ensure!(
        config.target_se.is_finite() && config.target_se > 0.0,
        "target_se must be positive, got {}",
        config.target_se
    );
    anyhow::ensure!(config.parallelism > 0, "parallelism must be at least 1");
    let examinee = &config.examinee;
    anyhow::ensure!(
        examinee.pace.is_finite() && examinee.pace > 0.0,
        "examinee pace must be positive, got {}",
        examinee.pace
    );
    anyhow::ensure!(
        examinee.fatigue.is_finite() && examinee.fatigue >= 0.0,
        "examinee fatigue must be non-negative, got {}",
        examinee.fatigue
    );
    Ok(())
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("irtcat"))
}
