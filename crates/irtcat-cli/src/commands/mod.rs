pub mod estimate;
pub mod init;
pub mod metrics;
pub mod next_item;
pub mod simulate;
pub mod validate;

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;

use irtcat_core::bank::load_bank;
use irtcat_core::{DifficultyBand, Item, SelectionStrategy};

/// Read a JSON request from a file, or from stdin when the path is `-`.
pub fn read_request<T: DeserializeOwned>(input: &Path) -> Result<T> {
    let content = if input == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read request from stdin")?;
        buf
    } else {
        std::fs::read_to_string(input)
            .with_context(|| format!("failed to read request: {}", input.display()))?
    };
    serde_json::from_str(&content).context("failed to parse request JSON")
}

/// Replace a request's items with the bank at `bank`, if one was given.
pub fn fill_items(bank: Option<PathBuf>, items: &mut Vec<Item>) -> Result<()> {
    let Some(path) = bank else {
        return Ok(());
    };
    let bank = load_bank(&path)?;
    if !items.is_empty() {
        tracing::warn!(
            bank = %bank.name,
            replaced = items.len(),
            "request items replaced by bank"
        );
    }
    *items = bank.items().to_vec();
    Ok(())
}

pub fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to serialize response")?;
    println!("{json}");
    Ok(())
}

/// Strategy flags shared by commands that drive sessions.
pub struct StrategyArgs {
    pub name: Option<String>,
    pub target_bands: Option<String>,
    pub subjects: Option<String>,
}

impl StrategyArgs {
    /// Build the strategy, falling back to `configured` when no name was given.
    pub fn build(&self, configured: &SelectionStrategy) -> Result<SelectionStrategy> {
        let Some(name) = &self.name else {
            anyhow::ensure!(
                self.target_bands.is_none() && self.subjects.is_none(),
                "--target-bands and --subjects require --strategy"
            );
            return Ok(configured.clone());
        };

        let strategy = match name.trim().replace('-', "_").as_str() {
            "standard" => SelectionStrategy::Standard,
            "mission_aligned" => {
                let target_bands = split_list(self.target_bands.as_deref())
                    .map(|s| s.parse::<DifficultyBand>().map_err(anyhow::Error::msg))
                    .collect::<Result<Vec<_>>>()?;
                anyhow::ensure!(
                    !target_bands.is_empty(),
                    "mission_aligned requires --target-bands"
                );
                SelectionStrategy::MissionAligned { target_bands }
            }
            "goal_aligned" => {
                let subjects: Vec<String> = split_list(self.subjects.as_deref())
                    .map(str::to_string)
                    .collect();
                anyhow::ensure!(!subjects.is_empty(), "goal_aligned requires --subjects");
                SelectionStrategy::GoalAligned { subjects }
            }
            "progressive" => SelectionStrategy::Progressive,
            "fatigue_aware" => SelectionStrategy::FatigueAware,
            "confidence_aware" => SelectionStrategy::ConfidenceAware,
            other => anyhow::bail!("unknown strategy: '{other}'"),
        };
        Ok(strategy)
    }
}

fn split_list(list: Option<&str>) -> impl Iterator<Item = &str> {
    list.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
}
