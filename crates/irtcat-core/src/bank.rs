//! TOML item bank parser.
//!
//! Loads item banks from TOML files and directories, and validates them.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::model::{DifficultyBand, Item, ItemLookup};

/// Guessing parameters above this are flagged by [`validate_bank`].
const HIGH_GUESSING: f64 = 0.5;

/// Discrimination parameters above this are flagged by [`validate_bank`].
const HIGH_DISCRIMINATION: f64 = 4.0;

/// A named collection of items.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "BankFile", into = "BankFile")]
pub struct ItemBank {
    pub id: String,
    pub name: String,
    pub description: String,
    items: Vec<Item>,
    index: HashMap<String, usize>,
}

impl ItemBank {
    pub fn new(id: impl Into<String>, name: impl Into<String>, items: Vec<Item>) -> Self {
        let mut index = HashMap::with_capacity(items.len());
        for (pos, item) in items.iter().enumerate() {
            // First occurrence wins; duplicates are reported by validation.
            index.entry(item.id().to_string()).or_insert(pos);
        }
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            items,
            index,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Items in file order.
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Distinct subjects, in order of first appearance.
    pub fn subjects(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.items
            .iter()
            .map(Item::subject)
            .filter(|s| seen.insert(*s))
            .collect()
    }

    /// Item count per difficulty band.
    pub fn band_counts(&self) -> [(DifficultyBand, usize); 4] {
        DifficultyBand::ALL.map(|band| {
            let count = self.items.iter().filter(|i| i.band() == band).count();
            (band, count)
        })
    }

    /// Merge several banks into one, keeping item order.
    pub fn merge(id: impl Into<String>, name: impl Into<String>, banks: Vec<ItemBank>) -> Self {
        let items = banks.into_iter().flat_map(|b| b.items).collect();
        Self::new(id, name, items)
    }
}

impl ItemLookup for ItemBank {
    fn item(&self, id: &str) -> Option<&Item> {
        self.index.get(id).map(|&pos| &self.items[pos])
    }
}

/// On-disk layout of a bank file.
#[derive(Debug, Serialize, Deserialize)]
struct BankFile {
    bank: BankHeader,
    #[serde(default)]
    items: Vec<Item>,
}

#[derive(Debug, Serialize, Deserialize)]
struct BankHeader {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
}

impl From<BankFile> for ItemBank {
    fn from(file: BankFile) -> Self {
        ItemBank::new(file.bank.id, file.bank.name, file.items)
            .with_description(file.bank.description)
    }
}

impl From<ItemBank> for BankFile {
    fn from(bank: ItemBank) -> Self {
        BankFile {
            bank: BankHeader {
                id: bank.id,
                name: bank.name,
                description: bank.description,
            },
            items: bank.items,
        }
    }
}

/// Parse a single TOML file into an `ItemBank`.
pub fn parse_bank(path: &Path) -> Result<ItemBank> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read item bank file: {}", path.display()))?;

    parse_bank_str(&content, path)
}

/// Parse a TOML string into an `ItemBank`.
pub fn parse_bank_str(content: &str, source_path: &Path) -> Result<ItemBank> {
    let bank: ItemBank = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;
    Ok(bank)
}

/// Serialize a bank back to TOML.
pub fn bank_to_toml(bank: &ItemBank) -> Result<String> {
    toml::to_string_pretty(bank).context("failed to serialize item bank")
}

/// Recursively load all `.toml` item bank files from a directory.
pub fn load_bank_directory(dir: &Path) -> Result<Vec<ItemBank>> {
    let mut banks = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut paths = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    paths.sort();

    for path in paths {
        if path.is_dir() {
            banks.extend(load_bank_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_bank(&path) {
                Ok(bank) => banks.push(bank),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    Ok(banks)
}

/// Load a bank from a file, or merge every bank found under a directory.
pub fn load_bank(path: &Path) -> Result<ItemBank> {
    if path.is_dir() {
        let banks = load_bank_directory(path)?;
        anyhow::ensure!(
            !banks.is_empty(),
            "no item banks found in {}",
            path.display()
        );
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "bank".to_string());
        Ok(ItemBank::merge(name.clone(), name, banks))
    } else {
        parse_bank(path)
    }
}

/// A warning from item bank validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The item ID (if applicable).
    pub item_id: Option<String>,
    /// Warning message.
    pub message: String,
}

/// Validate an item bank for common issues.
pub fn validate_bank(bank: &ItemBank) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if bank.is_empty() {
        warnings.push(ValidationWarning {
            item_id: None,
            message: "bank contains no items".into(),
        });
    }

    let mut seen_ids = HashSet::new();
    for item in bank.items() {
        if !seen_ids.insert(item.id()) {
            warnings.push(ValidationWarning {
                item_id: Some(item.id().to_string()),
                message: format!("duplicate item ID: {}", item.id()),
            });
        }
    }

    for item in bank.items() {
        let id = Some(item.id().to_string());
        if item.subject().trim().is_empty() {
            warnings.push(ValidationWarning {
                item_id: id.clone(),
                message: "subject is empty; subject balancing will ignore it".into(),
            });
        }
        if item.topic().trim().is_empty() {
            warnings.push(ValidationWarning {
                item_id: id.clone(),
                message: "topic is empty".into(),
            });
        }
        let params = item.params();
        if params.guessing() > HIGH_GUESSING {
            warnings.push(ValidationWarning {
                item_id: id.clone(),
                message: format!("guessing {} is unusually high", params.guessing()),
            });
        }
        if params.discrimination() > HIGH_DISCRIMINATION {
            warnings.push(ValidationWarning {
                item_id: id.clone(),
                message: format!(
                    "discrimination {} is unusually high",
                    params.discrimination()
                ),
            });
        }
        if params.difficulty().abs() > crate::estimation::ABILITY_BOUND {
            warnings.push(ValidationWarning {
                item_id: id,
                message: format!(
                    "difficulty {} lies outside the estimable ability range",
                    params.difficulty()
                ),
            });
        }
    }

    for (band, count) in bank.band_counts() {
        if count == 0 && !bank.is_empty() {
            warnings.push(ValidationWarning {
                item_id: None,
                message: format!("no items in the {band} band"),
            });
        }
    }

    warnings
}
