//! Core data model types for irtcat.
//!
//! Items are validated once, at construction or deserialization, and are
//! read-only afterwards. Responses are append-only records of a session;
//! ability estimates are derived views recomputed from a response history.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CatError, CatResult};

/// Coarse difficulty band of an item, ordered from easiest to hardest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyBand {
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

impl DifficultyBand {
    /// All bands in ascending order.
    pub const ALL: [DifficultyBand; 4] = [
        DifficultyBand::Beginner,
        DifficultyBand::Intermediate,
        DifficultyBand::Advanced,
        DifficultyBand::Expert,
    ];

    /// Fallback numeric difficulty for items without a calibrated value.
    pub fn lookup_difficulty(self) -> f64 {
        match self {
            DifficultyBand::Beginner => 0.2,
            DifficultyBand::Intermediate => 0.4,
            DifficultyBand::Advanced => 0.6,
            DifficultyBand::Expert => 0.8,
        }
    }

    /// The next harder band, saturating at `Expert`.
    pub fn harder(self) -> Self {
        match self {
            DifficultyBand::Beginner => DifficultyBand::Intermediate,
            DifficultyBand::Intermediate => DifficultyBand::Advanced,
            DifficultyBand::Advanced | DifficultyBand::Expert => DifficultyBand::Expert,
        }
    }

    /// The next easier band, saturating at `Beginner`.
    pub fn easier(self) -> Self {
        match self {
            DifficultyBand::Beginner | DifficultyBand::Intermediate => DifficultyBand::Beginner,
            DifficultyBand::Advanced => DifficultyBand::Intermediate,
            DifficultyBand::Expert => DifficultyBand::Advanced,
        }
    }

    /// The band whose lookup difficulty is closest to `ability`.
    ///
    /// Ties resolve to the easier band.
    pub fn nearest(ability: f64) -> Self {
        let mut best = DifficultyBand::Beginner;
        let mut best_distance = f64::INFINITY;
        for band in Self::ALL {
            let distance = (band.lookup_difficulty() - ability).abs();
            if distance < best_distance {
                best = band;
                best_distance = distance;
            }
        }
        best
    }
}

impl fmt::Display for DifficultyBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DifficultyBand::Beginner => write!(f, "beginner"),
            DifficultyBand::Intermediate => write!(f, "intermediate"),
            DifficultyBand::Advanced => write!(f, "advanced"),
            DifficultyBand::Expert => write!(f, "expert"),
        }
    }
}

impl FromStr for DifficultyBand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "beginner" | "easy" => Ok(DifficultyBand::Beginner),
            "intermediate" | "medium" => Ok(DifficultyBand::Intermediate),
            "advanced" | "hard" => Ok(DifficultyBand::Advanced),
            "expert" => Ok(DifficultyBand::Expert),
            other => Err(format!("unknown difficulty band: {other}")),
        }
    }
}

/// Numeric item difficulty, tagged with where it came from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "lowercase")]
pub enum Difficulty {
    /// An explicitly calibrated difficulty on the ability scale.
    Calibrated { value: f64 },
    /// Derived from the item's difficulty band via the fixed lookup.
    Band { band: DifficultyBand },
}

impl Difficulty {
    pub fn value(&self) -> f64 {
        match self {
            Difficulty::Calibrated { value } => *value,
            Difficulty::Band { band } => band.lookup_difficulty(),
        }
    }

    pub fn is_calibrated(&self) -> bool {
        matches!(self, Difficulty::Calibrated { .. })
    }
}

/// Default discrimination when an item does not specify one.
pub const DEFAULT_DISCRIMINATION: f64 = 1.0;

/// Default guessing floor when an item does not specify one.
pub const DEFAULT_GUESSING: f64 = 0.25;

/// Validated 3PL parameters of one item.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ItemParameters {
    difficulty: Difficulty,
    discrimination: f64,
    guessing: f64,
}

impl ItemParameters {
    /// Validate and build a parameter set.
    ///
    /// Discrimination must be finite and positive, guessing finite and in
    /// `[0, 1)`, and a calibrated difficulty finite.
    pub fn new(difficulty: Difficulty, discrimination: f64, guessing: f64) -> CatResult<Self> {
        validate_discrimination(discrimination)?;
        validate_guessing(guessing)?;
        if let Difficulty::Calibrated { value } = difficulty {
            validate_finite("difficulty", value)?;
        }
        Ok(Self {
            difficulty,
            discrimination,
            guessing,
        })
    }

    pub fn difficulty(&self) -> f64 {
        self.difficulty.value()
    }

    pub fn difficulty_source(&self) -> Difficulty {
        self.difficulty
    }

    pub fn discrimination(&self) -> f64 {
        self.discrimination
    }

    pub fn guessing(&self) -> f64 {
        self.guessing
    }
}

pub(crate) fn validate_finite(name: &'static str, value: f64) -> CatResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(CatError::invalid(name, value, "must be finite"))
    }
}

pub(crate) fn validate_discrimination(value: f64) -> CatResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(CatError::invalid(
            "discrimination",
            value,
            "must be finite and > 0",
        ))
    }
}

pub(crate) fn validate_guessing(value: f64) -> CatResult<()> {
    if value.is_finite() && (0.0..1.0).contains(&value) {
        Ok(())
    } else {
        Err(CatError::invalid("guessing", value, "must be in [0, 1)"))
    }
}

/// A single question with calibrated IRT parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ItemRecord", into = "ItemRecord")]
pub struct Item {
    id: String,
    subject: String,
    topic: String,
    band: DifficultyBand,
    params: ItemParameters,
    expected_time_secs: f64,
}

impl Item {
    /// Start building an item in the given band.
    pub fn builder(id: impl Into<String>, band: DifficultyBand) -> ItemBuilder {
        ItemBuilder {
            id: id.into(),
            subject: String::new(),
            topic: String::new(),
            band,
            discrimination: DEFAULT_DISCRIMINATION,
            guessing: DEFAULT_GUESSING,
            calibrated_difficulty: None,
            expected_time_secs: default_expected_time(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn band(&self) -> DifficultyBand {
        self.band
    }

    pub fn params(&self) -> &ItemParameters {
        &self.params
    }

    pub fn expected_time_secs(&self) -> f64 {
        self.expected_time_secs
    }
}

/// Builder for [`Item`]; validation happens in [`ItemBuilder::build`].
#[derive(Debug, Clone)]
pub struct ItemBuilder {
    id: String,
    subject: String,
    topic: String,
    band: DifficultyBand,
    discrimination: f64,
    guessing: f64,
    calibrated_difficulty: Option<f64>,
    expected_time_secs: f64,
}

impl ItemBuilder {
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    pub fn topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = topic.into();
        self
    }

    pub fn discrimination(mut self, discrimination: f64) -> Self {
        self.discrimination = discrimination;
        self
    }

    pub fn guessing(mut self, guessing: f64) -> Self {
        self.guessing = guessing;
        self
    }

    /// Override the band lookup with a calibrated difficulty.
    pub fn calibrated_difficulty(mut self, difficulty: f64) -> Self {
        self.calibrated_difficulty = Some(difficulty);
        self
    }

    pub fn expected_time_secs(mut self, secs: f64) -> Self {
        self.expected_time_secs = secs;
        self
    }

    pub fn build(self) -> CatResult<Item> {
        let difficulty = match self.calibrated_difficulty {
            Some(value) => Difficulty::Calibrated { value },
            None => Difficulty::Band { band: self.band },
        };
        let params = ItemParameters::new(difficulty, self.discrimination, self.guessing)?;
        if !(self.expected_time_secs.is_finite() && self.expected_time_secs >= 0.0) {
            return Err(CatError::invalid(
                "expected_time_secs",
                self.expected_time_secs,
                "must be finite and >= 0",
            ));
        }
        Ok(Item {
            id: self.id,
            subject: self.subject,
            topic: self.topic,
            band: self.band,
            params,
            expected_time_secs: self.expected_time_secs,
        })
    }
}

/// Flat serialized form of an [`Item`].
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ItemRecord {
    id: String,
    #[serde(default)]
    subject: String,
    #[serde(default)]
    topic: String,
    band: DifficultyBand,
    #[serde(default = "default_discrimination")]
    discrimination: f64,
    #[serde(default = "default_guessing")]
    guessing: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    difficulty: Option<f64>,
    #[serde(default = "default_expected_time")]
    expected_time_secs: f64,
}

fn default_discrimination() -> f64 {
    DEFAULT_DISCRIMINATION
}

fn default_guessing() -> f64 {
    DEFAULT_GUESSING
}

fn default_expected_time() -> f64 {
    60.0
}

impl TryFrom<ItemRecord> for Item {
    type Error = CatError;

    fn try_from(record: ItemRecord) -> Result<Self, Self::Error> {
        let mut builder = Item::builder(record.id, record.band)
            .subject(record.subject)
            .topic(record.topic)
            .discrimination(record.discrimination)
            .guessing(record.guessing)
            .expected_time_secs(record.expected_time_secs);
        if let Some(difficulty) = record.difficulty {
            builder = builder.calibrated_difficulty(difficulty);
        }
        builder.build()
    }
}

impl From<Item> for ItemRecord {
    fn from(item: Item) -> Self {
        let difficulty = match item.params.difficulty_source() {
            Difficulty::Calibrated { value } => Some(value),
            Difficulty::Band { .. } => None,
        };
        ItemRecord {
            id: item.id,
            subject: item.subject,
            topic: item.topic,
            band: item.band,
            discrimination: item.params.discrimination(),
            guessing: item.params.guessing(),
            difficulty,
            expected_time_secs: item.expected_time_secs,
        }
    }
}

/// Lookup of items by id.
///
/// Responses only carry item ids; every engine operation resolves them
/// through this trait and skips ids it cannot find.
pub trait ItemLookup {
    fn item(&self, id: &str) -> Option<&Item>;
}

impl ItemLookup for HashMap<String, Item> {
    fn item(&self, id: &str) -> Option<&Item> {
        self.get(id)
    }
}

impl ItemLookup for BTreeMap<String, Item> {
    fn item(&self, id: &str) -> Option<&Item> {
        self.get(id)
    }
}

impl ItemLookup for [Item] {
    fn item(&self, id: &str) -> Option<&Item> {
        self.iter().find(|item| item.id() == id)
    }
}

impl ItemLookup for Vec<Item> {
    fn item(&self, id: &str) -> Option<&Item> {
        self.as_slice().item(id)
    }
}

/// One answered item within a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Id of the answered item.
    pub item_id: String,
    /// Whether the answer was correct.
    pub correct: bool,
    /// Time taken to answer, in seconds.
    #[serde(default)]
    pub elapsed_secs: f64,
    /// Self-reported confidence in `[0, 1]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    /// Ability estimate in effect when the item was selected.
    #[serde(default)]
    pub ability_at_selection: f64,
    /// Information the item carried at selection time.
    #[serde(default)]
    pub information_gained: f64,
}

impl Response {
    pub fn new(item_id: impl Into<String>, correct: bool) -> Self {
        Self {
            item_id: item_id.into(),
            correct,
            elapsed_secs: 0.0,
            confidence: None,
            ability_at_selection: 0.0,
            information_gained: 0.0,
        }
    }

    pub fn with_elapsed(mut self, secs: f64) -> Self {
        self.elapsed_secs = secs;
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    pub fn with_selection(mut self, ability: f64, information: f64) -> Self {
        self.ability_at_selection = ability;
        self.information_gained = information;
        self
    }
}

/// Ability estimate derived from the first `sequence` responses.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AbilityEstimate {
    pub ability: f64,
    pub standard_error: f64,
    /// Number of responses the estimate was computed from.
    pub sequence: usize,
}

impl AbilityEstimate {
    /// The estimate before any response: ability 0, maximal uncertainty.
    pub fn initial() -> Self {
        Self {
            ability: 0.0,
            standard_error: 1.0,
            sequence: 0,
        }
    }
}

/// Per-call selection policy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectionConstraints {
    /// Target share of administered items per subject.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_distribution: Option<BTreeMap<String, f64>>,
    /// Only items in these bands may be selected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty_bands: Option<Vec<DifficultyBand>>,
    /// Topics to skip while they appear in the recent-response window.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub avoid_recent_topics: Vec<String>,
}

impl SelectionConstraints {
    pub fn with_bands(mut self, bands: Vec<DifficultyBand>) -> Self {
        self.difficulty_bands = Some(bands);
        self
    }

    pub fn with_subject_distribution(mut self, distribution: BTreeMap<String, f64>) -> Self {
        self.subject_distribution = Some(distribution);
        self
    }

    pub fn avoiding_topics(mut self, topics: Vec<String>) -> Self {
        self.avoid_recent_topics = topics;
        self
    }
}
