//! irtcat-core: adaptive-testing engine, item banks, and sessions.
//!
//! This crate holds the 3PL item response model, the ability estimator,
//! item selection and its strategy variants, the stopping rule, session
//! diagnostics, and the session controller the rest of irtcat builds on.

pub mod bank;
pub mod config;
pub mod error;
pub mod estimation;
pub mod irt;
pub mod metrics;
pub mod model;
pub mod selection;
pub mod service;
pub mod session;
pub mod stopping;
pub mod strategy;
pub mod traits;

pub use error::{CatError, CatResult};
pub use estimation::{estimate, estimate_ability, standard_error};
pub use irt::{item_information, probability_correct};
pub use metrics::{build_metrics, AdaptiveMetrics};
pub use model::{
    AbilityEstimate, Difficulty, DifficultyBand, Item, ItemLookup, ItemParameters, Response,
    SelectionConstraints,
};
pub use selection::{select_next, Selection};
pub use stopping::{should_continue, StopReason, StoppingRule};
pub use strategy::{select_with_strategy, SelectionStrategy, StrategyKind};
