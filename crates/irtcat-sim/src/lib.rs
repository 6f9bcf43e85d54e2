//! irtcat-sim: simulated examinees and batch session runs.
//!
//! Examinees answer according to the 3PL model at a known true ability;
//! running many sessions against a bank measures how well the engine
//! recovers those abilities.

pub mod examinee;
pub mod report;
pub mod runner;

pub use examinee::SimulatedExaminee;
pub use report::{compute_recovery_stats, RecoveryStats, SimulatedSession, SimulationReport};
pub use runner::{NoopReporter, ProgressReporter, SimulationConfig, Simulator};
