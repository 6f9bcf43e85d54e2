//! Simulated examinees.
//!
//! Answers are drawn from the 3PL model at a fixed true ability, so the
//! estimator's recovery of that ability can be measured.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use irtcat_core::irt::probability_for;
use irtcat_core::traits::{Answer, Examinee};
use irtcat_core::Item;

/// Response times are the item's expected time scaled by a factor drawn
/// from this range.
const TIME_JITTER: (f64, f64) = (0.7, 1.3);

/// An examinee answering according to the 3PL model.
pub struct SimulatedExaminee {
    id: String,
    true_ability: f64,
    /// Multiplier on expected response times.
    pace: f64,
    /// Extra pace per answered item, to model fatigue.
    fatigue: f64,
    report_confidence: bool,
    answered: AtomicU32,
    rng: Mutex<StdRng>,
}

impl SimulatedExaminee {
    /// Create an examinee whose answers are reproducible from `seed`.
    pub fn new(id: impl Into<String>, true_ability: f64, seed: u64) -> Self {
        Self {
            id: id.into(),
            true_ability,
            pace: 1.0,
            fatigue: 0.0,
            report_confidence: false,
            answered: AtomicU32::new(0),
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn with_pace(mut self, pace: f64) -> Self {
        self.pace = pace;
        self
    }

    /// Slow down by `per_item` of the expected time for every item answered.
    pub fn with_fatigue(mut self, per_item: f64) -> Self {
        self.fatigue = per_item;
        self
    }

    /// Report a confidence alongside each answer.
    pub fn with_confidence(mut self) -> Self {
        self.report_confidence = true;
        self
    }

    pub fn true_ability(&self) -> f64 {
        self.true_ability
    }

    /// Number of items answered so far.
    pub fn answered(&self) -> u32 {
        self.answered.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Examinee for SimulatedExaminee {
    fn id(&self) -> &str {
        &self.id
    }

    async fn answer(&self, item: &Item) -> anyhow::Result<Answer> {
        let p = probability_for(self.true_ability, item.params())?;
        let position = self.answered.fetch_add(1, Ordering::Relaxed) as f64;

        let mut rng = self
            .rng
            .lock()
            .map_err(|_| anyhow::anyhow!("examinee {} rng poisoned", self.id))?;
        let correct = rng.gen_bool(p);
        let jitter = rng.gen_range(TIME_JITTER.0..TIME_JITTER.1);
        let elapsed_secs =
            item.expected_time_secs() * (self.pace + self.fatigue * position) * jitter;

        let mut answer = Answer::new(correct, elapsed_secs.max(0.0));
        if self.report_confidence {
            // Confidence tracks the success probability with some noise.
            let noise: f64 = rng.gen_range(-0.2..0.2);
            answer = answer.with_confidence((p + noise).clamp(0.0, 1.0));
        }
        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use irtcat_core::DifficultyBand;

    fn item(difficulty: f64) -> Item {
        Item::builder("q", DifficultyBand::Intermediate)
            .calibrated_difficulty(difficulty)
            .guessing(0.0)
            .expected_time_secs(40.0)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn same_seed_same_answers() {
        let a = SimulatedExaminee::new("a", 0.3, 11);
        let b = SimulatedExaminee::new("b", 0.3, 11);
        for d in [-1.0, 0.0, 0.5, 1.0, 2.0] {
            let item = item(d);
            assert_eq!(a.answer(&item).await.unwrap(), b.answer(&item).await.unwrap());
        }
        assert_eq!(a.answered(), 5);
    }

    #[tokio::test]
    async fn accuracy_follows_the_model() {
        let examinee = SimulatedExaminee::new("x", 2.0, 5);
        let easy = item(-1.0);
        let hard = item(4.0);
        let mut easy_correct = 0;
        let mut hard_correct = 0;
        for _ in 0..200 {
            easy_correct += examinee.answer(&easy).await.unwrap().correct as u32;
            hard_correct += examinee.answer(&hard).await.unwrap().correct as u32;
        }
        assert!(easy_correct > 170, "easy: {easy_correct}");
        assert!(hard_correct < 60, "hard: {hard_correct}");
    }

    #[tokio::test]
    async fn response_times_scale_with_pace_and_fatigue() {
        let examinee = SimulatedExaminee::new("slow", 0.0, 3)
            .with_pace(2.0)
            .with_fatigue(0.5);
        let item = item(0.0);
        let first = examinee.answer(&item).await.unwrap();
        assert!(first.elapsed_secs >= 40.0 * 2.0 * 0.7);
        assert!(first.elapsed_secs <= 40.0 * 2.0 * 1.3);
        for _ in 0..3 {
            examinee.answer(&item).await.unwrap();
        }
        let fifth = examinee.answer(&item).await.unwrap();
        assert!(fifth.elapsed_secs >= 40.0 * 4.0 * 0.7);
        assert!(first.confidence.is_none());
    }

    #[tokio::test]
    async fn confidence_is_within_unit_interval() {
        let examinee = SimulatedExaminee::new("c", 1.0, 9).with_confidence();
        for d in [-3.0, 0.0, 3.0] {
            let confidence = examinee.answer(&item(d)).await.unwrap().confidence.unwrap();
            assert!((0.0..=1.0).contains(&confidence));
        }
    }
}
