//! Statistical and end-to-end properties of the estimator, selector and
//! stopping rule, checked on simulated response patterns.

use irtcat_core::irt::probability_correct;
use irtcat_core::{
    estimate_ability, select_next, should_continue, standard_error, DifficultyBand, Item,
    Response, SelectionConstraints,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Twenty discriminating items spread evenly over [-2, 2].
fn discriminating_bank() -> Vec<Item> {
    (0..20)
        .map(|i| {
            let b = -2.0 + 4.0 * i as f64 / 19.0;
            Item::builder(format!("i{i:02}"), DifficultyBand::nearest(b))
                .discrimination(2.2)
                .guessing(0.1)
                .calibrated_difficulty(b)
                .build()
                .unwrap()
        })
        .collect()
}

fn simulate(items: &[Item], ids: &[&str], theta: f64, rng: &mut StdRng) -> Vec<Response> {
    ids.iter()
        .map(|id| {
            let item = items.iter().find(|i| i.id() == *id).unwrap();
            let p = item.params();
            let prob =
                probability_correct(theta, p.difficulty(), p.discrimination(), p.guessing())
                    .unwrap();
            Response::new(*id, rng.gen_bool(prob))
        })
        .collect()
}

#[test]
fn estimates_converge_toward_true_ability() {
    let bank = discriminating_bank();
    let ids: Vec<&str> = bank.iter().map(Item::id).collect();
    let mut rng = StdRng::seed_from_u64(2024);

    for theta in [0.0, 0.5] {
        let runs = 60;
        let close = (0..runs)
            .filter(|_| {
                let responses = simulate(&bank, &ids, theta, &mut rng);
                (estimate_ability(&responses, &bank) - theta).abs() < 0.5
            })
            .count();
        assert!(
            close * 2 > runs,
            "only {close}/{runs} estimates within 0.5 of {theta}"
        );
    }
}

#[test]
fn standard_error_shrinks_with_longer_histories() {
    let bank = discriminating_bank();
    let ids: Vec<&str> = bank.iter().chain(bank.iter()).map(Item::id).collect();
    let mut rng = StdRng::seed_from_u64(7);

    let mean_se = |n: usize, rng: &mut StdRng| {
        let runs = 60;
        let total: f64 = (0..runs)
            .map(|_| {
                let responses = simulate(&bank, &ids[..n], 0.5, rng);
                let theta = estimate_ability(&responses, &bank);
                standard_error(&responses, &bank, theta)
            })
            .sum();
        total / runs as f64
    };

    let short = mean_se(10, &mut rng);
    let long = mean_se(40, &mut rng);
    assert!(long < short, "mean SE {long} for 40 responses vs {short} for 10");
    assert!(long < 0.4);
}

#[test]
fn four_item_session_end_to_end() {
    // Band-derived difficulties 0.2 / 0.4 / 0.6 / 0.8 without guessing.
    let bank: Vec<Item> = DifficultyBand::ALL
        .iter()
        .enumerate()
        .map(|(i, &band)| Item::builder(format!("q{i}"), band).guessing(0.0).build().unwrap())
        .collect();

    let responses: Vec<Response> = (0..10)
        .map(|i| Response::new(format!("q{}", i % 4), i % 2 == 0))
        .collect();

    let theta = estimate_ability(&responses, &bank);
    assert!(theta > 0.2 && theta < 0.8, "estimate {theta} outside the bank");
    assert!(standard_error(&responses, &bank, theta) < 1.0);

    assert!(should_continue(&responses[..4], &bank, theta, 10, 0.3));
    assert!(!should_continue(&responses, &bank, theta, 10, 0.3));
}

#[test]
fn selector_walks_the_bank_without_repeats() {
    let bank = discriminating_bank();
    let constraints =
        SelectionConstraints::default().with_bands(vec![DifficultyBand::Beginner]);
    let mut history = Vec::new();
    let mut theta = 0.0;
    while let Some(chosen) = select_next(&bank, theta, &history, &bank, Some(&constraints)) {
        assert_eq!(chosen.item.band(), DifficultyBand::Beginner);
        history.push(Response::new(chosen.item.id(), true));
        theta = estimate_ability(&history, &bank);
    }
    let expected = bank
        .iter()
        .filter(|i| i.band() == DifficultyBand::Beginner)
        .count();
    assert_eq!(history.len(), expected);
    assert!(expected > 0);
}

#[test]
fn empty_inputs_have_defined_results() {
    let none: Vec<Item> = Vec::new();
    assert!(select_next(&none, 0.0, &[], &none, None).is_none());
    assert_eq!(estimate_ability(&[], &none), 0.0);
    assert_eq!(standard_error(&[], &none, 0.0), 1.0);
}
