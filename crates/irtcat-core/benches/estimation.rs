use criterion::{black_box, criterion_group, criterion_main, Criterion};

use irtcat_core::metrics::build_metrics;
use irtcat_core::strategy::StrategyKind;
use irtcat_core::{estimate_ability, select_next, DifficultyBand, Item, Response};

fn make_bank(n: usize) -> Vec<Item> {
    (0..n)
        .map(|i| {
            let b = -3.0 + 6.0 * i as f64 / (n - 1) as f64;
            Item::builder(format!("i{i}"), DifficultyBand::nearest(b))
                .discrimination(1.0 + (i % 5) as f64 * 0.3)
                .calibrated_difficulty(b)
                .build()
                .unwrap()
        })
        .collect()
}

fn make_history(bank: &[Item], n: usize) -> Vec<Response> {
    bank.iter()
        .take(n)
        .enumerate()
        .map(|(i, item)| Response::new(item.id(), i % 3 != 0).with_elapsed(20.0))
        .collect()
}

fn bench_estimate(c: &mut Criterion) {
    let bank = make_bank(200);
    let mut group = c.benchmark_group("estimate_ability");

    for n in [10, 30] {
        let history = make_history(&bank, n);
        group.bench_function(format!("n={n}"), |b| {
            b.iter(|| estimate_ability(black_box(&history), black_box(&bank)))
        });
    }

    group.finish();
}

fn bench_select(c: &mut Criterion) {
    let bank = make_bank(500);
    let history = make_history(&bank, 20);

    c.bench_function("select_next/500", |b| {
        b.iter(|| select_next(black_box(&bank), black_box(0.4), &history, &bank, None))
    });
}

fn bench_metrics(c: &mut Criterion) {
    let bank = make_bank(200);
    let history = make_history(&bank, 30);

    c.bench_function("build_metrics/30", |b| {
        b.iter(|| build_metrics(black_box(&history), &bank, 0.5, StrategyKind::Standard))
    });
}

criterion_group!(benches, bench_estimate, bench_select, bench_metrics);
criterion_main!(benches);
