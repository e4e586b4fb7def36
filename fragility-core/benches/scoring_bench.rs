//! Criterion benchmarks for the scoring hot paths.
//!
//! Benchmarks:
//! 1. normalize_score over growing series (winsorize + rolling robust z + logistic)
//! 2. Full feature build + component scoring + composite on synthetic prices

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use chrono::{Duration, NaiveDate};
use fragility_core::domain::Frame;
use fragility_core::features::build_weekly_features;
use fragility_core::scoring::{compute_component_scores, compute_composite, WeightMap};
use fragility_core::transforms::{normalize_score, NormalizeParams};

// ── Helpers ──────────────────────────────────────────────────────────

fn make_series(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| (i as f64 * 0.1).sin() * 10.0 + (i as f64 * 0.013).cos())
        .collect()
}

fn make_prices(tickers: &[&str], n: usize) -> Frame {
    let start = NaiveDate::from_ymd_opt(2018, 1, 1).unwrap();
    let mut frame = Frame::new((0..n).map(|i| start + Duration::days(i as i64)).collect());
    for (k, ticker) in tickers.iter().enumerate() {
        let phase = k as f64 * 0.7;
        let closes = (0..n)
            .map(|i| 100.0 * (1.0 + 0.02 * (i as f64 * 0.05 + phase).sin()) + i as f64 * 0.05)
            .collect();
        frame.insert(*ticker, closes);
    }
    frame
}

// ── 1. normalize_score ───────────────────────────────────────────────

fn bench_normalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalize_score");
    for n in [260usize, 520, 1040] {
        let input = make_series(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &input, |b, input| {
            b.iter(|| normalize_score(black_box(input), 104, 0.05, 0.95))
        });
    }
    group.finish();
}

// ── 2. Full scoring pass ─────────────────────────────────────────────

fn bench_scoring_pass(c: &mut Criterion) {
    let mut group = c.benchmark_group("scoring_pass");
    let tickers = ["NVDA", "MSFT", "GOOGL", "AMZN", "META", "AMD", "SPY"];
    let sector: Vec<String> = tickers[..6].iter().map(|s| s.to_string()).collect();
    let prices = make_prices(&tickers, 5 * 365);
    let weights = WeightMap::default();
    let params = NormalizeParams::default();

    group.bench_function("5y_daily_6_tickers", |b| {
        b.iter(|| {
            let features =
                build_weekly_features(black_box(&prices), &Frame::default(), &[], &sector, "SPY")
                    .ok()?;
            let scores = compute_component_scores(&features, &params).ok()?;
            compute_composite(&scores, &weights).ok()
        })
    });
    group.finish();
}

criterion_group!(benches, bench_normalize, bench_scoring_pass);
criterion_main!(benches);
