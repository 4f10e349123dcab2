//! Benchmarks for indicator implementations.

use analytics_core::traits::Indicator;
use analytics_core::types::{Bar, BarSeries, Interval, Period};
use analytics_indicators::{enrich, Ema, Rsi, Sma};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn generate_test_data(size: usize) -> Vec<f64> {
    (0..size)
        .map(|i| 100.0 + (i as f64 * 0.1).sin() * 10.0)
        .collect()
}

fn generate_series(size: usize) -> BarSeries {
    let bars = generate_test_data(size)
        .into_iter()
        .enumerate()
        .map(|(i, close)| Bar::new(i as i64 * 60_000, close, close + 0.5, close - 0.5, close, 1_000.0))
        .collect();
    BarSeries::new("BENCH", Period::Day5, Interval::Minute1, bars)
}

fn benchmark_moving_averages(c: &mut Criterion) {
    let mut group = c.benchmark_group("MovingAverage");

    for size in [1000, 10000, 100000].iter() {
        let data = generate_test_data(*size);

        group.bench_with_input(BenchmarkId::new("sma", size), &data, |b, data| {
            let sma = Sma::new(20);
            b.iter(|| sma.calculate(black_box(data)))
        });

        group.bench_with_input(BenchmarkId::new("ema", size), &data, |b, data| {
            let ema = Ema::new(20);
            b.iter(|| ema.calculate(black_box(data)))
        });
    }

    group.finish();
}

fn benchmark_rsi(c: &mut Criterion) {
    let mut group = c.benchmark_group("RSI");

    for size in [1000, 10000, 100000].iter() {
        let data = generate_test_data(*size);

        group.bench_with_input(BenchmarkId::new("standard", size), &data, |b, data| {
            let rsi = Rsi::new(14);
            b.iter(|| rsi.calculate(black_box(data)))
        });
    }

    group.finish();
}

fn benchmark_enrich(c: &mut Criterion) {
    let mut group = c.benchmark_group("Enrich");

    for size in [390, 2000, 10000].iter() {
        let series = generate_series(*size);

        group.bench_with_input(BenchmarkId::new("pipeline", size), &series, |b, series| {
            b.iter(|| enrich(black_box(series)))
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_moving_averages, benchmark_rsi, benchmark_enrich);
criterion_main!(benches);
