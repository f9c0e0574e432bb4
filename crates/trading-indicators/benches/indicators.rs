//! Benchmarks for indicator calculation over intraday-sized series.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use trading_core::traits::{Indicator, MultiOutputIndicator};
use trading_core::types::{Bar, BarSeries, Timeframe};
use trading_indicators::{Ema, IndicatorFrame, IndicatorParams, Macd, Rsi};

fn generate_closes(size: usize) -> Vec<f64> {
    (0..size)
        .map(|i| 4500.0 + (i as f64 * 0.1).sin() * 25.0)
        .collect()
}

fn generate_series(size: usize) -> BarSeries {
    let bars = generate_closes(size)
        .into_iter()
        .enumerate()
        .map(|(i, c)| Bar::new(i as i64 * 300_000, c, c + 1.5, c - 1.5, c, 10_000.0))
        .collect();
    BarSeries::from_bars("^GSPC", Timeframe::Minute5, bars)
}

fn benchmark_single_indicators(c: &mut Criterion) {
    let mut group = c.benchmark_group("single");

    // Two years of 5 minute bars is roughly 39k bars
    for size in [1_000, 10_000, 40_000].iter() {
        let data = generate_closes(*size);

        group.bench_with_input(BenchmarkId::new("ema_20", size), &data, |b, data| {
            let ema = Ema::new(20);
            b.iter(|| ema.calculate(black_box(data)))
        });

        group.bench_with_input(BenchmarkId::new("rsi_14", size), &data, |b, data| {
            let rsi = Rsi::new(14);
            b.iter(|| rsi.calculate(black_box(data)))
        });

        group.bench_with_input(BenchmarkId::new("macd", size), &data, |b, data| {
            let macd = Macd::new();
            b.iter(|| macd.calculate(black_box(data)))
        });
    }

    group.finish();
}

fn benchmark_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame");
    let params = IndicatorParams::default();

    for size in [10_000, 40_000].iter() {
        let series = generate_series(*size);
        group.bench_with_input(BenchmarkId::new("full_grid", size), &series, |b, series| {
            b.iter(|| IndicatorFrame::compute(black_box(series), &params))
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_single_indicators, benchmark_frame);
criterion_main!(benches);
