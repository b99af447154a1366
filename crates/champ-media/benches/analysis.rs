//! Analysis stage benchmarks.
//!
//! # Running Benchmarks
//! ```bash
//! cargo bench --package champ-media --bench analysis
//! ```
//!
//! Measures the per-video cost of everything after decoding: temporal
//! normalization, the four biomechanical sub-scores and fusion.

use std::sync::Arc;
use std::time::Duration;

use champ_media::analyzer::{analyze_consistency, analyze_form, analyze_power};
use champ_media::{
    fuse_scores, BiomechanicalAnalyzer, ConstantSampler, NormalizationStats, PoseTensor,
    TemporalNormalizer, NUM_COORDS, NUM_LANDMARKS,
};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ndarray::Array3;

/// Synthetic sequence with a slowly drifting, fully visible pose.
fn synthetic_sequence(frames: usize) -> PoseTensor {
    Array3::from_shape_fn((frames, NUM_LANDMARKS, NUM_COORDS), |(t, j, c)| {
        let drift = t as f32 * 0.002;
        match c {
            0 => 0.3 + j as f32 * 0.01 + drift,
            1 => 0.2 + j as f32 * 0.015 + drift * 0.5,
            _ => -0.05 + j as f32 * 0.001,
        }
    })
}

fn bench_normalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalize");
    group.measurement_time(Duration::from_secs(5));

    let stats = NormalizationStats::new(
        vec![0.5; NUM_LANDMARKS * NUM_COORDS],
        vec![0.2; NUM_LANDMARKS * NUM_COORDS],
    );
    let normalizer = TemporalNormalizer::new(120, Some(stats));

    for frames in [60usize, 120, 600] {
        let sequence = synthetic_sequence(frames);
        group.throughput(Throughput::Elements(frames as u64));
        group.bench_with_input(BenchmarkId::from_parameter(frames), &sequence, |b, seq| {
            b.iter(|| normalizer.normalize(black_box(seq)))
        });
    }
    group.finish();
}

fn bench_sub_scores(c: &mut Criterion) {
    let mut group = c.benchmark_group("sub_scores");
    let sequence = synthetic_sequence(120);

    group.bench_function("form", |b| b.iter(|| analyze_form(black_box(&sequence))));
    group.bench_function("consistency", |b| {
        b.iter(|| analyze_consistency(black_box(&sequence)))
    });
    group.bench_function("power", |b| b.iter(|| analyze_power(black_box(&sequence))));
    group.finish();
}

fn bench_analyze_and_fuse(c: &mut Criterion) {
    let analyzer = BiomechanicalAnalyzer::new(Arc::new(ConstantSampler(60.0)));
    let sequence = synthetic_sequence(120);

    c.bench_function("analyze_and_fuse", |b| {
        b.iter(|| {
            let analysis = analyzer.analyze(black_box(&sequence));
            fuse_scores(0.5, &analysis, 0)
        })
    });
}

criterion_group!(benches, bench_normalize, bench_sub_scores, bench_analyze_and_fuse);
criterion_main!(benches);
