//! Criterion benchmarks for the DSP-heavy pipeline stages.

use autocut_cli::core::jobs::JobContext;
use autocut_cli::core::model::AnalysisConfig;
use autocut_cli::core::detector::SilenceDetector;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

const RATE: u32 = 48_000;

/// Deterministic signal with alternating speech and silence stretches.
fn synth_samples(duration_s: usize) -> Vec<f32> {
    let n = duration_s * RATE as usize;
    let mut samples = Vec::with_capacity(n);
    for i in 0..n {
        let second = i / RATE as usize;
        let amplitude = if second % 7 < 5 { 0.1 } else { 0.0005 };
        samples.push(if i % 2 == 0 { amplitude } else { -amplitude });
    }
    samples
}

fn bench_detect(c: &mut Criterion) {
    let config = AnalysisConfig {
        silence_threshold_db: -35.0,
        silence_min_duration_ms: 400,
        pre_pad_ms: 0,
        post_pad_ms: 0,
        ..AnalysisConfig::default()
    };
    let detector = SilenceDetector::new(config).unwrap();
    let ctx = JobContext::standalone();

    let mut group = c.benchmark_group("silence_detection");
    for duration in [30usize, 120, 600] {
        let samples = synth_samples(duration);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}s", duration)),
            &samples,
            |b, samples| {
                b.iter(|| detector.detect_samples(samples, RATE, &ctx).unwrap());
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_detect);
criterion_main!(benches);
