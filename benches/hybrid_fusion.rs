//! Benchmarks for score fusion
//!
//! This benchmark measures weighted fusion of vector and BM25 candidate
//! lists under each normalization strategy.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rag_retrieval::hybrid::{fuse, FusionParams, ScoreNormalization};

fn candidates(n: usize, offset: u64, scale: f32) -> Vec<(u64, f32)> {
    (0..n as u64)
        .map(|i| (i * 2 + offset, scale * (1.0 - i as f32 / n as f32)))
        .collect()
}

fn bench_fuse(c: &mut Criterion) {
    let mut group = c.benchmark_group("fuse");
    for n in [30usize, 300, 3_000] {
        let vector = candidates(n, 0, 1.0);
        let lexical = candidates(n, 1, 12.0);
        group.throughput(Throughput::Elements((2 * n) as u64));
        for (name, norm) in [
            ("bounded", ScoreNormalization::Bounded),
            ("max_scaled", ScoreNormalization::MaxScaled),
            ("min_max", ScoreNormalization::MinMax),
        ] {
            let params = FusionParams::new(0.5, 10).with_normalization(norm, ScoreNormalization::MaxScaled);
            group.bench_with_input(BenchmarkId::new(name, n), &n, |b, _| {
                b.iter(|| fuse(black_box(&vector), black_box(&lexical), &params))
            });
        }
    }
    group.finish();
}

criterion_group!(benches, bench_fuse);
criterion_main!(benches);
