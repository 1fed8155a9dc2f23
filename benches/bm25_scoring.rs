//! Benchmarks for the lexical index
//!
//! This benchmark measures:
//! - BM25 index build time by corpus size
//! - Query scoring against a built index

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rag_retrieval::lexical::{Bm25Index, Bm25Params};
use rag_retrieval::store::{Document, DocumentMetadata};

const WORDS: &[&str] = &[
    "ai", "policy", "requires", "transparency", "accountability", "data", "model", "risk",
    "governance", "audit", "privacy", "fairness", "security", "training", "deployment",
    "garden", "tips", "compost", "review", "board",
];

/// Deterministic synthetic corpus.
fn corpus(n: usize) -> Vec<Document> {
    (0..n)
        .map(|i| {
            let len = 20 + i % 40;
            let content: Vec<&str> = (0..len)
                .map(|j| WORDS[(i * 7 + j * 13) % WORDS.len()])
                .collect();
            Document::new(
                i as u64,
                content.join(" "),
                DocumentMetadata::new(format!("doc-{i}.md"), "md"),
            )
        })
        .collect()
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("bm25_build");
    for n in [100usize, 1_000, 10_000] {
        let docs = corpus(n);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &docs, |b, docs| {
            b.iter(|| Bm25Index::build(black_box(docs), Bm25Params::default()))
        });
    }
    group.finish();
}

fn bench_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("bm25_search");
    let docs = corpus(10_000);
    let index = Bm25Index::build(&docs, Bm25Params::default());
    for query in ["ai policy", "governance audit privacy risk", "compost"] {
        group.bench_with_input(BenchmarkId::from_parameter(query), query, |b, q| {
            b.iter(|| index.search(black_box(q), 10))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_build, bench_search);
criterion_main!(benches);
