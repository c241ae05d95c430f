//! Indexing and search throughput benchmarks.
//! Run with: cargo bench -p verbex-core

use std::collections::HashMap;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use verbex_core::{Index, IndexConfig, SearchRequest};

const WORDS: &[&str] = &[
    "the", "quick", "brown", "fox", "jumps", "over", "lazy", "dog", "machine", "learning",
    "distributed", "systems", "database", "index", "query", "rust", "engine", "search", "term",
    "document",
];

fn synthetic_document(seed: usize, length: usize) -> String {
    (0..length)
        .map(|i| WORDS[(seed + i) % WORDS.len()])
        .collect::<Vec<_>>()
        .join(" ")
}

fn bench_add_document(c: &mut Criterion) {
    c.bench_function("add_document_200_words", |b| {
        b.iter_batched(
            || Index::create(IndexConfig::in_memory("bench-add")).unwrap(),
            |index| {
                let content = synthetic_document(0, 200);
                black_box(index.add_document("doc", &content, &[], &HashMap::new(), None).unwrap());
            },
            criterion::BatchSize::SmallInput,
        )
    });
}

fn bench_search_single_term(c: &mut Criterion) {
    let index = Index::create(IndexConfig::in_memory("bench-search-1")).unwrap();
    for n in 0..1_000 {
        let content = synthetic_document(n, 50);
        index.add_document(&format!("doc{n}"), &content, &[], &HashMap::new(), None).unwrap();
    }

    c.bench_function("search_single_term_1000_docs", |b| {
        b.iter(|| {
            black_box(index.search(&SearchRequest::new("rust"), None).unwrap());
        })
    });
}

fn bench_search_and_logic(c: &mut Criterion) {
    let index = Index::create(IndexConfig::in_memory("bench-search-and")).unwrap();
    for n in 0..1_000 {
        let content = synthetic_document(n, 50);
        index.add_document(&format!("doc{n}"), &content, &[], &HashMap::new(), None).unwrap();
    }

    c.bench_function("search_and_logic_two_terms_1000_docs", |b| {
        b.iter(|| {
            let mut request = SearchRequest::new("rust engine");
            request.use_and_logic = true;
            black_box(index.search(&request, None).unwrap());
        })
    });
}

criterion_group!(benches, bench_add_document, bench_search_single_term, bench_search_and_logic);
criterion_main!(benches);
