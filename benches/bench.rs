#![allow(missing_docs)]

use alloy_primitives::keccak256;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use stacktrie::{root::ordered_trie_root, StackTrie};
use std::{collections::BTreeMap, hint::black_box};

/// Benchmarks root construction over pre-sorted hashed keys.
pub fn stack_trie_root(c: &mut Criterion) {
    let mut g = c.benchmark_group("stack_trie");
    for count in [100u64, 1_000, 10_000] {
        let data: BTreeMap<_, _> = (0..count)
            .map(|i| (keccak256(i.to_be_bytes()), alloy_rlp::encode(i)))
            .collect();

        g.throughput(Throughput::Elements(count));
        g.bench_function(BenchmarkId::new("root", count), |b| {
            b.iter(|| {
                let mut trie = StackTrie::new();
                for (key, value) in &data {
                    trie.update(black_box(key.as_slice()), value).unwrap();
                }
                trie.root()
            })
        });
    }
    g.finish();
}

/// Benchmarks the index-keyed root of an rlp-encodable list.
pub fn ordered_root(c: &mut Criterion) {
    let mut g = c.benchmark_group("ordered_trie_root");
    for count in [100u64, 1_000] {
        let items = (0..count).collect::<Vec<_>>();

        g.throughput(Throughput::Elements(count));
        g.bench_function(BenchmarkId::new("u64", count), |b| {
            b.iter(|| ordered_trie_root(black_box(&items)))
        });
    }
    g.finish();
}

criterion_group!(benches, stack_trie_root, ordered_root);
criterion_main!(benches);
