//! Extendible hash table benchmarks.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use oxbow_container::ExtendibleHashTable;

fn insert_benchmark(c: &mut Criterion) {
    c.bench_function("extendible_insert_1000", |b| {
        b.iter(|| {
            let table = ExtendibleHashTable::new(4);
            for i in 0..1000u64 {
                table.insert(i, i * 2);
            }
            black_box(table.num_buckets())
        })
    });
}

fn find_benchmark(c: &mut Criterion) {
    let table = ExtendibleHashTable::new(4);
    for i in 0..1000u64 {
        table.insert(i, i * 2);
    }

    c.bench_function("extendible_find_1000", |b| {
        b.iter(|| {
            for i in 0..1000u64 {
                black_box(table.find(&i));
            }
        })
    });
}

fn insert_small_buckets_benchmark(c: &mut Criterion) {
    c.bench_function("extendible_insert_1000_bucket_1", |b| {
        b.iter(|| {
            let table = ExtendibleHashTable::new(1);
            for i in 0..1000u64 {
                table.insert(i, i);
            }
            black_box(table.global_depth())
        })
    });
}

criterion_group!(
    benches,
    insert_benchmark,
    find_benchmark,
    insert_small_buckets_benchmark,
);
criterion_main!(benches);
