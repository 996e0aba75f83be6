//! Index benchmarks.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use mica_index::ExtendibleHashTable;

fn extendible_insert_benchmark(c: &mut Criterion) {
    c.bench_function("extendible_insert_1000", |b| {
        b.iter(|| {
            let table: ExtendibleHashTable<u64, u64> = ExtendibleHashTable::new(4);
            for i in 0..1000 {
                table.insert(i, i * 2);
            }
            black_box(table.len())
        })
    });
}

fn extendible_get_benchmark(c: &mut Criterion) {
    let table: ExtendibleHashTable<u64, u64> = ExtendibleHashTable::new(4);
    for i in 0..1000 {
        table.insert(i, i * 2);
    }

    c.bench_function("extendible_get_1000", |b| {
        b.iter(|| {
            for i in 0..1000 {
                black_box(table.get(&i));
            }
        })
    });
}

fn extendible_churn_benchmark(c: &mut Criterion) {
    c.bench_function("extendible_insert_remove_1000", |b| {
        b.iter(|| {
            let table: ExtendibleHashTable<u64, u64> = ExtendibleHashTable::new(4);
            for i in 0..1000 {
                table.insert(i, i);
            }
            for i in 0..1000 {
                table.remove(&i);
            }
            black_box(table.len())
        })
    });
}

criterion_group!(
    benches,
    extendible_insert_benchmark,
    extendible_get_benchmark,
    extendible_churn_benchmark,
);
criterion_main!(benches);
