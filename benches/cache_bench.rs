//! Benchmarks for the tiered cache.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use tiered_cache::{Reclaim, TieredCache};

fn bench_hot_hits(c: &mut Criterion) {
    let cache: TieredCache<u64, u64> = TieredCache::new(1024).unwrap();
    for i in 0..1024 {
        cache.put(i, i);
    }

    c.bench_function("get_hot_1k", |b| {
        b.iter(|| {
            for key in 0..1024u64 {
                black_box(cache.get(&key));
            }
        })
    });
}

fn bench_put_with_demotion(c: &mut Criterion) {
    let cache: TieredCache<u64, u64> = TieredCache::new(256).unwrap();
    let mut next = 0u64;

    c.bench_function("put_demote", |b| {
        b.iter(|| {
            cache.put(black_box(next), next);
            next += 1;
        })
    });
}

fn bench_promotion_churn(c: &mut Criterion) {
    // Capacity 1 forces every alternating hit through the overflow tier.
    let cache: TieredCache<u64, u64> = TieredCache::new(1).unwrap();
    cache.put(0, 0);
    cache.put(1, 1);

    c.bench_function("get_promote_alternating", |b| {
        b.iter(|| {
            black_box(cache.get(&0));
            black_box(cache.get(&1));
        })
    });
}

fn bench_reclaim_sweep(c: &mut Criterion) {
    c.bench_function("reclaim_10k_overflow", |b| {
        b.iter_with_setup(
            || {
                let cache: TieredCache<u64, u64> = TieredCache::new(16).unwrap();
                for i in 0..10_000 {
                    cache.put(i, i);
                }
                cache
            },
            |cache| {
                black_box(cache.reclaim());
                black_box(cache.purge_stale());
            },
        )
    });
}

criterion_group!(
    benches,
    bench_hot_hits,
    bench_put_with_demotion,
    bench_promotion_churn,
    bench_reclaim_sweep,
);
criterion_main!(benches);
