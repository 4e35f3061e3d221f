use std::hint::black_box;
use std::time::Duration;

use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};
use evictkit::builder::{Cache, CacheBuilder, CachePolicy};
use evictkit::hash_ring::HashRing;
use evictkit::partition::{PartitionConfig, PartitionedCache};
use evictkit::traits::ExpiringCache;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

const CAPACITY: usize = 1024;

fn filled(policy: CachePolicy) -> Cache<u64, u64> {
    let cache = CacheBuilder::new(CAPACITY).build(policy);
    for i in 0..CAPACITY as u64 {
        cache.set(i, i, Duration::ZERO);
    }
    cache
}

/// 80% of accesses hit a hot set a tenth the size of the cache.
fn hot_cold_keys(n: usize) -> Vec<u64> {
    let mut rng = SmallRng::seed_from_u64(42);
    (0..n)
        .map(|_| {
            if rng.gen_bool(0.8) {
                rng.gen_range(0..CAPACITY as u64 / 10)
            } else {
                rng.gen_range(0..CAPACITY as u64 * 4)
            }
        })
        .collect()
}

fn bench_get_hit(c: &mut Criterion) {
    let mut group = c.benchmark_group("get_hit");
    for policy in CachePolicy::ALL {
        let cache = filled(policy);
        group.bench_function(BenchmarkId::from_parameter(policy), |b| {
            let mut i = 0u64;
            b.iter(|| {
                i = (i + 1) % CAPACITY as u64;
                black_box(cache.get(&black_box(i)))
            })
        });
    }
    group.finish();
}

fn bench_eviction_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("eviction_churn");
    for policy in CachePolicy::ALL {
        group.bench_function(BenchmarkId::from_parameter(policy), |b| {
            b.iter_batched(
                || filled(policy),
                |cache| {
                    for i in 0..4096u64 {
                        cache.set(black_box(10_000 + i), i, Duration::ZERO);
                    }
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

fn bench_hot_cold_mix(c: &mut Criterion) {
    let keys = hot_cold_keys(8192);
    let mut group = c.benchmark_group("hot_cold_mix");
    for policy in CachePolicy::ALL {
        group.bench_function(BenchmarkId::from_parameter(policy), |b| {
            b.iter_batched(
                || CacheBuilder::new(CAPACITY).build::<u64, u64>(policy),
                |cache| {
                    for &key in &keys {
                        if cache.get(&key).is_none() {
                            cache.set(key, key, Duration::ZERO);
                        }
                    }
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

fn bench_routing(c: &mut Criterion) {
    let ring = HashRing::new(64, None).unwrap();
    for i in 0..16 {
        ring.add_node(&format!("node-{i}"));
    }
    c.bench_function("hash_ring_get_node", |b| {
        let mut i = 0u64;
        b.iter(|| {
            i += 1;
            black_box(ring.get_node(&format!("key-{i}")))
        })
    });

    let partitioned: PartitionedCache<u64> = PartitionedCache::new(PartitionConfig {
        partitions: 8,
        ..PartitionConfig::default()
    });
    c.bench_function("partitioned_set_get", |b| {
        let mut i = 0u64;
        b.iter(|| {
            i += 1;
            let name = format!("rule-{}", i % 4096);
            partitioned.set(&name, i, Duration::ZERO);
            black_box(partitioned.get(&name))
        })
    });
}

criterion_group!(
    benches,
    bench_get_hit,
    bench_eviction_churn,
    bench_hot_cold_mix,
    bench_routing
);
criterion_main!(benches);
