//! Benchmarks measuring the overhead each wrapper layer adds over a bare
//! function call.
//!
//! Workloads:
//! - fib: deep recursion, tiny per-call work, cache-dominated
//! - mergesort: shallow recursion, real per-call work over owned data
//!
//! Run with: cargo bench
//!
//! Layers compared:
//! - plain:          the bare function
//! - cache:          memoization only
//! - verify:         sampled verification only
//! - verified_cache: memoization plus sampled verification

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use purus::testing::{fib, fib_body, merge_body, mergesort};
use purus::{
    cache, verified_cache, verify, CacheOptions, VerifiedCacheOptions, VerifyOptions,
};

const FIB_SIZES: &[u64] = &[10, 15, 20];

fn bench_fib_plain(c: &mut Criterion) {
    let mut group = c.benchmark_group("fib/plain");
    for &n in FIB_SIZES {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| fib(black_box(n)));
        });
    }
    group.finish();
}

fn bench_fib_cached(c: &mut Criterion) {
    let mut group = c.benchmark_group("fib/cache");
    for &n in FIB_SIZES {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            // Fresh cache per iteration batch so hits and misses both count.
            b.iter_batched(
                || cache("fib", CacheOptions::default(), fib_body),
                |cached| cached.call(black_box(n)),
                criterion::BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn bench_fib_cached_warm(c: &mut Criterion) {
    let mut group = c.benchmark_group("fib/cache_warm");
    for &n in FIB_SIZES {
        let cached = cache("fib", CacheOptions::default(), fib_body);
        cached.call(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| cached.call(black_box(n)));
        });
    }
    group.finish();
}

fn bench_fib_verified(c: &mut Criterion) {
    let mut group = c.benchmark_group("fib/verify");
    for &n in FIB_SIZES {
        let checked = verify(
            "fib",
            VerifyOptions {
                base: 2,
                seed: Some(42),
            },
            fib_body,
        )
        .unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| checked.call(black_box(n)).unwrap());
        });
    }
    group.finish();
}

fn bench_fib_verified_cache(c: &mut Criterion) {
    let mut group = c.benchmark_group("fib/verified_cache");
    for &n in FIB_SIZES {
        let wrapped = verified_cache(
            "fib",
            VerifiedCacheOptions {
                verify: VerifyOptions {
                    base: 2,
                    seed: Some(42),
                },
                ..Default::default()
            },
            fib_body,
        )
        .unwrap();
        wrapped.call(n).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| wrapped.call(black_box(n)).unwrap());
        });
    }
    group.finish();
}

fn bench_mergesort(c: &mut Criterion) {
    let input: Vec<u64> = (0..64u64).rev().collect();
    let mut group = c.benchmark_group("mergesort");

    fn merge_plain(a: Vec<u64>, b: Vec<u64>) -> Vec<u64> {
        let mut out = Vec::with_capacity(a.len() + b.len());
        let (mut a, mut b) = (a.into_iter().peekable(), b.into_iter().peekable());
        loop {
            match (a.peek(), b.peek()) {
                (Some(x), Some(y)) if x < y => out.push(a.next().unwrap()),
                (Some(_), Some(_)) => out.push(b.next().unwrap()),
                (Some(_), None) => out.push(a.next().unwrap()),
                (None, Some(_)) => out.push(b.next().unwrap()),
                (None, None) => return out,
            }
        }
    }

    group.bench_function("plain", |b| {
        b.iter(|| mergesort(black_box(&input), &mut merge_plain));
    });

    group.bench_function("cache", |b| {
        b.iter(|| {
            let merge = cache(
                "merge",
                CacheOptions {
                    max_size: None,
                    ..Default::default()
                },
                merge_body,
            );
            mergesort(black_box(&input), &mut |a, bb| merge.call((a, bb)))
        });
    });

    group.bench_function("verified_cache", |b| {
        b.iter(|| {
            let merge = verified_cache(
                "merge",
                VerifiedCacheOptions {
                    verify: VerifyOptions {
                        base: 2,
                        seed: Some(7),
                    },
                    ..Default::default()
                },
                merge_body,
            )
            .unwrap();
            mergesort(black_box(&input), &mut |a, bb| merge.call((a, bb)).unwrap())
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_fib_plain,
    bench_fib_cached,
    bench_fib_cached_warm,
    bench_fib_verified,
    bench_fib_verified_cache,
    bench_mergesort,
);
criterion_main!(benches);
