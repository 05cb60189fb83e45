//! Performance benchmarks for canonical forms and simplification.
//!
//! Run with: `cargo bench --bench canonical`
//!
//! ## Performance Targets
//!
//! | Operation | Target | Notes |
//! |-----------|--------|-------|
//! | Canonical form | <1ms for 10 crossings | One traversal per starting endpoint |
//! | Cached canonical form | <10µs | LRU cache hit |
//! | Crossing-reducing simplify | <5ms for 10 crossings | First-choice removal |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use pd_kernel::moves::r1_add_in_place;
use pd_kernel::{
    canonical, find_moves, parse_native, simplify, CacheConfig, CanonicalCache, Endpoint,
    MoveSet, PlanarDiagram, SearchConfig, Strategy,
};

const TREFOIL: &str = "a=X(b3 c0 c3 b0) b=X(a3 c2 c1 a0) c=X(a1 b2 b1 a2)";
const THETA: &str = "a=V(b0 c0 d3) b=V(a0 d2 c1) c=X(a1 b2 d1 d0) d=X(c3 c2 b1 a2)";

/// The trefoil with `kinks` extra curls added along the strand.
fn kinked_trefoil(kinks: usize) -> PlanarDiagram {
    let mut k = parse_native(TREFOIL).unwrap();
    for i in 0..kinks {
        let sign = if i % 2 == 0 { 1 } else { -1 };
        let at = k.nodes().next().cloned().unwrap();
        r1_add_in_place(&mut k, &Endpoint::new(at, i % 4), sign).unwrap();
    }
    k
}

/// Benchmark canonical forms of growing diagrams.
fn bench_canonical(c: &mut Criterion) {
    let mut group = c.benchmark_group("canonical");

    let theta = parse_native(THETA).unwrap();
    group.bench_function("theta", |b| b.iter(|| canonical(black_box(&theta)).unwrap()));

    for kinks in [0, 3, 7, 15] {
        let k = kinked_trefoil(kinks);
        group.throughput(Throughput::Elements(k.crossing_count() as u64));
        group.bench_with_input(BenchmarkId::new("crossings", k.crossing_count()), &k, |b, k| {
            b.iter(|| canonical(black_box(k)).unwrap())
        });
    }

    group.finish();
}

/// Benchmark cached canonical forms (cache hit).
fn bench_cached_canonical(c: &mut Criterion) {
    let cache = CanonicalCache::new(&CacheConfig {
        max_entries: 10_000,
        enabled: true,
    });

    let mut group = c.benchmark_group("cached_canonical");
    for kinks in [0, 7, 15] {
        let k = kinked_trefoil(kinks);
        // Warm the cache
        cache.canonical(&k).unwrap();

        group.bench_with_input(BenchmarkId::new("crossings", k.crossing_count()), &k, |b, k| {
            b.iter(|| cache.canonical(black_box(k)).unwrap())
        });
    }
    group.finish();
}

/// Benchmark move enumeration.
fn bench_find_moves(c: &mut Criterion) {
    let k = kinked_trefoil(7);
    c.bench_function("find_moves_all", |b| {
        b.iter(|| find_moves(black_box(&k), &MoveSet::all()).unwrap())
    });
}

/// Benchmark simplification strategies on a kinked trefoil.
fn bench_simplify(c: &mut Criterion) {
    let config = SearchConfig::default();
    let k = kinked_trefoil(7);

    let mut group = c.benchmark_group("simplify");
    group.sample_size(20);
    for strategy in [Strategy::CrossingReducing, Strategy::Smart] {
        group.bench_with_input(BenchmarkId::new("strategy", strategy), &k, |b, k| {
            b.iter(|| {
                let report = simplify(black_box(k), strategy, &config).unwrap();
                assert_eq!(report.final_crossings, 3);
                report
            })
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_canonical,
    bench_cached_canonical,
    bench_find_moves,
    bench_simplify,
);
criterion_main!(benches);
