//! Replacement strategy benchmarks: LRU vs midpoint insertion.
//!
//! Two workloads: a skewed hot set, and the same hot set interrupted by a
//! long sequential scan. The scan is where midpoint insertion pays off.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use extentdb::{LruStrategy, MidpointStrategy, ReplacementStrategy};

const CAPACITY: usize = 256;
const HOT_SET: u32 = 192;

/// Feed `trace` through `strategy`, returning the hit count.
fn run<S: ReplacementStrategy<u32>>(strategy: &mut S, trace: &[u32]) -> usize {
    let mut hits = 0;
    for &key in trace {
        if strategy.contains(&key) {
            strategy.access(&key);
            hits += 1;
        } else {
            if strategy.should_evict() {
                strategy.evict();
            }
            strategy.put(key);
        }
    }
    hits
}

/// Deterministic skewed trace: most accesses fall in the hot set.
fn hot_trace(len: usize) -> Vec<u32> {
    let mut state = 0x2545_F491_u32;
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            if state % 10 < 9 {
                state % HOT_SET
            } else {
                HOT_SET + state % 4096
            }
        })
        .collect()
}

fn scan_trace(len: usize) -> Vec<u32> {
    let mut trace = hot_trace(len / 2);
    trace.extend(10_000..10_000 + (len / 4) as u32);
    trace.extend(hot_trace(len / 4));
    trace
}

fn bench_replacement(c: &mut Criterion) {
    let mut group = c.benchmark_group("replacement");

    for (name, trace) in [("hot_set", hot_trace(50_000)), ("scan", scan_trace(50_000))] {
        group.bench_with_input(BenchmarkId::new("lru", name), &trace, |b, trace| {
            b.iter(|| {
                let mut strategy = LruStrategy::new(CAPACITY);
                black_box(run(&mut strategy, trace))
            })
        });

        group.bench_with_input(BenchmarkId::new("midpoint", name), &trace, |b, trace| {
            b.iter(|| {
                let mut strategy = MidpointStrategy::new(CAPACITY, 2, 37);
                black_box(run(&mut strategy, trace))
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_replacement);
criterion_main!(benches);
