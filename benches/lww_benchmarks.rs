use criterion::{black_box, criterion_group, criterion_main, Criterion};
use lww_element_set::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn populated(id: &str, seed: u64, ops: usize) -> LWWElementSet<u32, ManualClock<u64>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut set = LWWElementSet::new(id, ManualClock::new(0));
    for ts in 0..ops as u64 {
        let element = rng.gen_range(0..1000u32);
        if rng.gen_bool(0.7) {
            set.add_at(element, ts);
        } else {
            set.remove_at(element, ts);
        }
    }
    set
}

fn bench_add(c: &mut Criterion) {
    c.bench_function("LWWElementSet::add x1000", |b| {
        let clock = SystemClock::new();
        b.iter(|| {
            let mut set = LWWElementSet::new("bench", &clock);
            for i in 0..1000u32 {
                set.add(i).unwrap();
            }
            black_box(set.len())
        })
    });
}

fn bench_contains(c: &mut Criterion) {
    let set = populated("bench", 1, 5000);

    c.bench_function("LWWElementSet::contains x1000", |b| {
        b.iter(|| {
            let hits = (0..1000u32).filter(|e| set.contains(e)).count();
            black_box(hits)
        })
    });
}

fn bench_value(c: &mut Criterion) {
    let set = populated("bench", 2, 5000);

    c.bench_function("LWWElementSet::value 5000 ops", |b| {
        b.iter(|| black_box(set.value().count()))
    });
}

fn bench_sync(c: &mut Criterion) {
    let left = populated("a", 3, 2000);
    let right = populated("b", 4, 2000);

    c.bench_function("LWWElementSet::sync 2000+2000 ops", |b| {
        b.iter(|| {
            let mut x = left.clone();
            let mut y = right.clone();
            x.sync(&mut y);
            black_box(x.len())
        })
    });
}

fn bench_merge_replicas(c: &mut Criterion) {
    let replicas: Vec<_> = (0..10)
        .map(|i| populated(&format!("node-{i}"), i, 500))
        .collect();

    c.bench_function("LWWElementSet::merge 10 replicas", |b| {
        b.iter(|| {
            let mut merged = replicas[0].clone();
            for other in &replicas[1..] {
                merged.merge(other);
            }
            black_box(merged.len())
        })
    });
}

fn bench_gcounter_merge(c: &mut Criterion) {
    let counters: Vec<GCounter> = (0..100)
        .map(|i| {
            let mut c = GCounter::new(format!("replica-{i}"));
            c.increment_by(format!("node-{i}"), 100);
            c
        })
        .collect();

    c.bench_function("GCounter::merge 100 replicas", |b| {
        b.iter(|| {
            let mut merged = counters[0].clone();
            for other in &counters[1..] {
                merged.merge(other);
            }
            black_box(merged.value())
        })
    });
}

criterion_group!(
    benches,
    bench_add,
    bench_contains,
    bench_value,
    bench_sync,
    bench_merge_replicas,
    bench_gcounter_merge,
);
criterion_main!(benches);
