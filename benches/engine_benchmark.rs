//! Engine micro-benchmarks: the draw and the tick, the two hot paths.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use crashlab::engine::{CrashPointGenerator, CrashSession, GrowthClock, OsEntropy, SequenceEntropy};
use std::time::{Duration, Instant};

fn bench_crash_point_draw(c: &mut Criterion) {
    let mut generator = CrashPointGenerator::new(OsEntropy);
    c.bench_function("crash_point_draw", |b| {
        b.iter(|| black_box(generator.draw()))
    });
}

fn bench_multiplier_sample(c: &mut Criterion) {
    let clock = GrowthClock::default();
    let elapsed = Duration::from_millis(12_345);
    c.bench_function("multiplier_sample", |b| {
        b.iter(|| black_box(clock.multiplier_at(black_box(elapsed))))
    });
}

fn bench_session_tick(c: &mut Criterion) {
    // Far-tail crash point keeps the round running for the whole measurement.
    let mut session = CrashSession::new(SequenceEntropy::new(vec![u32::MAX]));
    let t0 = Instant::now();
    session
        .place_bet(1.0, t0)
        .expect("fresh session accepts the bet");

    let mut ms = 0u64;
    c.bench_function("session_tick", |b| {
        b.iter(|| {
            ms += 16;
            black_box(session.tick(t0 + Duration::from_millis(ms % 20_000)));
        })
    });
}

criterion_group!(
    benches,
    bench_crash_point_draw,
    bench_multiplier_sample,
    bench_session_tick
);
criterion_main!(benches);
