//! Benchmarks for presence tracking and frame processing

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeSet;
use std::time::{Duration, Instant};
use whack_a_monkey::{
    config::GameConfig,
    game::{Game, SessionCommand},
    presence::PresenceTracker,
    target::MarkerId,
};

fn random_frames(markers: u32, count: usize) -> Vec<BTreeSet<MarkerId>> {
    let mut rng = StdRng::seed_from_u64(42);
    (0..count)
        .map(|_| (0..markers).filter(|_| rng.gen_bool(0.8)).map(MarkerId).collect())
        .collect()
}

fn benchmark_presence_tracker(c: &mut Criterion) {
    let mut group = c.benchmark_group("presence_tracker");

    for past in [10usize, 30, 120] {
        let frames = random_frames(8, 1000);
        group.bench_with_input(BenchmarkId::from_parameter(past), &past, |b, &past| {
            b.iter(|| {
                let mut tracker = PresenceTracker::new((0..8).map(MarkerId).collect(), past);
                for frame in &frames {
                    black_box(tracker.record_and_find_vanished(frame));
                }
            });
        });
    }

    group.finish();
}

fn benchmark_game_frames(c: &mut Criterion) {
    let frames = random_frames(4, 1000);
    let config = GameConfig {
        tracked_ids: (0..4).map(MarkerId).collect(),
        preparation_delay: 0.0,
        chances: u32::MAX,
        ..GameConfig::default()
    };

    c.bench_function("game_process_1000_frames", |b| {
        b.iter(|| {
            let settings = config.to_settings().unwrap();
            let mut game = Game::new(settings, StdRng::seed_from_u64(1)).unwrap();
            let mut now = Instant::now();
            game.handle_command(SessionCommand::Begin, now).unwrap();
            for frame in &frames {
                now += Duration::from_millis(33);
                black_box(game.process_frame(now, frame).unwrap());
            }
        });
    });
}

criterion_group!(benches, benchmark_presence_tracker, benchmark_game_frames);
criterion_main!(benches);
