use beat_conductor::{Conductor, ManualClock, MusicContainer};
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

fn populated_container(total_steps: u64, every: u64) -> MusicContainer {
    let mut container = MusicContainer::new(total_steps);
    for step in (0..total_steps).step_by(every as usize) {
        container.add_note(step, "kick");
    }
    container
}

/// Benchmark lookahead recomputation (runs after every structural edit)
fn bench_update_slots(c: &mut Criterion) {
    let mut group = c.benchmark_group("update_slots");

    for slots in [16u64, 256, 4096] {
        let mut container = populated_container(slots * 2, 2);
        group.bench_with_input(BenchmarkId::from_parameter(slots), &slots, |b, _| {
            b.iter(|| {
                container.update_slots();
                black_box(container.len());
            });
        });
    }
    group.finish();
}

/// Benchmark a single edit on a busy schedule
fn bench_add_remove_note(c: &mut Criterion) {
    let mut container = populated_container(8192, 4);

    c.bench_function("add_remove_note", |b| {
        b.iter(|| {
            black_box(container.add_note(4097, "snare"));
            black_box(container.remove_note(4097, "snare"));
        });
    });
}

/// Benchmark the tick path with a connected schedule
fn bench_tick(c: &mut Criterion) {
    c.bench_function("conductor_tick", |b| {
        let mut conductor = Conductor::new(174.0, 4.0).with_shuffle_seed(1);
        let clock = ManualClock::new(600.0);
        let playhead = clock.shared_state();
        conductor.attach_clock(clock);
        let container = populated_container(conductor.total_steps(), 2);
        conductor.connect_music_container(container);
        conductor.play_from_step(0);

        let frame = 1.0 / 240.0;
        b.iter(|| {
            if playhead.position() + frame >= 600.0 {
                conductor.play_from_step(0);
            }
            playhead.advance_position(frame);
            conductor.advance(black_box(frame));
        });
    });
}

/// Benchmark a tempo change remapping the whole schedule
fn bench_tempo_remap(c: &mut Criterion) {
    c.bench_function("tempo_remap", |b| {
        let mut conductor = Conductor::new(120.0, 4.0);
        conductor.attach_clock(ManualClock::new(300.0));
        conductor.connect_music_container(populated_container(conductor.total_steps(), 3));

        let mut fast = true;
        b.iter(|| {
            let bpm = if fast { 240.0 } else { 120.0 };
            conductor.change_stats(bpm, 4.0);
            fast = !fast;
        });
    });
}

criterion_group!(
    benches,
    bench_update_slots,
    bench_add_remove_note,
    bench_tick,
    bench_tempo_remap
);
criterion_main!(benches);
