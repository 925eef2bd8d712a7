// Offline run of a conductor over a manual clock
// Run with: cargo run --bin simulate -- [config.ron|config.json] [seconds]

use beat_conductor::{
    Conductor, ConductorConfig, ConductorEvent, FixedSpectrum, ManualClock,
    MusicContainer, SharedGain, save_schedule,
};
use ringbuf::traits::Consumer;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

const DEFAULT_TRACK_SECONDS: f64 = 8.0;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => ConductorConfig::load(&path)?,
        None => ConductorConfig::load_or_default()?,
    };
    let seconds = match args.next() {
        Some(value) => value.parse::<f64>()?,
        None => DEFAULT_TRACK_SECONDS,
    };

    println!("=== Beat Conductor simulation ===");
    println!(
        "{} BPM, {} steps per beat, {:.1}s track, {} fps",
        config.bpm, config.measure, seconds, config.frame_rate
    );

    let mut conductor = Conductor::from_config(&config);
    conductor.subscribe_all(|event| match event {
        ConductorEvent::NoteHit(hit) => log::info!(
            "noteHit step {} [{}] delay {:+.4}s",
            hit.step,
            hit.notes.note_names().join(", "),
            hit.timing.delay
        ),
        ConductorEvent::BarHit(hit) => log::info!("barHit {}", hit.bar),
        ConductorEvent::SongEnd(end) => log::info!("songEnd at step {}", end.step),
        other => log::debug!("{}", other.name()),
    });

    // Another thread drains a copy of every event, as a renderer would
    let mut queue = conductor.event_queue();
    let finished = Arc::new(AtomicBool::new(false));
    let counter = {
        let finished = Arc::clone(&finished);
        thread::spawn(move || {
            let mut counts = std::collections::BTreeMap::<&'static str, usize>::new();
            loop {
                match queue.try_pop() {
                    Some(event) => *counts.entry(event.name()).or_default() += 1,
                    None if finished.load(Ordering::Acquire) => return counts,
                    None => thread::sleep(Duration::from_millis(1)),
                }
            }
        })
    };

    let clock = ManualClock::new(seconds).with_source_ref("simulate://click-track");
    let playhead = clock.shared_state();
    conductor.attach_clock(clock);
    conductor.set_gain_control(SharedGain::new(0.8));
    conductor.set_frequency_provider(FixedSpectrum::new((0..32).map(|i| i * 8).collect()));

    let container = build_pattern(&conductor);
    conductor.connect_music_container(container);

    let interval = config.frame_interval();
    conductor.play_from_step(0);
    while conductor.is_playing() {
        let at_end = playhead.position() >= seconds;
        playhead.advance_position(interval);
        conductor.advance(interval);

        // The last step can end short of the final step boundary
        if at_end && conductor.is_playing() {
            log::info!("Track finished at step {}", conductor.curr_step());
            conductor.stop();
        }
    }
    finished.store(true, Ordering::Release);

    let counts = counter
        .join()
        .map_err(|_| "event counter thread panicked")?;
    println!("\nEvents received:");
    for (name, count) in &counts {
        println!("   - {}: {}", name, count);
    }
    println!("Dropped events: {}", conductor.events().dropped_events());

    if let Some(container) = conductor.container() {
        let path = std::env::temp_dir().join("beat_conductor_schedule.json");
        save_schedule(&path, container)?;
        println!("Schedule saved to {}", path.display());
    }

    Ok(())
}

/// Kick on every beat, snare on the backbeat, hats on the off-steps
fn build_pattern(conductor: &Conductor) -> MusicContainer {
    let measure = conductor.measure() as u64;
    let mut container = MusicContainer::new(conductor.total_steps());

    for step in 0..conductor.total_steps() {
        if step % measure == 0 {
            container.add_note(step, "kick");
            if (step / measure) % 2 == 1 {
                container.add_note(step, "snare");
            }
        } else if step % 2 == 0 {
            container.add_note(step, "hat");
        }
    }
    log::debug!("Pattern fills {} of {} steps", container.len(), container.total_steps());
    container
}
