// Conductor - Tempo-driven scheduler polling a playback clock
// Converts clock position into step/beat/bar indices and fires each new index once

pub mod frequency;

pub use frequency::Decorrelator;

use crate::clock::{ClockNotification, ClockSource, FrequencyProvider, GainControl};
use crate::config::ConductorConfig;
use crate::events::{
    BarHit, BeatHit, ConductorEvent, EventBus, EventConsumer, EventKind, HitTiming, SongEnd,
    StepHit, SubscriptionId,
};
use crate::schedule::{MusicContainer, TimingContext};
use crate::tempo::{BEATS_PER_BAR, Tempo};

/// Default event queue capacity
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Tempo-driven scheduler
///
/// Call [`Conductor::advance`] once per frame. Each call reads the attached
/// clock, recomputes the current step and fires `stepHit`/`beatHit`/`barHit`
/// for indices that advanced since the last report. Without a clock every
/// time-driven operation is a no-op.
pub struct Conductor {
    name: String,
    tempo: Tempo,

    clock: Option<Box<dyn ClockSource>>,
    analyser: Option<Box<dyn FrequencyProvider>>,
    gain: Option<Box<dyn GainControl>>,
    container: Option<MusicContainer>,

    bus: EventBus,
    decorrelator: Decorrelator,
    queue_capacity: usize,

    curr_step: u64,
    /// Last reported step, `None` until a step fires after a reset
    last_step: Option<u64>,
    curr_beat: u64,
    last_beat: Option<u64>,

    total_steps: u64,
    total_beats: u64,

    time_elapsed: f64,
    song_pos: f64,
    song_length: Option<f64>,
}

impl Conductor {
    /// Create a conductor with the given tempo (clamped to at least 1)
    pub fn new(bpm: f64, measure: f64) -> Self {
        let mut conductor = Self {
            name: crate::schedule::random_id("[Conductor:", "]"),
            tempo: Tempo::default(),
            clock: None,
            analyser: None,
            gain: None,
            container: None,
            bus: EventBus::new(),
            decorrelator: Decorrelator::default(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            curr_step: 1,
            last_step: None,
            curr_beat: 1,
            last_beat: None,
            total_steps: 0,
            total_beats: 0,
            time_elapsed: 0.0,
            song_pos: 0.0,
            song_length: None,
        };
        conductor.change_stats(bpm, measure);
        conductor
    }

    pub fn from_config(config: &ConductorConfig) -> Self {
        let mut conductor = Self::new(config.bpm as f64, config.measure as f64);
        conductor.decorrelator = Decorrelator::new(config.shuffle_seed);
        conductor.queue_capacity = config.event_queue_capacity.max(1);
        conductor
    }

    /// Seed the frequency snapshot shuffle
    pub fn with_shuffle_seed(mut self, seed: u64) -> Self {
        self.decorrelator = Decorrelator::new(Some(seed));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    // ============ Tempo ============

    /// Change tempo and subdivision
    ///
    /// Both values are clamped to at least 1 and rounded. Totals are
    /// re-derived from the clock duration and the step and beat counters are
    /// reset, then `bpmChange` is dispatched so a connected container remaps
    /// its steps.
    pub fn change_stats(&mut self, bpm: f64, measure: f64) {
        self.tempo = Tempo::new(bpm, measure);
        self.refresh_totals();
        // Counters from the old tempo would suppress hits until the playhead
        // caught up with them
        self.reset_beat();
        log::info!("{}: tempo set to {}", self.name, self.tempo);
        self.dispatch(ConductorEvent::BpmChange {
            bpm: self.tempo.bpm(),
            measure: self.tempo.measure(),
        });
    }

    pub fn tempo(&self) -> Tempo {
        self.tempo
    }

    pub fn bpm(&self) -> u32 {
        self.tempo.bpm()
    }

    pub fn measure(&self) -> u32 {
        self.tempo.measure()
    }

    pub fn bps(&self) -> f64 {
        self.tempo.bps()
    }

    pub fn crotchet(&self) -> f64 {
        self.tempo.crotchet()
    }

    pub fn step_crotchet(&self) -> f64 {
        self.tempo.step_crotchet()
    }

    pub fn semibreve(&self) -> f64 {
        self.tempo.semibreve()
    }

    fn refresh_totals(&mut self) {
        self.song_length = self.clock.as_ref().and_then(|clock| clock.duration());
        self.total_steps = self
            .song_length
            .map_or(0, |duration| self.tempo.total_steps(duration));
        self.total_beats = self.tempo.total_beats(self.total_steps);

        if let Some(container) = self.container.as_mut() {
            container.set_timing(TimingContext::new(self.total_steps, self.tempo));
        }
    }

    // ============ Collaborators ============

    /// Bind a playback clock, replacing any previous one
    ///
    /// Totals are recomputed from the new clock's duration and the counters
    /// are reset.
    pub fn attach_clock<C>(&mut self, clock: C)
    where
        C: ClockSource + 'static,
    {
        let mut clock: Box<dyn ClockSource> = Box::new(clock);
        // Notifications raised before attachment are not ours to handle
        clock.take_notifications();
        let source_ref = clock.source_ref();

        self.clock = Some(clock);
        self.reset_conductor();
        self.refresh_totals();

        log::info!(
            "{}: clock {} attached ({} steps, {} beats)",
            self.name,
            source_ref,
            self.total_steps,
            self.total_beats
        );
        self.dispatch(ConductorEvent::AudioConnect { source_ref });
    }

    /// Release the clock. Time-driven operations become no-ops
    pub fn detach_clock(&mut self) -> Option<Box<dyn ClockSource>> {
        let clock = self.clock.take();
        self.refresh_totals();
        clock
    }

    pub fn set_frequency_provider<F>(&mut self, provider: F)
    where
        F: FrequencyProvider + 'static,
    {
        self.analyser = Some(Box::new(provider));
    }

    pub fn set_gain_control<G>(&mut self, gain: G)
    where
        G: GainControl + 'static,
    {
        self.gain = Some(Box::new(gain));
    }

    pub fn audio_is_connected(&self) -> bool {
        self.clock.is_some()
    }

    // ============ Music container ============

    /// Take ownership of `container` and route hit events to it
    ///
    /// Returns the previously connected container, if any.
    pub fn connect_music_container(
        &mut self,
        mut container: MusicContainer,
    ) -> Option<MusicContainer> {
        container.set_timing(TimingContext::new(self.total_steps, self.tempo));
        let container_id = container.name().to_string();
        let previous = self.container.replace(container);

        log::info!("{}: music container {} connected", self.name, container_id);
        self.dispatch(ConductorEvent::MusicContainerConnect { container_id });
        previous
    }

    pub fn disconnect_music_container(&mut self) -> Option<MusicContainer> {
        let container = self.container.take();
        if let Some(container) = &container {
            log::debug!("{}: music container {} disconnected", self.name, container.name());
        }
        container
    }

    pub fn container(&self) -> Option<&MusicContainer> {
        self.container.as_ref()
    }

    /// Mutable access for schedule edits between ticks
    pub fn container_mut(&mut self) -> Option<&mut MusicContainer> {
        self.container.as_mut()
    }

    // ============ Events ============

    pub fn events(&self) -> &EventBus {
        &self.bus
    }

    pub fn events_mut(&mut self) -> &mut EventBus {
        &mut self.bus
    }

    pub fn subscribe<F>(&mut self, kind: EventKind, handler: F) -> SubscriptionId
    where
        F: FnMut(&ConductorEvent) + 'static,
    {
        self.bus.subscribe(kind, handler)
    }

    pub fn subscribe_all<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: FnMut(&ConductorEvent) + 'static,
    {
        self.bus.subscribe_all(handler)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    /// Open a queue receiving every event, for draining on another thread
    pub fn event_queue(&mut self) -> EventConsumer {
        self.bus.queue(self.queue_capacity)
    }

    /// Emit to listeners, then let the container answer with a note event
    fn dispatch(&mut self, event: ConductorEvent) {
        self.bus.emit(&event);
        let note_event = self
            .container
            .as_mut()
            .and_then(|container| container.handle_event(&event));
        if let Some(note_event) = note_event {
            self.bus.emit(&note_event);
        }
    }

    // ============ Tick ============

    /// Advance by `delta` seconds of wall-clock time
    pub fn advance(&mut self, delta: f64) {
        let notifications = match self.clock.as_mut() {
            Some(clock) => clock.take_notifications(),
            None => return,
        };

        self.time_elapsed += delta;
        for notification in notifications {
            self.on_clock_notification(notification);
        }

        let Some(clock) = self.clock.as_ref() else {
            return;
        };
        self.song_pos = clock.current_time();
        if clock.is_playing() {
            self.song_pos += clock.latency().correction();
            self.curr_step = self.tempo.step_at(self.song_pos);
            self.process_step();
        }
    }

    fn on_clock_notification(&mut self, notification: ClockNotification) {
        match notification {
            ClockNotification::DurationChanged(duration) => {
                log::debug!("{}: clock duration changed to {:.3}s", self.name, duration);
                self.refresh_totals();
                self.reset_conductor();
            }
            ClockNotification::Seeked(position) => {
                log::debug!("{}: clock seeked to {:.3}s", self.name, position);
            }
            ClockNotification::Played => log::debug!("{}: clock playing", self.name),
            ClockNotification::Paused => log::debug!("{}: clock paused", self.name),
        }
    }

    fn process_step(&mut self) {
        if self.song_length.is_some() && self.curr_step >= self.total_steps {
            if self.is_playing() {
                let event = ConductorEvent::SongEnd(self.song_end());
                self.stop();
                log::info!("{}: song ended", self.name);
                self.dispatch(event);
            }
            return;
        }

        let step = self.curr_step;
        if self.last_step.is_none_or(|last| step > last) {
            let event = ConductorEvent::StepHit(self.step_hit());
            self.curr_beat = self.tempo.beat_of_step(step);
            self.last_step = Some(step);
            self.dispatch(event);
        }

        let beat = self.curr_beat;
        if self.last_beat.is_none_or(|last| beat > last) {
            self.last_beat = Some(beat);
            let event = ConductorEvent::BeatHit(self.beat_hit());
            self.dispatch(event);
            if beat % BEATS_PER_BAR == 0 {
                let event = ConductorEvent::BarHit(self.bar_hit());
                self.dispatch(event);
            }
        }
    }

    // ============ Event payloads ============

    fn hit_timing(&mut self, ideal_time: f64) -> HitTiming {
        HitTiming {
            crotchet: self.tempo.crotchet(),
            step_crotchet: self.tempo.step_crotchet(),
            semibreve: self.tempo.semibreve(),
            frequency_data: self.decorrelated_frequency_snapshot(),
            bpm: self.tempo.bpm(),
            measure: self.tempo.measure(),
            delay: self.clock_time() - ideal_time,
        }
    }

    fn step_hit(&mut self) -> StepHit {
        let ideal = self.tempo.step_time(self.curr_step);
        StepHit {
            step: self.curr_step,
            timing: self.hit_timing(ideal),
            volume: self.get_volume(),
        }
    }

    fn beat_hit(&mut self) -> BeatHit {
        let ideal = self.tempo.step_time(self.tempo.step_of_beat(self.curr_beat));
        BeatHit {
            beat: self.curr_beat,
            timing: self.hit_timing(ideal),
            volume: self.get_volume(),
        }
    }

    fn bar_hit(&mut self) -> BarHit {
        let bar = self.curr_bar();
        let ideal = self.tempo.step_time(self.tempo.step_of_bar(bar));
        BarHit {
            bar,
            timing: self.hit_timing(ideal),
            volume: self.get_volume(),
        }
    }

    fn song_end(&mut self) -> SongEnd {
        let ideal = self.tempo.step_time(self.curr_step);
        SongEnd {
            step: self.curr_step,
            beat: self.curr_beat,
            bar: self.curr_bar(),
            timing: self.hit_timing(ideal),
            volume: self.get_volume(),
        }
    }

    // ============ Transport ============

    /// Jump to `step` (negative values clamp to 0)
    ///
    /// Seeks the clock, forgets the last reported indices so the next tick
    /// fires again, and emits `stepChange`.
    pub fn set_step(&mut self, step: i64) {
        let step = step.max(0) as u64;
        let position = self.tempo.step_time(step);
        if let Some(clock) = self.clock.as_mut() {
            clock.seek(position);
        }
        self.curr_step = step;
        self.curr_beat = self.tempo.beat_of_step(step);
        self.reset_beat();

        log::debug!("{}: step set to {} ({:.3}s)", self.name, step, position);
        self.dispatch(ConductorEvent::StepChange);
    }

    pub fn set_beat(&mut self, beat: i64) {
        self.set_step(beat.saturating_mul(self.tempo.measure() as i64));
    }

    /// Start the clock if needed, then jump to `step`
    pub fn play_from_step(&mut self, step: i64) {
        let Some(clock) = self.clock.as_mut() else {
            return;
        };
        if !clock.is_playing() {
            clock.play();
        }
        self.set_step(step);
    }

    pub fn play_from_beat(&mut self, beat: i64) {
        self.play_from_step(beat.saturating_mul(self.tempo.measure() as i64));
    }

    /// Resume from the current step
    pub fn play_on(&mut self) {
        self.play_from_step(self.curr_step.min(i64::MAX as u64) as i64);
    }

    pub fn pause(&mut self) {
        if let Some(clock) = self.clock.as_mut() {
            if clock.is_playing() {
                clock.pause();
                log::debug!("{}: paused at step {}", self.name, self.curr_step);
            }
        }
    }

    /// Seek to 0, pause and reset every counter
    pub fn stop(&mut self) {
        if let Some(clock) = self.clock.as_mut() {
            clock.seek(0.0);
        }
        self.pause();
        self.reset_conductor();
        log::debug!("{}: stopped", self.name);
    }

    /// Counters after a stop: the next playing tick always reports a step
    pub fn reset_conductor(&mut self) {
        self.curr_step = 1;
        self.last_step = None;
        self.curr_beat = 1;
        self.last_beat = None;
        self.time_elapsed = 0.0;
        self.song_pos = 0.0;
    }

    /// Forget the last reported indices
    pub fn reset_beat(&mut self) {
        self.last_step = None;
        self.last_beat = None;
    }

    pub fn is_playing(&self) -> bool {
        self.clock.as_ref().is_some_and(|clock| clock.is_playing())
    }

    // ============ Volume ============

    pub fn mute(&mut self) {
        if let Some(gain) = self.gain.as_mut() {
            gain.set(0.0);
        }
    }

    pub fn unmute(&mut self) {
        if let Some(gain) = self.gain.as_mut() {
            gain.set(1.0);
        }
    }

    /// Set the gain. Negative and NaN values are ignored
    pub fn set_volume(&mut self, volume: f32) {
        if volume.is_nan() || volume < 0.0 {
            return;
        }
        if let Some(gain) = self.gain.as_mut() {
            gain.set(volume);
        }
    }

    /// Current gain, `None` without a gain control
    pub fn get_volume(&self) -> Option<f32> {
        self.gain.as_ref().map(|gain| gain.get())
    }

    pub fn is_muted(&self) -> bool {
        self.get_volume().is_some_and(|volume| volume <= 0.0)
    }

    // ============ Readouts ============

    /// Raw frequency bins, empty without a provider
    pub fn frequency_data(&mut self) -> Vec<u8> {
        self.analyser
            .as_mut()
            .map(|analyser| analyser.bins())
            .unwrap_or_default()
    }

    /// Frequency bins in shuffled order, as attached to hit events
    pub fn decorrelated_frequency_snapshot(&mut self) -> Vec<u8> {
        let bins = self.frequency_data();
        self.decorrelator.decorrelate(&bins)
    }

    fn clock_time(&self) -> f64 {
        self.clock.as_ref().map_or(0.0, |clock| clock.current_time())
    }

    /// Clock position minus the ideal start of the current step
    pub fn step_delay(&self) -> f64 {
        self.clock_time() - self.tempo.step_time(self.curr_step)
    }

    pub fn curr_step(&self) -> u64 {
        self.curr_step
    }

    pub fn last_step(&self) -> Option<u64> {
        self.last_step
    }

    pub fn curr_beat(&self) -> u64 {
        self.curr_beat
    }

    pub fn last_beat(&self) -> Option<u64> {
        self.last_beat
    }

    pub fn curr_bar(&self) -> u64 {
        self.curr_beat / BEATS_PER_BAR
    }

    pub fn total_steps(&self) -> u64 {
        self.total_steps
    }

    pub fn total_beats(&self) -> u64 {
        self.total_beats
    }

    /// Latency-corrected position read on the last tick
    pub fn song_pos(&self) -> f64 {
        self.song_pos
    }

    pub fn time_elapsed(&self) -> f64 {
        self.time_elapsed
    }

    /// Clock duration, `None` while unknown or without a clock
    pub fn song_length(&self) -> Option<f64> {
        self.song_length
    }
}

impl Default for Conductor {
    fn default() -> Self {
        Self::new(100.0, 4.0)
    }
}
