// Manual clock - Software playback source
// Position is pushed by the caller instead of being read from an audio device

use super::{ClockNotification, ClockSource, OutputLatency};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Shared clock state
/// Atomics so a driver can move the playhead while the conductor owns the clock
#[derive(Debug)]
pub struct SharedClockState {
    playing: AtomicBool,
    position_bits: AtomicU64,
    duration_bits: AtomicU64,
    duration_known: AtomicBool,
    process_time_bits: AtomicU64,
    output_time_bits: AtomicU64,
    base_latency_bits: AtomicU64,
    notifications: Mutex<Vec<ClockNotification>>,
}

impl SharedClockState {
    fn new(duration: Option<f64>) -> Arc<Self> {
        Arc::new(Self {
            playing: AtomicBool::new(false),
            position_bits: AtomicU64::new(0.0f64.to_bits()),
            duration_bits: AtomicU64::new(duration.unwrap_or(0.0).to_bits()),
            duration_known: AtomicBool::new(duration.is_some()),
            process_time_bits: AtomicU64::new(0.0f64.to_bits()),
            output_time_bits: AtomicU64::new(0.0f64.to_bits()),
            base_latency_bits: AtomicU64::new(0.0f64.to_bits()),
            notifications: Mutex::new(Vec::new()),
        })
    }

    fn load(bits: &AtomicU64) -> f64 {
        f64::from_bits(bits.load(Ordering::Relaxed))
    }

    fn store(bits: &AtomicU64, value: f64) {
        bits.store(value.to_bits(), Ordering::Relaxed);
    }

    fn notify(&self, notification: ClockNotification) {
        if let Ok(mut pending) = self.notifications.lock() {
            pending.push(notification);
        }
    }

    /// Current position in seconds
    pub fn position(&self) -> f64 {
        Self::load(&self.position_bits)
    }

    /// Set position without raising a seek notification
    pub fn set_position(&self, seconds: f64) {
        Self::store(&self.position_bits, seconds.max(0.0));
    }

    /// Advance position by `delta` seconds while playing
    /// Returns the new position
    pub fn advance_position(&self, delta: f64) -> f64 {
        let current = self.position();
        if !self.is_playing() {
            return current;
        }

        let mut new_pos = current + delta.max(0.0);
        if let Some(duration) = self.duration() {
            new_pos = new_pos.min(duration);
        }
        self.set_position(new_pos);
        new_pos
    }

    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::Relaxed)
    }

    pub fn duration(&self) -> Option<f64> {
        self.duration_known
            .load(Ordering::Relaxed)
            .then(|| Self::load(&self.duration_bits))
    }

    /// Replace the duration (for instance once metadata has loaded)
    pub fn set_duration(&self, seconds: f64) {
        Self::store(&self.duration_bits, seconds);
        self.duration_known.store(true, Ordering::Relaxed);
        self.notify(ClockNotification::DurationChanged(seconds));
    }

    /// Set output latency figures
    pub fn set_latency(&self, latency: OutputLatency) {
        Self::store(&self.process_time_bits, latency.process_time);
        Self::store(&self.output_time_bits, latency.output_time);
        Self::store(&self.base_latency_bits, latency.base_latency);
    }

    pub fn latency(&self) -> OutputLatency {
        OutputLatency {
            process_time: Self::load(&self.process_time_bits),
            output_time: Self::load(&self.output_time_bits),
            base_latency: Self::load(&self.base_latency_bits),
        }
    }
}

/// Clock whose playhead is driven explicitly
///
/// Use [`ManualClock::shared_state`] to keep a handle on the playhead after
/// handing the clock to a conductor.
pub struct ManualClock {
    shared_state: Arc<SharedClockState>,
    source_ref: String,
}

impl ManualClock {
    /// Create a clock for a track of known duration
    pub fn new(duration: f64) -> Self {
        Self::with_state(SharedClockState::new(Some(duration)))
    }

    /// Create a clock whose duration is not known yet
    pub fn unknown_duration() -> Self {
        Self::with_state(SharedClockState::new(None))
    }

    fn with_state(shared_state: Arc<SharedClockState>) -> Self {
        Self {
            shared_state,
            source_ref: format!("manual://{}", uuid::Uuid::new_v4().simple()),
        }
    }

    /// Replace the reported source identifier
    pub fn with_source_ref(mut self, source_ref: impl Into<String>) -> Self {
        self.source_ref = source_ref.into();
        self
    }

    /// Get shared state (for the driver side)
    pub fn shared_state(&self) -> Arc<SharedClockState> {
        Arc::clone(&self.shared_state)
    }
}

impl ClockSource for ManualClock {
    fn current_time(&self) -> f64 {
        self.shared_state.position()
    }

    fn duration(&self) -> Option<f64> {
        self.shared_state.duration()
    }

    fn is_playing(&self) -> bool {
        self.shared_state.is_playing()
    }

    fn play(&mut self) {
        if !self.shared_state.playing.swap(true, Ordering::Relaxed) {
            self.shared_state.notify(ClockNotification::Played);
        }
    }

    fn pause(&mut self) {
        if self.shared_state.playing.swap(false, Ordering::Relaxed) {
            self.shared_state.notify(ClockNotification::Paused);
        }
    }

    fn seek(&mut self, seconds: f64) {
        self.shared_state.set_position(seconds);
        self.shared_state
            .notify(ClockNotification::Seeked(self.shared_state.position()));
    }

    fn latency(&self) -> OutputLatency {
        self.shared_state.latency()
    }

    fn source_ref(&self) -> String {
        self.source_ref.clone()
    }

    fn take_notifications(&mut self) -> Vec<ClockNotification> {
        match self.shared_state.notifications.lock() {
            Ok(mut pending) => std::mem::take(&mut *pending),
            Err(_) => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_transport() {
        let mut clock = ManualClock::new(2.0);
        assert!(!clock.is_playing());

        clock.play();
        assert!(clock.is_playing());

        clock.pause();
        assert!(!clock.is_playing());

        assert_eq!(
            clock.take_notifications(),
            vec![ClockNotification::Played, ClockNotification::Paused]
        );
        assert!(clock.take_notifications().is_empty());
    }

    #[test]
    fn test_advance_only_while_playing() {
        let mut clock = ManualClock::new(1.0);
        let state = clock.shared_state();

        assert_eq!(state.advance_position(0.25), 0.0);

        clock.play();
        assert_eq!(state.advance_position(0.25), 0.25);
        assert_eq!(clock.current_time(), 0.25);

        // Clamped to the end of the track
        assert_eq!(state.advance_position(5.0), 1.0);
    }

    #[test]
    fn test_seek_notifies() {
        let mut clock = ManualClock::new(1.0);
        clock.seek(-1.0);
        assert_eq!(clock.current_time(), 0.0);
        clock.seek(0.5);
        assert_eq!(
            clock.take_notifications(),
            vec![
                ClockNotification::Seeked(0.0),
                ClockNotification::Seeked(0.5)
            ]
        );
    }

    #[test]
    fn test_duration_becomes_known() {
        let mut clock = ManualClock::unknown_duration();
        assert_eq!(clock.duration(), None);

        clock.shared_state().set_duration(3.0);
        assert_eq!(clock.duration(), Some(3.0));
        assert_eq!(
            clock.take_notifications(),
            vec![ClockNotification::DurationChanged(3.0)]
        );
    }

    #[test]
    fn test_latency_correction() {
        let clock = ManualClock::new(1.0);
        clock.shared_state().set_latency(OutputLatency {
            process_time: 10.05,
            output_time: 10.0,
            base_latency: 0.01,
        });
        let correction = clock.latency().correction();
        assert!((correction - 0.04).abs() < 1e-9);
    }
}
