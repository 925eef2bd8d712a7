// Clock module - Playback collaborators consumed by the conductor
// The conductor never talks to an audio device directly, only to these traits

pub mod gain;
pub mod manual;
pub mod spectrum;

pub use gain::SharedGain;
pub use manual::{ManualClock, SharedClockState};
pub use spectrum::FixedSpectrum;

/// Latency figures used to correct the raw playback position
///
/// `process_time - output_time` is the audio still sitting in the output
/// buffer; `base_latency` is the fixed latency of the output device.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OutputLatency {
    pub process_time: f64,
    pub output_time: f64,
    pub base_latency: f64,
}

impl OutputLatency {
    /// Correction to add to a raw position to get the audible position
    pub fn correction(&self) -> f64 {
        (self.process_time - self.output_time) - self.base_latency
    }
}

/// Change notifications raised by a clock between two ticks
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClockNotification {
    DurationChanged(f64),
    Seeked(f64),
    Played,
    Paused,
}

/// Playback source driving the conductor
pub trait ClockSource {
    /// Current playback position in seconds
    fn current_time(&self) -> f64;

    /// Track duration in seconds, `None` while still unknown
    fn duration(&self) -> Option<f64>;

    /// Whether the transport is running
    fn is_playing(&self) -> bool;

    fn play(&mut self);

    fn pause(&mut self);

    /// Move the playhead to `seconds`
    fn seek(&mut self, seconds: f64);

    /// Output latency figures for position correction
    fn latency(&self) -> OutputLatency {
        OutputLatency::default()
    }

    /// Identifier of the underlying media (reported in `audioConnect`)
    fn source_ref(&self) -> String;

    /// Drain notifications raised since the last call
    fn take_notifications(&mut self) -> Vec<ClockNotification> {
        Vec::new()
    }
}

/// Frequency analysis of the playing signal
pub trait FrequencyProvider {
    /// Magnitude per frequency bin
    fn bins(&mut self) -> Vec<u8>;
}

/// Output gain stage
pub trait GainControl {
    fn get(&self) -> f32;
    fn set(&mut self, value: f32);
}
