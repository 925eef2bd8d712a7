// Tempo - Musical time representation
// Handles conversion between seconds, steps, beats, and bars

use std::fmt;

/// Beats grouped into one bar. Fixed: bar events fire on every 4th beat.
pub const BEATS_PER_BAR: u64 = 4;

/// Tempo and subdivision of the conductor
///
/// `bpm` is beats per minute, `measure` is the number of steps per beat.
/// Both are whole numbers and never below 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Tempo {
    bpm: u32,
    measure: u32,
}

impl Tempo {
    /// Creates a tempo from raw values
    /// Values below 1 are raised to 1, fractional values are rounded
    pub fn new(bpm: f64, measure: f64) -> Self {
        Self {
            bpm: Self::sanitize(bpm),
            measure: Self::sanitize(measure),
        }
    }

    fn sanitize(value: f64) -> u32 {
        if value.is_nan() || value < 1.0 {
            return 1;
        }
        value.round().min(u32::MAX as f64) as u32
    }

    /// Beats per minute
    pub fn bpm(&self) -> u32 {
        self.bpm
    }

    /// Steps per beat
    pub fn measure(&self) -> u32 {
        self.measure
    }

    /// Beats per second
    pub fn bps(&self) -> f64 {
        self.bpm as f64 / 60.0
    }

    /// Duration of one beat in seconds
    pub fn crotchet(&self) -> f64 {
        60.0 / self.bpm as f64
    }

    /// Duration of one step in seconds
    pub fn step_crotchet(&self) -> f64 {
        self.crotchet() / self.measure as f64
    }

    /// Duration of one bar (four beats) in seconds
    pub fn semibreve(&self) -> f64 {
        self.crotchet() * BEATS_PER_BAR as f64
    }

    /// Number of steps needed to cover `duration` seconds
    pub fn total_steps(&self, duration: f64) -> u64 {
        if !duration.is_finite() || duration <= 0.0 {
            return 0;
        }
        (duration * self.bps() * self.measure as f64).ceil() as u64
    }

    /// Number of beats spanned by `total_steps`
    pub fn total_beats(&self, total_steps: u64) -> u64 {
        total_steps.div_ceil(self.measure as u64)
    }

    /// Step index containing the given position (negative positions map to 0)
    pub fn step_at(&self, seconds: f64) -> u64 {
        let step = (seconds / self.step_crotchet()).floor();
        if step.is_nan() || step < 0.0 {
            0
        } else {
            step as u64
        }
    }

    /// Beat that contains `step`
    pub fn beat_of_step(&self, step: u64) -> u64 {
        step / self.measure as u64
    }

    /// First step of `beat`
    pub fn step_of_beat(&self, beat: u64) -> u64 {
        beat * self.measure as u64
    }

    /// First step of `bar`
    pub fn step_of_bar(&self, bar: u64) -> u64 {
        bar * self.measure as u64 * BEATS_PER_BAR
    }

    /// Ideal start time of `step` in seconds
    pub fn step_time(&self, step: u64) -> f64 {
        step as f64 * self.step_crotchet()
    }
}

impl Default for Tempo {
    fn default() -> Self {
        Self {
            bpm: 100,
            measure: 4,
        }
    }
}

impl fmt::Display for Tempo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} BPM ({} steps/beat)", self.bpm, self.measure)
    }
}
