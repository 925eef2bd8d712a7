// Beat Conductor - Library exports for the binary, tests and benchmarks

pub mod clock;
pub mod conductor;
pub mod config;
pub mod events;
pub mod schedule;
pub mod tempo;

// Re-export commonly used types for convenience
pub use clock::{
    ClockNotification, ClockSource, FixedSpectrum, FrequencyProvider, GainControl, ManualClock,
    OutputLatency, SharedClockState, SharedGain,
};
pub use conductor::Conductor;
pub use config::{ConductorConfig, ConfigError};
pub use events::{ConductorEvent, EventBus, EventKind, HitTiming, NoteHit};
pub use schedule::{
    Link, MusicContainer, MusicNote, MusicNoteCollection, NoteInput, ScheduleError, SlotInput,
    SlotRef, TimingContext, load_schedule, save_schedule,
};
pub use tempo::Tempo;
