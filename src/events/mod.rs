// Events - Notifications emitted by the conductor and its music container
// Event names and payload shapes are the public contract for listeners

pub mod bus;
pub mod queue;

pub use bus::{EventBus, EventHandler, SubscriptionId};
pub use queue::{EventConsumer, EventProducer, create_event_queue};

use crate::schedule::MusicNoteCollection;
use serde::Serialize;
use std::fmt;

/// Timing fields shared by every hit event
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HitTiming {
    pub crotchet: f64,
    pub step_crotchet: f64,
    pub semibreve: f64,
    /// Decorrelated copy of the frequency bins (sample order is shuffled)
    pub frequency_data: Vec<u8>,
    pub bpm: u32,
    pub measure: u32,
    /// Clock position minus the ideal time of the fired index
    pub delay: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepHit {
    pub step: u64,
    #[serde(flatten)]
    pub timing: HitTiming,
    pub volume: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BeatHit {
    pub beat: u64,
    #[serde(flatten)]
    pub timing: HitTiming,
    pub volume: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarHit {
    pub bar: u64,
    #[serde(flatten)]
    pub timing: HitTiming,
    pub volume: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SongEnd {
    pub step: u64,
    pub beat: u64,
    pub bar: u64,
    #[serde(flatten)]
    pub timing: HitTiming,
    pub volume: Option<f32>,
}

/// A scheduled collection reached by the playhead
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoteHit {
    pub notes: MusicNoteCollection,
    pub step: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beat: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bar: Option<u64>,
    #[serde(flatten)]
    pub timing: HitTiming,
}

/// Every notification that can travel over the [`EventBus`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "detail", rename_all = "camelCase")]
pub enum ConductorEvent {
    BpmChange {
        bpm: u32,
        measure: u32,
    },
    #[serde(rename_all = "camelCase")]
    AudioConnect {
        source_ref: String,
    },
    #[serde(rename_all = "camelCase")]
    MusicContainerConnect {
        container_id: String,
    },
    StepHit(StepHit),
    BeatHit(BeatHit),
    BarHit(BarHit),
    SongEnd(SongEnd),
    StepChange,
    NoteHit(NoteHit),
    NoteBeatHit(NoteHit),
    NoteBarHit(NoteHit),
}

impl ConductorEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            ConductorEvent::BpmChange { .. } => EventKind::BpmChange,
            ConductorEvent::AudioConnect { .. } => EventKind::AudioConnect,
            ConductorEvent::MusicContainerConnect { .. } => EventKind::MusicContainerConnect,
            ConductorEvent::StepHit(_) => EventKind::StepHit,
            ConductorEvent::BeatHit(_) => EventKind::BeatHit,
            ConductorEvent::BarHit(_) => EventKind::BarHit,
            ConductorEvent::SongEnd(_) => EventKind::SongEnd,
            ConductorEvent::StepChange => EventKind::StepChange,
            ConductorEvent::NoteHit(_) => EventKind::NoteHit,
            ConductorEvent::NoteBeatHit(_) => EventKind::NoteBeatHit,
            ConductorEvent::NoteBarHit(_) => EventKind::NoteBarHit,
        }
    }

    /// Wire name of the event
    pub fn name(&self) -> &'static str {
        self.kind().as_str()
    }
}

/// Event name used for subscriptions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    BpmChange,
    AudioConnect,
    MusicContainerConnect,
    StepHit,
    BeatHit,
    BarHit,
    SongEnd,
    StepChange,
    NoteHit,
    NoteBeatHit,
    NoteBarHit,
}

impl EventKind {
    pub const ALL: [EventKind; 11] = [
        EventKind::BpmChange,
        EventKind::AudioConnect,
        EventKind::MusicContainerConnect,
        EventKind::StepHit,
        EventKind::BeatHit,
        EventKind::BarHit,
        EventKind::SongEnd,
        EventKind::StepChange,
        EventKind::NoteHit,
        EventKind::NoteBeatHit,
        EventKind::NoteBarHit,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::BpmChange => "bpmChange",
            EventKind::AudioConnect => "audioConnect",
            EventKind::MusicContainerConnect => "musicContainerConnect",
            EventKind::StepHit => "stepHit",
            EventKind::BeatHit => "beatHit",
            EventKind::BarHit => "barHit",
            EventKind::SongEnd => "songEnd",
            EventKind::StepChange => "stepChange",
            EventKind::NoteHit => "noteHit",
            EventKind::NoteBeatHit => "noteBeatHit",
            EventKind::NoteBarHit => "noteBarHit",
        }
    }

    /// Look up a kind by its wire name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
