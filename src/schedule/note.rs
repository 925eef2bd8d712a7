// Note representation for the schedule
// A note is one named event fired when the playhead reaches its step

use super::snapshot::NoteSnapshot;
use super::{Link, random_id};
use serde_json::Value;

/// Default note name
pub const DEFAULT_NOTE_NAME: &str = "beat";

/// One named event inside a collection
#[derive(Debug, Clone, PartialEq)]
pub struct MusicNote {
    /// Unique identifier for this note
    pub id: String,

    /// Step of the owning collection
    pub step: u64,

    /// Note name, unique within its collection
    pub note: String,

    /// Opaque recipient identifiers
    pub targets: Vec<String>,

    /// Weight of the event (0 for a default note)
    pub intensity: f64,

    /// Free-form payload handed to listeners
    pub detail: Value,

    /// Optional link to another note. Set by callers, never maintained by the container
    pub next: Option<Link>,
}

impl MusicNote {
    /// Creates a note with default fields and the given name
    pub fn new(note: impl Into<String>) -> Self {
        Self {
            note: note.into(),
            ..Self::default()
        }
    }

    /// Creates the note produced when only a name is given for a step:
    /// it inherits the step and targets and has intensity 1
    pub fn named(note: impl Into<String>, step: u64, targets: Vec<String>) -> Self {
        Self {
            note: note.into(),
            step,
            targets,
            intensity: 1.0,
            ..Self::default()
        }
    }

    pub fn with_targets(mut self, targets: Vec<String>) -> Self {
        self.targets = targets;
        self
    }

    pub fn with_intensity(mut self, intensity: f64) -> Self {
        self.intensity = intensity;
        self
    }

    pub fn with_detail(mut self, detail: Value) -> Self {
        self.detail = detail;
        self
    }

    /// Point this note at `other`
    pub fn link_to(&mut self, other: &MusicNote) {
        self.next = Some(Link::Resolved {
            id: other.id.clone(),
            step: other.step,
        });
    }

    /// Rebuild a note from its snapshot (or from a partial description)
    ///
    /// Missing fields take their defaults; `next` stays unresolved.
    pub fn from_snapshot(snapshot: &NoteSnapshot) -> Self {
        let defaults = Self::default();
        Self {
            id: snapshot.id.clone().unwrap_or(defaults.id),
            step: snapshot.step.unwrap_or(defaults.step),
            note: snapshot.note.clone().unwrap_or(defaults.note),
            targets: snapshot.targets.clone(),
            intensity: snapshot.intensity.unwrap_or(defaults.intensity),
            detail: snapshot.detail.clone(),
            next: snapshot.next.clone().map(Link::Unresolved),
        }
    }

    /// Plain snapshot with `next` flattened to an id
    pub fn as_json(&self) -> NoteSnapshot {
        NoteSnapshot {
            id: Some(self.id.clone()),
            step: Some(self.step),
            note: Some(self.note.clone()),
            targets: self.targets.clone(),
            next: self.next.as_ref().map(|link| link.id().to_string()),
            intensity: Some(self.intensity),
            detail: self.detail.clone(),
        }
    }
}

impl Default for MusicNote {
    fn default() -> Self {
        Self {
            id: random_id("MNote-", ""),
            step: 0,
            note: DEFAULT_NOTE_NAME.to_string(),
            targets: Vec::new(),
            intensity: 0.0,
            detail: Value::Object(Default::default()),
            next: None,
        }
    }
}

impl serde::Serialize for MusicNote {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serde::Serialize::serialize(&self.as_json(), serializer)
    }
}

impl std::fmt::Display for MusicNote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let json = serde_json::to_string(&self.as_json()).map_err(|_| std::fmt::Error)?;
        f.write_str(&json)
    }
}

/// The accepted ways of describing a note to add
#[derive(Debug, Clone)]
pub enum NoteInput {
    /// Bare name: inherits step and targets from the collection
    Name(String),
    /// Fully built note
    Note(MusicNote),
    /// Partial description
    Description(NoteSnapshot),
}

impl NoteInput {
    /// Build the note this input describes, for a collection at `step`
    /// Returns `None` when no usable name can be derived
    pub(crate) fn resolve(self, step: u64, targets: &[String]) -> Option<MusicNote> {
        let mut note = match self {
            NoteInput::Name(name) => MusicNote::named(name, step, targets.to_vec()),
            NoteInput::Note(note) => note,
            NoteInput::Description(description) => MusicNote::from_snapshot(&description),
        };
        if note.note.is_empty() {
            return None;
        }
        note.step = step;
        Some(note)
    }
}

impl From<&str> for NoteInput {
    fn from(name: &str) -> Self {
        NoteInput::Name(name.to_string())
    }
}

impl From<String> for NoteInput {
    fn from(name: String) -> Self {
        NoteInput::Name(name)
    }
}

impl From<MusicNote> for NoteInput {
    fn from(note: MusicNote) -> Self {
        NoteInput::Note(note)
    }
}

impl From<NoteSnapshot> for NoteInput {
    fn from(description: NoteSnapshot) -> Self {
        NoteInput::Description(description)
    }
}
