// Note collection - Everything scheduled on one step

use super::note::{MusicNote, NoteInput};
use super::snapshot::CollectionSnapshot;
use super::{Link, random_id};
use std::collections::BTreeMap;

/// The notes that fire together on one step
#[derive(Debug, Clone, PartialEq)]
pub struct MusicNoteCollection {
    /// Unique identifier
    pub id: String,

    /// Step index in the schedule
    pub step: u64,

    /// Offset in seconds between the last hit and the ideal step boundary
    pub delay: f64,

    /// Opaque recipient identifiers, inherited by notes added by name
    pub targets: Vec<String>,

    /// Nearest collection with a greater step (maintained by the container)
    pub next: Option<Link>,

    /// Notes keyed by name
    notes: BTreeMap<String, MusicNote>,
}

impl MusicNoteCollection {
    /// Create an empty collection at `step`
    pub fn new(step: u64) -> Self {
        Self {
            id: random_id("MNoteCollection-", ""),
            step,
            delay: 0.0,
            targets: Vec::new(),
            next: None,
            notes: BTreeMap::new(),
        }
    }

    pub fn with_targets(mut self, targets: Vec<String>) -> Self {
        self.targets = targets;
        self
    }

    /// Rebuild a collection from its snapshot (or from a partial description)
    ///
    /// `next` links stay unresolved until a container rehydrates them.
    pub fn from_snapshot(snapshot: &CollectionSnapshot) -> Self {
        let mut collection = Self::new(snapshot.step.unwrap_or(0));
        if let Some(id) = &snapshot.id {
            collection.id = id.clone();
        }
        collection.delay = snapshot.delay;
        collection.targets = snapshot.targets.clone();
        collection.next = snapshot.next.clone().map(Link::Unresolved);

        for (name, description) in &snapshot.notes {
            let mut note = MusicNote::from_snapshot(description);
            if description.note.is_none() {
                note.note = name.clone();
            }
            collection.add_note(note);
        }
        collection
    }

    /// Add a note, replacing any note with the same name
    ///
    /// The note is moved to this collection's step. Returns false if the
    /// input does not resolve to a named note.
    pub fn add_note(&mut self, note: impl Into<NoteInput>) -> bool {
        match note.into().resolve(self.step, &self.targets) {
            Some(note) => {
                self.notes.insert(note.note.clone(), note);
                true
            }
            None => false,
        }
    }

    /// Remove the note called `name`. Returns false if there was none
    pub fn remove_note(&mut self, name: &str) -> bool {
        self.notes.remove(name).is_some()
    }

    pub fn get_note(&self, name: &str) -> Option<&MusicNote> {
        self.notes.get(name)
    }

    pub fn get_note_mut(&mut self, name: &str) -> Option<&mut MusicNote> {
        self.notes.get_mut(name)
    }

    /// Notes in name order
    pub fn notes(&self) -> impl Iterator<Item = &MusicNote> {
        self.notes.values()
    }

    pub(crate) fn notes_mut(&mut self) -> impl Iterator<Item = &mut MusicNote> {
        self.notes.values_mut()
    }

    pub fn note_names(&self) -> Vec<&str> {
        self.notes.keys().map(String::as_str).collect()
    }

    pub fn note_count(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Move the collection and all its notes to `step`
    pub(crate) fn set_step(&mut self, step: u64) {
        self.step = step;
        for note in self.notes.values_mut() {
            note.step = step;
        }
    }

    /// Plain snapshot with links flattened to ids
    pub fn as_json(&self) -> CollectionSnapshot {
        CollectionSnapshot {
            id: Some(self.id.clone()),
            step: Some(self.step),
            delay: self.delay,
            targets: self.targets.clone(),
            next: self.next.as_ref().map(|link| link.id().to_string()),
            notes: self
                .notes
                .iter()
                .map(|(name, note)| (name.clone(), note.as_json()))
                .collect(),
        }
    }
}

impl serde::Serialize for MusicNoteCollection {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serde::Serialize::serialize(&self.as_json(), serializer)
    }
}

impl std::fmt::Display for MusicNoteCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let json = serde_json::to_string(&self.as_json()).map_err(|_| std::fmt::Error)?;
        f.write_str(&json)
    }
}

/// The accepted ways of describing a slot to add
#[derive(Debug, Clone)]
pub enum SlotInput {
    /// Existing collection, inserted as-is
    Collection(MusicNoteCollection),
    /// Partial description
    Description(CollectionSnapshot),
    /// Bare step index: an empty collection is created there
    Step(u64),
}

impl SlotInput {
    /// Step this input would occupy, if it names one
    pub fn step(&self) -> Option<u64> {
        match self {
            SlotInput::Collection(collection) => Some(collection.step),
            SlotInput::Description(description) => description.step,
            SlotInput::Step(step) => Some(*step),
        }
    }

    pub(crate) fn into_collection(self) -> MusicNoteCollection {
        match self {
            SlotInput::Collection(collection) => collection,
            SlotInput::Description(description) => MusicNoteCollection::from_snapshot(&description),
            SlotInput::Step(step) => MusicNoteCollection::new(step),
        }
    }
}

impl From<MusicNoteCollection> for SlotInput {
    fn from(collection: MusicNoteCollection) -> Self {
        SlotInput::Collection(collection)
    }
}

impl From<CollectionSnapshot> for SlotInput {
    fn from(description: CollectionSnapshot) -> Self {
        SlotInput::Description(description)
    }
}

impl From<u64> for SlotInput {
    fn from(step: u64) -> Self {
        SlotInput::Step(step)
    }
}

/// The accepted ways of naming a slot to remove
#[derive(Debug, Clone, Copy)]
pub enum SlotRef<'a> {
    Collection(&'a MusicNoteCollection),
    Id(&'a str),
    Step(u64),
}

impl<'a> From<&'a MusicNoteCollection> for SlotRef<'a> {
    fn from(collection: &'a MusicNoteCollection) -> Self {
        SlotRef::Collection(collection)
    }
}

impl<'a> From<&'a str> for SlotRef<'a> {
    fn from(id: &'a str) -> Self {
        SlotRef::Id(id)
    }
}

impl From<u64> for SlotRef<'_> {
    fn from(step: u64) -> Self {
        SlotRef::Step(step)
    }
}
