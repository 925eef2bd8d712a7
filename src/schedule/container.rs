// Music container - Step-indexed schedule of note collections
// Keyed by step (single source of truth) with an id index kept beside it

use super::collection::{MusicNoteCollection, SlotInput, SlotRef};
use super::note::{MusicNote, NoteInput};
use super::snapshot::{ContainerSnapshot, StepsInput};
use super::{Link, ScheduleError, random_id};
use crate::events::{BarHit, BeatHit, ConductorEvent, HitTiming, NoteHit, StepHit};
use crate::tempo::Tempo;
use std::collections::{BTreeMap, HashMap};

/// Timing the container receives from its conductor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingContext {
    /// Valid step indices are `0..total_steps`
    pub total_steps: u64,
    pub tempo: Tempo,
}

impl TimingContext {
    pub fn new(total_steps: u64, tempo: Tempo) -> Self {
        Self { total_steps, tempo }
    }
}

/// Sparse schedule of note collections
///
/// Collections are stored by step; `slots` maps every collection id to its
/// step. After each structural change every collection's `next` link is
/// recomputed, so it always names the nearest populated step after it.
#[derive(Debug, Clone)]
pub struct MusicContainer {
    name: String,
    context: TimingContext,
    /// Tempo the current step indices were laid out in
    layout_tempo: Option<Tempo>,
    steps: BTreeMap<u64, MusicNoteCollection>,
    slots: HashMap<String, u64>,
}

impl MusicContainer {
    /// Create an empty container accepting steps `0..total_steps`
    ///
    /// The layout tempo is adopted from the first conductor it is given to.
    pub fn new(total_steps: u64) -> Self {
        let mut container = Self::with_context(TimingContext::new(total_steps, Tempo::default()));
        container.layout_tempo = None;
        container
    }

    /// Create an empty container laid out in `context.tempo`
    pub fn with_context(context: TimingContext) -> Self {
        Self {
            name: random_id("[MusicContainer:", "]"),
            context,
            layout_tempo: Some(context.tempo),
            steps: BTreeMap::new(),
            slots: HashMap::new(),
        }
    }

    /// Create a container and bulk-load `steps`
    pub fn with_steps<I>(total_steps: u64, steps: I) -> Self
    where
        I: IntoIterator<Item = SlotInput>,
    {
        let mut container = Self::new(total_steps);
        container.set_steps(steps);
        container
    }

    /// Identifier used in `musicContainerConnect` and snapshots
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn total_steps(&self) -> u64 {
        self.context.total_steps
    }

    pub fn context(&self) -> TimingContext {
        self.context
    }

    pub fn layout_tempo(&self) -> Option<Tempo> {
        self.layout_tempo
    }

    /// Receive new timing from the conductor
    ///
    /// Only bounds and tempo are stored; step indices are remapped when the
    /// tempo-change event arrives.
    pub fn set_timing(&mut self, context: TimingContext) {
        self.context = context;
        if self.layout_tempo.is_none() {
            self.layout_tempo = Some(context.tempo);
        }
    }

    /// Adopt the conductor's current tempo as the layout tempo
    pub fn sync_conductor(&mut self) {
        self.layout_tempo = Some(self.context.tempo);
    }

    fn in_range(&self, step: u64) -> bool {
        step < self.context.total_steps
    }

    /// Number of populated steps
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Collections in step order
    pub fn iter(&self) -> impl Iterator<Item = &MusicNoteCollection> {
        self.steps.values()
    }

    /// Collection scheduled at `index`
    pub fn get_notes(&self, index: u64) -> Option<&MusicNoteCollection> {
        if !self.in_range(index) {
            return None;
        }
        self.steps.get(&index)
    }

    /// Same as [`MusicContainer::get_notes`]
    pub fn get_slot(&self, index: u64) -> Option<&MusicNoteCollection> {
        self.get_notes(index)
    }

    pub fn get_slot_by_id(&self, id: &str) -> Option<&MusicNoteCollection> {
        self.slots.get(id).and_then(|step| self.steps.get(step))
    }

    pub fn get_note(&self, index: u64, name: &str) -> Option<&MusicNote> {
        self.get_notes(index).and_then(|c| c.get_note(name))
    }

    /// Bulk-load collections, skipping entries that name no step
    ///
    /// Returns the number of collections added.
    pub fn set_steps<I>(&mut self, steps: I) -> usize
    where
        I: IntoIterator<Item = SlotInput>,
    {
        let mut added = 0;
        for input in steps {
            if input.step().is_none() {
                log::debug!("Skipping collection without a step");
                continue;
            }
            if self.insert_slot(input) {
                added += 1;
            }
        }
        self.update_slots();
        // Bulk data is laid out in the current tempo once a conductor is known
        if self.layout_tempo.is_some() {
            self.sync_conductor();
        }
        self.debug_check();
        added
    }

    /// Bulk-load from a parsed list or id-keyed map
    pub fn set_steps_from(&mut self, steps: StepsInput) -> usize {
        self.set_steps(steps.into_inputs())
    }

    /// Add a collection, replacing whatever sits at its step
    ///
    /// Returns false if the step is outside `0..total_steps`.
    pub fn add_slot(&mut self, input: impl Into<SlotInput>) -> bool {
        let added = self.insert_slot(input.into());
        if added {
            self.update_slots();
            self.debug_check();
        }
        added
    }

    fn insert_slot(&mut self, input: SlotInput) -> bool {
        let mut collection = input.into_collection();
        let step = collection.step;
        if !self.in_range(step) {
            log::warn!(
                "Rejected slot at step {} (total steps: {})",
                step,
                self.context.total_steps
            );
            return false;
        }
        collection.set_step(step);

        // Re-adding a registered collection moves it
        let id = collection.id.clone();
        if let Some(old_step) = self.slots.remove(&id) {
            self.steps.remove(&old_step);
        }
        if let Some(replaced) = self.steps.insert(step, collection) {
            self.slots.remove(&replaced.id);
        }
        self.slots.insert(id, step);
        log::debug!("Slot added at step {}", step);
        true
    }

    /// Remove a collection. Returns false if nothing matched
    pub fn remove_slot<'a>(&mut self, target: impl Into<SlotRef<'a>>) -> bool {
        let step = match target.into() {
            SlotRef::Collection(collection) => self.slots.get(&collection.id).copied(),
            SlotRef::Id(id) => self.slots.get(id).copied(),
            SlotRef::Step(step) => {
                if !self.in_range(step) {
                    return false;
                }
                Some(step)
            }
        };

        let Some(removed) = step.and_then(|s| self.steps.remove(&s)) else {
            return false;
        };
        self.slots.remove(&removed.id);
        log::debug!("Slot removed at step {}", removed.step);
        self.update_slots();
        self.debug_check();
        true
    }

    /// Add a note at `index`, creating the collection if needed
    ///
    /// Returns false if `index` is out of range or the input resolves to no
    /// named note. A collection created for a rejected note is removed again.
    pub fn add_note(&mut self, index: u64, note: impl Into<NoteInput>) -> bool {
        if !self.in_range(index) {
            return false;
        }

        let created = !self.steps.contains_key(&index);
        if created && !self.add_slot(index) {
            return false;
        }

        let added = self
            .steps
            .get_mut(&index)
            .is_some_and(|collection| collection.add_note(note));

        if !added && created {
            self.remove_slot(index);
        }
        if added {
            self.update_slots();
            self.debug_check();
        }
        added
    }

    /// Remove the note called `name` at `index`
    ///
    /// A collection left without notes is removed. Returns false if the index
    /// is out of range or there was nothing to remove.
    pub fn remove_note(&mut self, index: u64, name: &str) -> bool {
        if !self.in_range(index) {
            return false;
        }
        let Some(collection) = self.steps.get_mut(&index) else {
            return false;
        };
        if !collection.remove_note(name) {
            return false;
        }

        if collection.is_empty() {
            self.remove_slot(index);
        }
        self.update_slots();
        self.debug_check();
        true
    }

    /// Recompute every collection's `next` link
    pub fn update_slots(&mut self) {
        let order: Vec<(u64, String)> = self
            .steps
            .iter()
            .map(|(step, collection)| (*step, collection.id.clone()))
            .collect();

        for (position, collection) in self.steps.values_mut().enumerate() {
            collection.next = order
                .get(position + 1)
                .map(|(step, id)| Link::Resolved {
                    id: id.clone(),
                    step: *step,
                });
        }
        log::trace!("Lookahead recomputed for {} slots", order.len());
    }

    /// Route a conductor event. Returns the note event to emit, if any
    pub fn handle_event(&mut self, event: &ConductorEvent) -> Option<ConductorEvent> {
        match event {
            ConductorEvent::StepHit(hit) => self.on_step_hit(hit).map(ConductorEvent::NoteHit),
            ConductorEvent::BeatHit(hit) => {
                self.on_beat_hit(hit).map(ConductorEvent::NoteBeatHit)
            }
            ConductorEvent::BarHit(hit) => self.on_bar_hit(hit).map(ConductorEvent::NoteBarHit),
            ConductorEvent::BpmChange { .. } => {
                self.on_bpm_change();
                None
            }
            _ => None,
        }
    }

    fn note_hit(&mut self, step: u64, timing: &HitTiming) -> Option<NoteHit> {
        let collection = self.steps.get_mut(&step)?;
        collection.delay = timing.delay;
        Some(NoteHit {
            notes: collection.clone(),
            step,
            beat: None,
            bar: None,
            timing: timing.clone(),
        })
    }

    pub fn on_step_hit(&mut self, hit: &StepHit) -> Option<NoteHit> {
        self.note_hit(hit.step, &hit.timing)
    }

    pub fn on_beat_hit(&mut self, hit: &BeatHit) -> Option<NoteHit> {
        let step = self.context.tempo.step_of_beat(hit.beat);
        let mut note_hit = self.note_hit(step, &hit.timing)?;
        note_hit.beat = Some(hit.beat);
        Some(note_hit)
    }

    pub fn on_bar_hit(&mut self, hit: &BarHit) -> Option<NoteHit> {
        let step = self.context.tempo.step_of_bar(hit.bar);
        let mut note_hit = self.note_hit(step, &hit.timing)?;
        note_hit.bar = Some(hit.bar);
        Some(note_hit)
    }

    /// Remap every step from the layout tempo to the current tempo
    ///
    /// `new = round(old * newBpm/oldBpm * newMeasure/oldMeasure)`. Lossy:
    /// on a collision the collection from the higher previous step wins, and
    /// collections mapped past the end of the track are dropped.
    pub fn on_bpm_change(&mut self) {
        let current = self.context.tempo;
        let Some(previous) = self.layout_tempo else {
            self.layout_tempo = Some(current);
            return;
        };

        let ratio = (current.bpm() as f64 / previous.bpm() as f64)
            * (current.measure() as f64 / previous.measure() as f64);

        let old_steps = std::mem::take(&mut self.steps);
        self.slots.clear();
        for (index, mut collection) in old_steps {
            let new_index = (index as f64 * ratio).round() as u64;
            if !self.in_range(new_index) {
                log::warn!(
                    "Tempo change dropped collection {} (step {} -> {})",
                    collection.id,
                    index,
                    new_index
                );
                continue;
            }
            collection.set_step(new_index);
            if let Some(replaced) = self.steps.insert(new_index, collection) {
                log::warn!(
                    "Tempo change collision at step {}, dropped {}",
                    new_index,
                    replaced.id
                );
            }
        }
        self.slots = self
            .steps
            .iter()
            .map(|(step, collection)| (collection.id.clone(), *step))
            .collect();

        log::debug!("Schedule remapped from {} to {}", previous, current);
        self.update_slots();
        self.sync_conductor();
        self.debug_check();
    }

    /// Verify the id index and lookahead links
    ///
    /// Step bounds are enforced on insertion only: a shorter track leaves
    /// later collections stored but unreachable through lookups.
    pub fn check_invariants(&self) -> Result<(), ScheduleError> {
        if self.slots.len() != self.steps.len() {
            return Err(ScheduleError::InconsistentIndex(format!(
                "{} ids for {} steps",
                self.slots.len(),
                self.steps.len()
            )));
        }

        let mut expected_next: Option<(u64, &str)> = None;
        for (step, collection) in self.steps.iter().rev() {
            if collection.step != *step {
                return Err(ScheduleError::InconsistentIndex(format!(
                    "collection {} stored at {} claims step {}",
                    collection.id, step, collection.step
                )));
            }
            if self.slots.get(&collection.id) != Some(step) {
                return Err(ScheduleError::InconsistentIndex(format!(
                    "id {} not indexed at {}",
                    collection.id, step
                )));
            }
            if let Some(note) = collection.notes().find(|n| n.step != *step) {
                return Err(ScheduleError::InconsistentIndex(format!(
                    "note {} at {} claims step {}",
                    note.id, step, note.step
                )));
            }

            let actual = collection
                .next
                .as_ref()
                .map(|link| (link.step(), link.id()));
            let expected = expected_next.map(|(s, id)| (Some(s), id));
            if actual != expected {
                return Err(ScheduleError::InconsistentIndex(format!(
                    "collection {} has a stale next link",
                    collection.id
                )));
            }
            expected_next = Some((*step, collection.id.as_str()));
        }
        Ok(())
    }

    fn debug_check(&self) {
        debug_assert!(
            self.check_invariants().is_ok(),
            "{:?}",
            self.check_invariants()
        );
    }

    /// Plain snapshot of the whole schedule
    pub fn as_json(&self) -> ContainerSnapshot {
        ContainerSnapshot {
            name: self.name.clone(),
            slots: self
                .steps
                .values()
                .map(|collection| (collection.id.clone(), collection.as_json()))
                .collect(),
        }
    }

    /// Rebuild a container from a snapshot
    ///
    /// Note links are rehydrated by id; collection links are recomputed from
    /// step order.
    pub fn from_snapshot(
        snapshot: &ContainerSnapshot,
        total_steps: u64,
    ) -> Result<Self, ScheduleError> {
        let mut container = Self::new(total_steps);
        container.name = snapshot.name.clone();

        for (key, description) in &snapshot.slots {
            let mut collection = MusicNoteCollection::from_snapshot(description);
            if description.id.is_none() {
                collection.id = key.clone();
            }
            let step = collection.step;
            if !container.in_range(step) {
                return Err(ScheduleError::StepOutOfRange { step, total_steps });
            }
            if container.steps.contains_key(&step) {
                return Err(ScheduleError::DuplicateStep(step));
            }
            container.slots.insert(collection.id.clone(), step);
            container.steps.insert(step, collection);
        }

        container.rehydrate_note_links();
        container.update_slots();
        container.debug_check();
        Ok(container)
    }

    fn rehydrate_note_links(&mut self) {
        let known: HashMap<String, u64> = self
            .steps
            .values()
            .flat_map(|c| c.notes())
            .map(|note| (note.id.clone(), note.step))
            .collect();

        for collection in self.steps.values_mut() {
            for note in collection.notes_mut() {
                let Some(Link::Unresolved(id)) = &note.next else {
                    continue;
                };
                match known.get(id) {
                    Some(step) => {
                        note.next = Some(Link::Resolved {
                            id: id.clone(),
                            step: *step,
                        });
                    }
                    None => log::debug!("Note {} links to unknown note {}", note.id, id),
                }
            }
        }
    }

    pub fn to_json_string(&self) -> Result<String, ScheduleError> {
        Ok(serde_json::to_string_pretty(&self.as_json())?)
    }

    pub fn from_json_str(json: &str, total_steps: u64) -> Result<Self, ScheduleError> {
        let snapshot: ContainerSnapshot = serde_json::from_str(json)?;
        Self::from_snapshot(&snapshot, total_steps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::snapshot::CollectionSnapshot;

    fn timing(delay: f64) -> HitTiming {
        HitTiming {
            crotchet: 0.5,
            step_crotchet: 0.125,
            semibreve: 2.0,
            frequency_data: vec![],
            bpm: 120,
            measure: 4,
            delay,
        }
    }

    fn container_with_steps(total: u64, steps: &[u64]) -> MusicContainer {
        let mut container = MusicContainer::with_context(TimingContext::new(
            total,
            Tempo::new(120.0, 4.0),
        ));
        for step in steps {
            assert!(container.add_slot(*step));
        }
        container
    }

    fn next_step(container: &MusicContainer, step: u64) -> Option<u64> {
        container
            .get_notes(step)
            .and_then(|c| c.next.as_ref())
            .and_then(|link| link.step())
    }

    #[test]
    fn test_add_slot_bounds() {
        let mut container = MusicContainer::new(8);
        assert!(container.add_slot(0u64));
        assert!(container.add_slot(7u64));
        assert!(!container.add_slot(8u64));
        assert_eq!(container.len(), 2);
    }

    #[test]
    fn test_add_slot_overwrites_step() {
        let mut container = MusicContainer::new(8);
        let first = MusicNoteCollection::new(3);
        let first_id = first.id.clone();
        container.add_slot(first);

        let second = MusicNoteCollection::new(3);
        let second_id = second.id.clone();
        container.add_slot(second);

        assert_eq!(container.len(), 1);
        assert!(container.get_slot_by_id(&first_id).is_none());
        assert_eq!(container.get_slot(3).unwrap().id, second_id);
        container.check_invariants().unwrap();
    }

    #[test]
    fn test_readding_collection_moves_it() {
        let mut container = MusicContainer::new(16);
        let mut collection = MusicNoteCollection::new(2);
        container.add_slot(collection.clone());

        collection.step = 9;
        container.add_slot(collection.clone());

        assert!(container.get_slot(2).is_none());
        assert_eq!(container.get_slot_by_id(&collection.id).unwrap().step, 9);
        container.check_invariants().unwrap();
    }

    #[test]
    fn test_lookahead_links() {
        let mut container = container_with_steps(16, &[2, 5, 9]);
        assert_eq!(next_step(&container, 2), Some(5));
        assert_eq!(next_step(&container, 5), Some(9));
        assert_eq!(next_step(&container, 9), None);

        assert!(container.remove_slot(5u64));
        assert_eq!(next_step(&container, 2), Some(9));
        assert_eq!(next_step(&container, 9), None);

        // Inserting before every existing slot updates it too
        container.add_slot(0u64);
        assert_eq!(next_step(&container, 0), Some(2));
        container.check_invariants().unwrap();
    }

    #[test]
    fn test_remove_slot_forms() {
        let mut container = container_with_steps(16, &[1, 4, 6]);
        let by_id = container.get_slot(4).unwrap().id.clone();
        let collection = container.get_slot(6).unwrap().clone();

        assert!(container.remove_slot(by_id.as_str()));
        assert!(container.remove_slot(&collection));
        assert!(container.remove_slot(1u64));
        assert!(!container.remove_slot(1u64));
        assert!(!container.remove_slot(99u64));
        assert!(!container.remove_slot("missing"));
        assert!(container.is_empty());
    }

    #[test]
    fn test_add_note_creates_and_remove_note_cleans_up() {
        let mut container = MusicContainer::new(8);
        assert!(container.add_note(3, "kick"));

        let collection = container.get_notes(3).unwrap();
        assert_eq!(collection.note_count(), 1);
        assert_eq!(collection.get_note("kick").unwrap().step, 3);

        assert!(container.remove_note(3, "kick"));
        assert!(container.get_notes(3).is_none());
        assert!(container.is_empty());
    }

    #[test]
    fn test_add_note_rejections() {
        let mut container = MusicContainer::new(8);
        assert!(!container.add_note(8, "kick"));
        assert!(!container.add_note(2, ""));
        assert!(container.is_empty());

        assert!(!container.remove_note(8, "kick"));
        assert!(!container.remove_note(2, "kick"));
        container.add_note(2, "kick");
        assert!(!container.remove_note(2, "snare"));
        assert_eq!(container.len(), 1);
    }

    #[test]
    fn test_add_note_inherits_targets() {
        let mut container = MusicContainer::new(8);
        container.add_slot(MusicNoteCollection::new(5).with_targets(vec!["p1".to_string()]));
        container.add_note(5, "snare");
        let note = container.get_note(5, "snare").unwrap();
        assert_eq!(note.targets, vec!["p1"]);
    }

    #[test]
    fn test_set_steps_skips_missing_step() {
        let mut container = MusicContainer::new(8);
        let added = container.set_steps(vec![
            SlotInput::Description(CollectionSnapshot {
                step: Some(0),
                ..Default::default()
            }),
            SlotInput::Description(CollectionSnapshot::default()),
            SlotInput::Step(4),
            SlotInput::Step(20),
        ]);
        assert_eq!(added, 2);
        assert!(container.get_slot(0).is_some());
        assert_eq!(next_step(&container, 0), Some(4));
    }

    #[test]
    fn test_note_hit_routing() {
        let mut container = container_with_steps(64, &[3, 8, 32]);

        let hit = StepHit {
            step: 3,
            timing: timing(0.01),
            volume: Some(1.0),
        };
        let event = container.handle_event(&ConductorEvent::StepHit(hit)).unwrap();
        match event {
            ConductorEvent::NoteHit(note_hit) => {
                assert_eq!(note_hit.step, 3);
                assert_eq!(note_hit.notes.delay, 0.01);
            }
            other => panic!("unexpected event {:?}", other),
        }
        assert_eq!(container.get_slot(3).unwrap().delay, 0.01);

        // beat 2 -> step 8
        let beat = BeatHit {
            beat: 2,
            timing: timing(0.0),
            volume: None,
        };
        let event = container.handle_event(&ConductorEvent::BeatHit(beat)).unwrap();
        assert!(matches!(
            event,
            ConductorEvent::NoteBeatHit(NoteHit { step: 8, beat: Some(2), .. })
        ));

        // bar 2 -> step 32
        let bar = BarHit {
            bar: 2,
            timing: timing(0.0),
            volume: None,
        };
        let event = container.handle_event(&ConductorEvent::BarHit(bar)).unwrap();
        assert!(matches!(
            event,
            ConductorEvent::NoteBarHit(NoteHit { step: 32, bar: Some(2), .. })
        ));

        // nothing scheduled at step 4
        let empty = StepHit {
            step: 4,
            timing: timing(0.0),
            volume: None,
        };
        assert!(container.handle_event(&ConductorEvent::StepHit(empty)).is_none());
    }

    #[test]
    fn test_bpm_change_remaps_steps() {
        let mut container = container_with_steps(64, &[2, 3, 10, 30]);
        container.add_note(10, "kick");

        // Doubling the tempo doubles the indices
        container.set_timing(TimingContext::new(64, Tempo::new(240.0, 4.0)));
        container.on_bpm_change();

        let steps: Vec<u64> = container.iter().map(|c| c.step).collect();
        assert_eq!(steps, vec![4, 6, 20, 60]);
        assert_eq!(container.get_note(20, "kick").unwrap().step, 20);
        assert_eq!(container.layout_tempo(), Some(Tempo::new(240.0, 4.0)));
        container.check_invariants().unwrap();
    }

    #[test]
    fn test_bpm_change_is_lossy() {
        let mut container = container_with_steps(64, &[2, 3, 4, 40]);
        let survivor = container.get_slot(4).unwrap().id.clone();

        // Halving: 2 -> 1, 3 -> round(1.5) = 2, 4 -> 2, 40 -> 20
        container.set_timing(TimingContext::new(64, Tempo::new(60.0, 4.0)));
        container.on_bpm_change();
        let steps: Vec<u64> = container.iter().map(|c| c.step).collect();
        assert_eq!(steps, vec![1, 2, 20]);
        assert_eq!(container.get_slot(2).unwrap().id, survivor);
        assert_eq!(container.len(), 3);

        // Quartering: 1 -> 0, 2 -> round(0.5) = 1, 20 -> 5
        container.set_timing(TimingContext::new(64, Tempo::new(15.0, 4.0)));
        container.on_bpm_change();
        let steps: Vec<u64> = container.iter().map(|c| c.step).collect();
        assert_eq!(steps, vec![0, 1, 5]);
        assert_eq!(container.get_slot(1).unwrap().id, survivor);

        // Out-of-range results are dropped
        container.set_timing(TimingContext::new(8, Tempo::new(60.0, 4.0)));
        container.on_bpm_change();
        let steps: Vec<u64> = container.iter().map(|c| c.step).collect();
        assert_eq!(steps, vec![0, 4]);
        container.check_invariants().unwrap();
    }

    #[test]
    fn test_snapshot_round_trip() {
        let mut container = container_with_steps(32, &[1, 7, 12]);
        container.add_note(7, "kick");
        container.add_note(12, "snare");

        let snare_id = container.get_note(12, "snare").unwrap().id.clone();
        let mut linked = MusicNote::new("hat");
        linked.next = Some(Link::Unresolved(snare_id.clone()));
        container.add_note(1, linked);

        let json = container.to_json_string().unwrap();
        let rebuilt = MusicContainer::from_json_str(&json, 32).unwrap();

        assert_eq!(rebuilt.name(), container.name());
        assert_eq!(rebuilt.as_json(), container.as_json());
        let hat = rebuilt.get_note(1, "hat").unwrap();
        assert_eq!(
            hat.next,
            Some(Link::Resolved {
                id: snare_id,
                step: 12
            })
        );
        assert!(hat.next.as_ref().unwrap().is_resolved());
        assert!(rebuilt.get_slot(1).unwrap().next.as_ref().unwrap().is_resolved());
    }

    #[test]
    fn test_from_snapshot_rejects_bad_steps() {
        let container = container_with_steps(32, &[20]);
        let snapshot = container.as_json();
        assert!(matches!(
            MusicContainer::from_snapshot(&snapshot, 10),
            Err(ScheduleError::StepOutOfRange { step: 20, .. })
        ));

        let mut duplicated = snapshot.clone();
        duplicated.slots.insert(
            "other".to_string(),
            CollectionSnapshot {
                step: Some(20),
                ..Default::default()
            },
        );
        assert!(matches!(
            MusicContainer::from_snapshot(&duplicated, 32),
            Err(ScheduleError::DuplicateStep(20))
        ));
    }
}
