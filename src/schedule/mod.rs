// Schedule module - Sparse step-indexed note schedule
// Notes are grouped in collections, collections are keyed by step in a container

pub mod collection;
pub mod container;
pub mod note;
pub mod persistence;
pub mod snapshot;

pub use collection::{MusicNoteCollection, SlotInput, SlotRef};
pub use container::{MusicContainer, TimingContext};
pub use note::{MusicNote, NoteInput};
pub use persistence::{load_schedule, save_schedule};
pub use snapshot::{CollectionSnapshot, ContainerSnapshot, NoteSnapshot, StepsInput};

use std::fmt;

/// Schedule error types
#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    #[error("Step {step} is outside the schedule (total steps: {total_steps})")]
    StepOutOfRange { step: u64, total_steps: u64 },

    #[error("Two collections claim step {0}")]
    DuplicateStep(u64),

    #[error("Schedule index out of sync: {0}")]
    InconsistentIndex(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Forward reference from one schedule entity to another
///
/// A live schedule holds `Resolved` links (the target is known to exist, and
/// where); a freshly parsed snapshot holds `Unresolved` ids until a container
/// rehydrates them. Two links are equal when they name the same id.
#[derive(Debug, Clone)]
pub enum Link {
    Resolved { id: String, step: u64 },
    Unresolved(String),
}

impl Link {
    /// Id of the linked entity
    pub fn id(&self) -> &str {
        match self {
            Link::Resolved { id, .. } => id,
            Link::Unresolved(id) => id,
        }
    }

    /// Step of the linked entity, when resolved
    pub fn step(&self) -> Option<u64> {
        match self {
            Link::Resolved { step, .. } => Some(*step),
            Link::Unresolved(_) => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Link::Resolved { .. })
    }
}

// Links compare by target id only; check `is_resolved` where resolution matters
impl PartialEq for Link {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for Link {}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Link::Resolved { id, step } => write!(f, "{} @ {}", id, step),
            Link::Unresolved(id) => write!(f, "{} (unresolved)", id),
        }
    }
}

/// Random identifier: `prefix` followed by nine characters of a UUID v4
pub(crate) fn random_id(prefix: &str, suffix: &str) -> String {
    let raw = uuid::Uuid::new_v4().simple().to_string();
    format!("{}{}{}", prefix, &raw[..9], suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_equality_by_id() {
        let resolved = Link::Resolved {
            id: "MNote-abc".to_string(),
            step: 4,
        };
        let unresolved = Link::Unresolved("MNote-abc".to_string());
        assert_eq!(resolved, unresolved);
        assert_ne!(resolved, Link::Unresolved("MNote-xyz".to_string()));

        assert_eq!(resolved.step(), Some(4));
        assert_eq!(unresolved.step(), None);
        assert!(resolved.is_resolved());
        assert!(!unresolved.is_resolved());
    }

    #[test]
    fn test_random_id_shape() {
        let id = random_id("MNote-", "");
        assert!(id.starts_with("MNote-"));
        assert_eq!(id.len(), "MNote-".len() + 9);
        assert_ne!(id, random_id("MNote-", ""));

        let name = random_id("[MusicContainer:", "]");
        assert!(name.ends_with(']'));
    }
}
