// Snapshot types for schedule persistence
// Plain serde structures; entity links are flattened to ids

use super::collection::SlotInput;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

fn empty_detail() -> Value {
    Value::Object(Default::default())
}

/// Serializable note
///
/// Also used as a partial description when adding notes: absent fields take
/// their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoteSnapshot {
    pub id: Option<String>,
    pub step: Option<u64>,
    pub note: Option<String>,
    pub targets: Vec<String>,
    /// Id of the linked note
    pub next: Option<String>,
    pub intensity: Option<f64>,
    #[serde(default = "empty_detail")]
    pub detail: Value,
}

impl Default for NoteSnapshot {
    fn default() -> Self {
        Self {
            id: None,
            step: None,
            note: None,
            targets: Vec::new(),
            next: None,
            intensity: None,
            detail: empty_detail(),
        }
    }
}

/// Serializable note collection
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionSnapshot {
    pub id: Option<String>,
    pub step: Option<u64>,
    pub delay: f64,
    pub targets: Vec<String>,
    /// Id of the next populated collection
    pub next: Option<String>,
    /// Notes keyed by name
    pub notes: BTreeMap<String, NoteSnapshot>,
}

/// Serializable container
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ContainerSnapshot {
    pub name: String,
    /// Collections keyed by id
    pub slots: BTreeMap<String, CollectionSnapshot>,
}

/// Bulk schedule input, either a plain list or keyed by collection id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StepsInput {
    List(Vec<CollectionSnapshot>),
    Keyed(BTreeMap<String, CollectionSnapshot>),
}

impl StepsInput {
    /// Convert to slot inputs. Keyed entries without an id take their key
    pub fn into_inputs(self) -> Vec<SlotInput> {
        match self {
            StepsInput::List(list) => list.into_iter().map(SlotInput::Description).collect(),
            StepsInput::Keyed(map) => map
                .into_iter()
                .map(|(key, mut description)| {
                    if description.id.is_none() {
                        description.id = Some(key);
                    }
                    SlotInput::Description(description)
                })
                .collect(),
        }
    }
}
