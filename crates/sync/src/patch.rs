//! Host → view wire format.
//!
//! State patches carry committed attribute values; commands carry
//! imperative messages that are not state (e.g. a tile redraw). The format
//! is transport-agnostic: a sink may frame it over a widget comm, a
//! websocket, a file, or keep it in memory.

use std::collections::BTreeMap;

use foundation::ids::EntityId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One logical mutation of one entity: attribute name → serialized value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatePatch {
    pub entity: u64,
    pub changes: BTreeMap<String, Value>,
}

impl StatePatch {
    pub fn new(entity: EntityId, changes: BTreeMap<String, Value>) -> Self {
        StatePatch {
            entity: entity.raw(),
            changes,
        }
    }

    /// Patch with a single changed attribute.
    pub fn single(entity: EntityId, name: impl Into<String>, value: Value) -> Self {
        let mut changes = BTreeMap::new();
        changes.insert(name.into(), value);
        StatePatch::new(entity, changes)
    }
}

/// Imperative host → view message that is not a state change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    pub entity: u64,
    pub msg: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub payload: Value,
}

/// Everything the host sends to the view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Outbound {
    Patch(StatePatch),
    Command(Command),
}
