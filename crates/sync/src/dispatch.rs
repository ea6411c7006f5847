use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};

use serde_json::Value;

use crate::inbound::EventKind;

/// Callback invoked with the full event payload.
pub type Callback = Box<dyn FnMut(&Value)>;

/// Handle returned by [`EventDispatcher::on`], consumed by `off`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct CallbackId(u64);

/// Per-entity registry of event callbacks.
///
/// Callbacks fire synchronously, in registration order. Registering the
/// same closure twice yields two registrations and two firings. A callback
/// that panics is isolated and logged; the remaining callbacks still run.
#[derive(Default)]
pub struct EventDispatcher {
    next: u64,
    slots: HashMap<EventKind, Vec<(CallbackId, Callback)>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(&mut self, kind: EventKind, callback: Callback) -> CallbackId {
        let id = CallbackId(self.next);
        self.next += 1;
        self.slots.entry(kind).or_default().push((id, callback));
        id
    }

    /// Unregisters one callback. Returns whether it was registered.
    pub fn off(&mut self, kind: EventKind, id: CallbackId) -> bool {
        let Some(slot) = self.slots.get_mut(&kind) else {
            return false;
        };
        let before = slot.len();
        slot.retain(|(slot_id, _)| *slot_id != id);
        slot.len() != before
    }

    pub fn registered(&self, kind: EventKind) -> usize {
        self.slots.get(&kind).map_or(0, Vec::len)
    }

    /// Invokes every callback registered for `kind`. Returns how many ran.
    pub fn dispatch(&mut self, kind: EventKind, payload: &Value) -> usize {
        let Some(slot) = self.slots.get_mut(&kind) else {
            return 0;
        };
        let mut fired = 0;
        for (id, callback) in slot.iter_mut() {
            if catch_unwind(AssertUnwindSafe(|| callback(payload))).is_err() {
                tracing::warn!(kind = kind.as_str(), callback = id.0, "event callback panicked");
            }
            fired += 1;
        }
        fired
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut counts: Vec<(&'static str, usize)> = self
            .slots
            .iter()
            .filter(|(_, slot)| !slot.is_empty())
            .map(|(kind, slot)| (kind.as_str(), slot.len()))
            .collect();
        counts.sort();
        f.debug_struct("EventDispatcher")
            .field("registered", &counts)
            .finish()
    }
}
