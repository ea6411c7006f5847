use std::collections::BTreeMap;

use foundation::ids::{EntityId, IdAllocator};
use serde_json::Value;

use crate::patch::{Command, Outbound, StatePatch};
use crate::sink::PatchSink;

/// Mirrors committed state to the view.
///
/// The channel stamps entity ids and forwards one outbound message per
/// logical mutation. Sends happen inline with the commit, so patches for a
/// single entity always leave in commit order; no cross-entity ordering is
/// promised beyond that.
#[derive(Debug)]
pub struct SyncChannel<S: PatchSink> {
    alloc: IdAllocator,
    sink: S,
}

impl<S: PatchSink> SyncChannel<S> {
    pub fn new(sink: S) -> Self {
        SyncChannel {
            alloc: IdAllocator::new(),
            sink,
        }
    }

    pub fn allocate_id(&mut self) -> EntityId {
        self.alloc.allocate()
    }

    /// Sends one state patch for one logical mutation.
    pub fn commit(&mut self, entity: EntityId, changes: BTreeMap<String, Value>) {
        self.sink.send(Outbound::Patch(StatePatch::new(entity, changes)));
    }

    /// Sends an imperative command (not a state change).
    pub fn command(&mut self, entity: EntityId, msg: impl Into<String>, payload: Value) {
        self.sink.send(Outbound::Command(Command {
            entity: entity.raw(),
            msg: msg.into(),
            payload,
        }));
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }
}

#[cfg(test)]
mod tests {
    use super::SyncChannel;
    use crate::patch::Outbound;
    use crate::sink::RecordingSink;
    use serde_json::json;
    use std::collections::BTreeMap;

    #[test]
    fn commits_leave_in_commit_order() {
        let mut channel = SyncChannel::new(RecordingSink::new());
        let id = channel.allocate_id();
        for i in 0..3 {
            let mut changes = BTreeMap::new();
            changes.insert("step".to_string(), json!(i));
            channel.commit(id, changes);
        }
        let steps: Vec<i64> = channel
            .sink()
            .sent()
            .iter()
            .map(|out| match out {
                Outbound::Patch(p) => p.changes["step"].as_i64().unwrap(),
                Outbound::Command(_) => panic!("unexpected command"),
            })
            .collect();
        assert_eq!(steps, vec![0, 1, 2]);
    }
}
