use std::collections::BTreeMap;

use foundation::ids::EntityId;
use schema::AttrValue;
use sync::EventDispatcher;

use crate::kind::EntityKind;

/// One stateful object mirrored to the view: identity, kind discriminator,
/// attribute values, and the entity's event callback registry.
#[derive(Debug)]
pub struct Entity {
    id: EntityId,
    kind: EntityKind,
    values: BTreeMap<&'static str, AttrValue>,
    dispatcher: EventDispatcher,
}

impl Entity {
    pub(crate) fn new(
        id: EntityId,
        kind: EntityKind,
        values: BTreeMap<&'static str, AttrValue>,
    ) -> Self {
        Entity {
            id,
            kind,
            values,
            dispatcher: EventDispatcher::new(),
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.values.get(name)
    }

    pub(crate) fn insert(&mut self, name: &'static str, value: AttrValue) {
        self.values.insert(name, value);
    }

    pub(crate) fn dispatcher_mut(&mut self) -> &mut EventDispatcher {
        &mut self.dispatcher
    }

    /// Ordered entity references held under `name` ([] if the attribute is
    /// absent or not entity-valued).
    pub fn entity_list(&self, name: &str) -> Vec<EntityId> {
        match self.values.get(name) {
            Some(AttrValue::Entities(ids)) => ids.clone(),
            _ => Vec::new(),
        }
    }
}
