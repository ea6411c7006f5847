//! The single-owner entity registry.
//!
//! All mutations flow through [`Scene`]: attribute commits, collection
//! operations, callback registration, inbound delivery. Entities are owned
//! centrally and referenced by id, which is what makes collection
//! membership a reference relationship rather than structural ownership.

use std::collections::{BTreeMap, HashSet};

use catalog::{Basemap, Day, resolve_url};
use foundation::crs::Crs;
use foundation::ids::EntityId;
use schema::{AttrValue, SchemaError};
use serde_json::Value;
use sync::{CallbackId, Classified, EventKind, PatchSink, RecordingSink, SyncChannel, classify};

use crate::config::Config;
use crate::entity::Entity;
use crate::error::ModelError;
use crate::kind::{EntityKind, LayerKind};
use crate::schemas::schema_for;

/// Handle for one attribute link, consumed by [`Scene::unlink`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct LinkId(u64);

impl std::fmt::Display for LinkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug)]
struct Link {
    id: LinkId,
    src: (EntityId, &'static str),
    dst: (EntityId, &'static str),
}

/// What layer operations accept: an entity already in the scene, or a
/// plain basemap descriptor materialized into a tile layer on the way in.
#[derive(Debug, Clone)]
pub enum LayerSource {
    Existing(EntityId),
    Basemap(Basemap),
}

impl From<EntityId> for LayerSource {
    fn from(id: EntityId) -> Self {
        LayerSource::Existing(id)
    }
}

impl From<Basemap> for LayerSource {
    fn from(basemap: Basemap) -> Self {
        LayerSource::Basemap(basemap)
    }
}

impl From<&Basemap> for LayerSource {
    fn from(basemap: &Basemap) -> Self {
        LayerSource::Basemap(basemap.clone())
    }
}

/// The entity graph and its sync channel. One logical owner: operations
/// are synchronous and atomic, so no internal locking is needed.
#[derive(Debug)]
pub struct Scene<S: PatchSink> {
    channel: SyncChannel<S>,
    entities: BTreeMap<EntityId, Entity>,
    links: Vec<Link>,
    next_link: u64,
    link_guard: HashSet<(EntityId, &'static str)>,
}

impl Scene<RecordingSink> {
    /// Scene over an in-memory sink; outbound traffic stays inspectable.
    pub fn recording() -> Self {
        Scene::new(RecordingSink::new())
    }
}

impl<S: PatchSink> Scene<S> {
    pub fn new(sink: S) -> Self {
        Scene {
            channel: SyncChannel::new(sink),
            entities: BTreeMap::new(),
            links: Vec::new(),
            next_link: 0,
            link_guard: HashSet::new(),
        }
    }

    pub fn sink(&self) -> &S {
        self.channel.sink()
    }

    pub fn sink_mut(&mut self) -> &mut S {
        self.channel.sink_mut()
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Creates an entity from a configuration object. Unknown keys and
    /// out-of-domain values fail before anything joins the scene; on
    /// success the full initial synced state leaves as one patch.
    pub fn create(&mut self, kind: EntityKind, config: Config) -> Result<EntityId, ModelError> {
        let schema = schema_for(kind);
        let mut values: BTreeMap<&'static str, AttrValue> = schema.defaults().into_iter().collect();
        // The options list is derived from the schema at
        // default-materialization time, never from live values.
        values.insert("options", AttrValue::StrList(schema.options()));

        for (name, value) in config.entries() {
            let spec = schema
                .get(name)
                .ok_or_else(|| SchemaError::UnknownAttribute {
                    kind: schema.kind(),
                    name: name.clone(),
                })?;
            if spec.read_only {
                return Err(SchemaError::ImmutableAttribute { name: name.clone() }.into());
            }
            let value = schema.conform(name, value.clone())?;
            match &value {
                AttrValue::Entities(ids) => self.validate_entity_list(spec.name, ids)?,
                AttrValue::Entity(id) => {
                    if !self.contains(*id) {
                        return Err(ModelError::UnknownEntity { id: *id });
                    }
                }
                _ => {}
            }
            values.insert(spec.name, value);
        }

        if kind == EntityKind::Map {
            let context = context_for(&values)?;
            values.insert("context", AttrValue::Str(context.to_string()));
        }

        let id = self.channel.allocate_id();
        let entity = Entity::new(id, kind, values);

        let mut changes = BTreeMap::new();
        for spec in schema.iter().filter(|s| s.sync) {
            if let Some(value) = entity.get(spec.name) {
                changes.insert(spec.name.to_string(), value.to_wire());
            }
        }
        self.channel.commit(id, changes);
        self.entities.insert(id, entity);
        Ok(id)
    }

    /// Current value of an attribute (a deep copy).
    pub fn get(&self, target: EntityId, name: &str) -> Result<AttrValue, ModelError> {
        let entity = self
            .entities
            .get(&target)
            .ok_or(ModelError::UnknownEntity { id: target })?;
        match entity.get(name) {
            Some(value) => Ok(value.clone()),
            None => Err(SchemaError::UnknownAttribute {
                kind: entity.kind().name(),
                name: name.to_string(),
            }
            .into()),
        }
    }

    /// Validates, stores a deep copy, and, for synced attributes, commits
    /// one patch. Fails before mutation on unknown names, read-only
    /// attributes and out-of-domain values.
    pub fn set(
        &mut self,
        target: EntityId,
        name: &str,
        value: impl Into<AttrValue>,
    ) -> Result<(), ModelError> {
        self.set_value(target, name, value.into())
    }

    fn set_value(
        &mut self,
        target: EntityId,
        name: &str,
        value: AttrValue,
    ) -> Result<(), ModelError> {
        let Some(entity) = self.entities.get(&target) else {
            return Err(ModelError::UnknownEntity { id: target });
        };
        let kind = entity.kind();
        let schema = schema_for(kind);
        let Some(spec) = schema.get(name) else {
            return Err(SchemaError::UnknownAttribute {
                kind: schema.kind(),
                name: name.to_string(),
            }
            .into());
        };
        if spec.read_only {
            return Err(SchemaError::ImmutableAttribute {
                name: name.to_string(),
            }
            .into());
        }
        let value = schema.conform(name, value)?;

        // Entity-valued attributes must reference live entities of the
        // right kind, and collections stay duplicate-free even when
        // assigned wholesale.
        match &value {
            AttrValue::Entities(ids) => self.validate_entity_list(spec.name, ids)?,
            AttrValue::Entity(id) => {
                if !self.contains(*id) {
                    return Err(ModelError::UnknownEntity { id: *id });
                }
            }
            _ => {}
        }

        // The map context is frozen at construction; a later CRS change
        // must stay within the same context.
        if kind == EntityKind::Map && spec.name == "crs" {
            let next = parse_crs(value.as_str().unwrap_or(""))?;
            let frozen = entity
                .get("context")
                .and_then(AttrValue::as_str)
                .unwrap_or("")
                .to_string();
            if next.context().name() != frozen {
                return Err(SchemaError::OutOfDomain {
                    name: "crs".to_string(),
                    reason: format!(
                        "{} belongs to the {} context, but this map renders {}",
                        next.ident(),
                        next.context(),
                        frozen
                    ),
                }
                .into());
            }
        }

        let attr = spec.name;
        let synced = spec.sync;
        if let Some(entity) = self.entities.get_mut(&target) {
            entity.insert(attr, value.clone());
        }
        if synced {
            self.channel.commit(target, single_change(attr, value.to_wire()));
        }
        self.propagate_links(target, attr);
        Ok(())
    }

    // ---- collections -----------------------------------------------------

    /// Appends a layer to a map or layer group. A basemap descriptor is
    /// materialized first, with its date resolved to yesterday.
    pub fn add_layer(
        &mut self,
        owner: EntityId,
        layer: impl Into<LayerSource>,
    ) -> Result<EntityId, ModelError> {
        self.add_layer_for_day(owner, layer, &Day::default())
    }

    pub fn add_layer_for_day(
        &mut self,
        owner: EntityId,
        layer: impl Into<LayerSource>,
        day: &Day,
    ) -> Result<EntityId, ModelError> {
        let seq = self.layer_collection(owner)?;
        let layer = match layer.into() {
            LayerSource::Existing(id) => {
                self.expect_layer(id)?;
                if seq.contains(&id) {
                    return Err(ModelError::DuplicateEntity { id });
                }
                id
            }
            // A fresh entity cannot collide with anything already there.
            LayerSource::Basemap(basemap) => self.materialize_basemap(&basemap, day)?,
        };
        let mut next = seq;
        next.push(layer);
        self.commit_entity_list(owner, "layers", next);
        Ok(layer)
    }

    /// Removes every occurrence of the layer's id (at most one, given the
    /// uniqueness invariant).
    pub fn remove_layer(&mut self, owner: EntityId, layer: EntityId) -> Result<(), ModelError> {
        let seq = self.layer_collection(owner)?;
        if !seq.contains(&layer) {
            return Err(ModelError::NotFound { id: layer });
        }
        let next: Vec<EntityId> = seq.into_iter().filter(|id| *id != layer).collect();
        self.commit_entity_list(owner, "layers", next);
        Ok(())
    }

    /// Replaces every slot holding `old` with `new`, preserving order.
    pub fn substitute_layer(
        &mut self,
        owner: EntityId,
        old: EntityId,
        new: impl Into<LayerSource>,
    ) -> Result<EntityId, ModelError> {
        let seq = self.layer_collection(owner)?;
        if !seq.contains(&old) {
            return Err(ModelError::NotFound { id: old });
        }
        let new = match new.into() {
            LayerSource::Existing(id) => {
                self.expect_layer(id)?;
                if id != old && seq.contains(&id) {
                    return Err(ModelError::DuplicateEntity { id });
                }
                id
            }
            LayerSource::Basemap(basemap) => self.materialize_basemap(&basemap, &Day::default())?,
        };
        let next: Vec<EntityId> = seq
            .into_iter()
            .map(|id| if id == old { new } else { id })
            .collect();
        self.commit_entity_list(owner, "layers", next);
        Ok(new)
    }

    pub fn clear_layers(&mut self, owner: EntityId) -> Result<(), ModelError> {
        self.layer_collection(owner)?;
        self.commit_entity_list(owner, "layers", Vec::new());
        Ok(())
    }

    pub fn add_control(&mut self, owner: EntityId, control: EntityId) -> Result<(), ModelError> {
        let seq = self.control_collection(owner)?;
        self.expect_control(control)?;
        if seq.contains(&control) {
            return Err(ModelError::DuplicateEntity { id: control });
        }
        let mut next = seq;
        next.push(control);
        self.commit_entity_list(owner, "controls", next);
        Ok(())
    }

    pub fn remove_control(&mut self, owner: EntityId, control: EntityId) -> Result<(), ModelError> {
        let seq = self.control_collection(owner)?;
        if !seq.contains(&control) {
            return Err(ModelError::NotFound { id: control });
        }
        let next: Vec<EntityId> = seq.into_iter().filter(|id| *id != control).collect();
        self.commit_entity_list(owner, "controls", next);
        Ok(())
    }

    pub fn substitute_control(
        &mut self,
        owner: EntityId,
        old: EntityId,
        new: EntityId,
    ) -> Result<(), ModelError> {
        let seq = self.control_collection(owner)?;
        if !seq.contains(&old) {
            return Err(ModelError::NotFound { id: old });
        }
        self.expect_control(new)?;
        if new != old && seq.contains(&new) {
            return Err(ModelError::DuplicateEntity { id: new });
        }
        let next: Vec<EntityId> = seq
            .into_iter()
            .map(|id| if id == old { new } else { id })
            .collect();
        self.commit_entity_list(owner, "controls", next);
        Ok(())
    }

    pub fn clear_controls(&mut self, owner: EntityId) -> Result<(), ModelError> {
        self.control_collection(owner)?;
        self.commit_entity_list(owner, "controls", Vec::new());
        Ok(())
    }

    /// Turns a basemap descriptor into a background tile layer.
    pub fn materialize_basemap(
        &mut self,
        basemap: &Basemap,
        day: &Day,
    ) -> Result<EntityId, ModelError> {
        let config = Config::new()
            .set("url", resolve_url(&basemap.url, day))
            .set("name", basemap.name.clone())
            .set("attribution", basemap.attribution.clone())
            .set("min_zoom", basemap.min_zoom)
            .set("max_zoom", basemap.max_zoom)
            .set("background", true);
        self.create(EntityKind::Layer(LayerKind::Osm), config)
    }

    // ---- events ----------------------------------------------------------

    /// Registers a callback for an event kind. Registering the same
    /// closure twice makes it fire twice.
    pub fn on(
        &mut self,
        target: EntityId,
        kind: EventKind,
        callback: impl FnMut(&Value) + 'static,
    ) -> Result<CallbackId, ModelError> {
        let entity = self
            .entities
            .get_mut(&target)
            .ok_or(ModelError::UnknownEntity { id: target })?;
        Ok(entity.dispatcher_mut().on(kind, Box::new(callback)))
    }

    pub fn off(
        &mut self,
        target: EntityId,
        kind: EventKind,
        id: CallbackId,
    ) -> Result<bool, ModelError> {
        let entity = self
            .entities
            .get_mut(&target)
            .ok_or(ModelError::UnknownEntity { id: target })?;
        Ok(entity.dispatcher_mut().off(kind, id))
    }

    /// Inbound path. Malformed messages (no discriminator) are dropped,
    /// not raised: there is no caller to report to. Returns how many
    /// callbacks ran.
    pub fn deliver(&mut self, target: EntityId, message: &Value) -> usize {
        let Some(entity) = self.entities.get_mut(&target) else {
            tracing::debug!(entity = target.raw(), "dropping inbound message for unknown entity");
            return 0;
        };
        match classify(message) {
            Err(err) => {
                tracing::debug!(entity = target.raw(), %err, "dropping malformed inbound message");
                0
            }
            Ok(Classified::Unknown(kind)) => {
                tracing::trace!(entity = target.raw(), kind, "inbound event of unknown kind");
                0
            }
            Ok(Classified::Event(kind, payload)) => entity.dispatcher_mut().dispatch(kind, payload),
        }
    }

    /// Asks the view to redraw a tile-service layer's tiles, e.g. after a
    /// server-side update.
    pub fn redraw(&mut self, target: EntityId) -> Result<(), ModelError> {
        let entity = self
            .entities
            .get(&target)
            .ok_or(ModelError::UnknownEntity { id: target })?;
        if !entity.kind().is_tile_service() {
            return Err(ModelError::KindMismatch {
                id: target,
                expected: "a tile-service layer",
            });
        }
        self.channel.command(target, "redraw", Value::Null);
        Ok(())
    }

    // ---- links -----------------------------------------------------------

    /// Links two attributes: after every successful commit of `src`, the
    /// same value is assigned to `dst`. The destination takes the source's
    /// current value immediately.
    pub fn link(
        &mut self,
        src: (EntityId, &str),
        dst: (EntityId, &str),
    ) -> Result<LinkId, ModelError> {
        let src_attr = self.writable_attr(src.0, src.1, false)?;
        let dst_attr = self.writable_attr(dst.0, dst.1, true)?;
        let value = self.get(src.0, src_attr)?;
        self.set_value(dst.0, dst_attr, value)?;
        let id = LinkId(self.next_link);
        self.next_link += 1;
        self.links.push(Link {
            id,
            src: (src.0, src_attr),
            dst: (dst.0, dst_attr),
        });
        Ok(id)
    }

    /// Removes a link. Returns whether it existed.
    pub fn unlink(&mut self, id: LinkId) -> bool {
        let before = self.links.len();
        self.links.retain(|link| link.id != id);
        self.links.len() != before
    }

    fn writable_attr(
        &self,
        target: EntityId,
        name: &str,
        must_be_writable: bool,
    ) -> Result<&'static str, ModelError> {
        let entity = self
            .entities
            .get(&target)
            .ok_or(ModelError::UnknownEntity { id: target })?;
        let schema = schema_for(entity.kind());
        let spec = schema.get(name).ok_or_else(|| SchemaError::UnknownAttribute {
            kind: schema.kind(),
            name: name.to_string(),
        })?;
        if must_be_writable && spec.read_only {
            return Err(SchemaError::ImmutableAttribute {
                name: name.to_string(),
            }
            .into());
        }
        Ok(spec.name)
    }

    /// Pushes a committed value through the links rooted at `(src, attr)`.
    /// Propagation failures are logged, not raised, since there is no
    /// caller on this half. A guard cuts cycles.
    fn propagate_links(&mut self, src: EntityId, attr: &'static str) {
        if self.link_guard.contains(&(src, attr)) {
            return;
        }
        let targets: Vec<(LinkId, EntityId, &'static str)> = self
            .links
            .iter()
            .filter(|link| link.src == (src, attr))
            .map(|link| (link.id, link.dst.0, link.dst.1))
            .collect();
        if targets.is_empty() {
            return;
        }
        let Some(value) = self.entities.get(&src).and_then(|e| e.get(attr)).cloned() else {
            return;
        };
        self.link_guard.insert((src, attr));
        for (link, dst, dst_attr) in targets {
            if let Err(err) = self.set_value(dst, dst_attr, value.clone()) {
                tracing::warn!(%link, %err, "dropping link propagation");
            }
        }
        self.link_guard.remove(&(src, attr));
    }

    // ---- internals -------------------------------------------------------

    fn layer_collection(&self, owner: EntityId) -> Result<Vec<EntityId>, ModelError> {
        let entity = self
            .entities
            .get(&owner)
            .ok_or(ModelError::UnknownEntity { id: owner })?;
        if !entity.kind().has_layers() {
            return Err(ModelError::KindMismatch {
                id: owner,
                expected: "a map or layer group",
            });
        }
        Ok(entity.entity_list("layers"))
    }

    fn control_collection(&self, owner: EntityId) -> Result<Vec<EntityId>, ModelError> {
        let entity = self
            .entities
            .get(&owner)
            .ok_or(ModelError::UnknownEntity { id: owner })?;
        if entity.kind() != EntityKind::Map {
            return Err(ModelError::KindMismatch {
                id: owner,
                expected: "a map",
            });
        }
        Ok(entity.entity_list("controls"))
    }

    /// Shared invariant for whole-collection assignment: live entities of
    /// the right kind, each id at most once.
    fn validate_entity_list(&self, attr: &'static str, ids: &[EntityId]) -> Result<(), ModelError> {
        let mut seen: HashSet<EntityId> = HashSet::new();
        for id in ids {
            if !seen.insert(*id) {
                return Err(ModelError::DuplicateEntity { id: *id });
            }
            match attr {
                "layers" => self.expect_layer(*id)?,
                "controls" => self.expect_control(*id)?,
                _ => {
                    if !self.contains(*id) {
                        return Err(ModelError::UnknownEntity { id: *id });
                    }
                }
            }
        }
        Ok(())
    }

    fn expect_layer(&self, id: EntityId) -> Result<(), ModelError> {
        let entity = self
            .entities
            .get(&id)
            .ok_or(ModelError::UnknownEntity { id })?;
        if !entity.kind().is_layer() {
            return Err(ModelError::KindMismatch {
                id,
                expected: "a layer",
            });
        }
        Ok(())
    }

    fn expect_control(&self, id: EntityId) -> Result<(), ModelError> {
        let entity = self
            .entities
            .get(&id)
            .ok_or(ModelError::UnknownEntity { id })?;
        if !entity.kind().is_control() {
            return Err(ModelError::KindMismatch {
                id,
                expected: "a control",
            });
        }
        Ok(())
    }

    /// Commits a whole-collection replacement as one observable unit.
    fn commit_entity_list(&mut self, owner: EntityId, attr: &'static str, seq: Vec<EntityId>) {
        if let Some(entity) = self.entities.get_mut(&owner) {
            entity.insert(attr, AttrValue::Entities(seq.clone()));
        }
        self.channel
            .commit(owner, single_change(attr, AttrValue::Entities(seq).to_wire()));
        self.propagate_links(owner, attr);
    }
}

fn single_change(name: &'static str, value: Value) -> BTreeMap<String, Value> {
    let mut changes = BTreeMap::new();
    changes.insert(name.to_string(), value);
    changes
}

fn parse_crs(ident: &str) -> Result<Crs, ModelError> {
    ident.parse().map_err(|_| {
        SchemaError::OutOfDomain {
            name: "crs".to_string(),
            reason: format!("unknown CRS identifier {ident:?}"),
        }
        .into()
    })
}

fn context_for(
    values: &BTreeMap<&'static str, AttrValue>,
) -> Result<foundation::crs::Context, ModelError> {
    let ident = values.get("crs").and_then(AttrValue::as_str).unwrap_or("");
    Ok(parse_crs(ident)?.context())
}

#[cfg(test)]
mod tests {
    use super::Scene;
    use crate::config::Config;
    use crate::error::ModelError;
    use crate::kind::{ControlKind, EntityKind, LayerKind};
    use catalog::{Basemap, Day};
    use foundation::ids::EntityId;
    use pretty_assertions::assert_eq;
    use schema::{AttrValue, SchemaError};
    use serde_json::{Value, json};
    use std::cell::RefCell;
    use std::rc::Rc;
    use sync::{EventKind, Outbound, RecordingSink};

    fn new_map(scene: &mut Scene<RecordingSink>) -> EntityId {
        scene.create(EntityKind::Map, Config::new()).unwrap()
    }

    fn new_osm(scene: &mut Scene<RecordingSink>) -> EntityId {
        scene
            .create(EntityKind::Layer(LayerKind::Osm), Config::new())
            .unwrap()
    }

    fn layers(scene: &Scene<RecordingSink>, owner: EntityId) -> Vec<EntityId> {
        match scene.get(owner, "layers").unwrap() {
            AttrValue::Entities(ids) => ids,
            other => panic!("layers is not an entity list: {other:?}"),
        }
    }

    fn outbound_count(scene: &Scene<RecordingSink>) -> usize {
        scene.sink().sent().len()
    }

    fn last_patch(scene: &Scene<RecordingSink>) -> (u64, std::collections::BTreeMap<String, Value>) {
        match scene.sink().sent().last().expect("no outbound traffic") {
            Outbound::Patch(patch) => (patch.entity, patch.changes.clone()),
            Outbound::Command(cmd) => panic!("expected patch, got command {cmd:?}"),
        }
    }

    #[test]
    fn opacity_round_trips_within_bounds() {
        let mut scene = Scene::recording();
        let layer = new_osm(&mut scene);
        scene.set(layer, "opacity", 0.25).unwrap();
        assert_eq!(scene.get(layer, "opacity").unwrap(), AttrValue::Float(0.25));
    }

    #[test]
    fn out_of_range_opacity_fails_and_leaves_state_unchanged() {
        let mut scene = Scene::recording();
        let layer = new_osm(&mut scene);
        scene.set(layer, "opacity", 0.4).unwrap();
        let sent_before = outbound_count(&scene);

        let err = scene.set(layer, "opacity", 1.5).unwrap_err();
        assert!(matches!(
            err,
            ModelError::Schema(SchemaError::OutOfDomain { .. })
        ));
        assert_eq!(scene.get(layer, "opacity").unwrap(), AttrValue::Float(0.4));
        assert_eq!(outbound_count(&scene), sent_before);
    }

    #[test]
    fn unknown_config_keys_fail_construction() {
        let mut scene = Scene::recording();
        let err = scene
            .create(
                EntityKind::Layer(LayerKind::Osm),
                Config::new().set("zoom_levels", 3i64),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            ModelError::Schema(SchemaError::UnknownAttribute { .. })
        ));
        assert_eq!(outbound_count(&scene), 0);
    }

    #[test]
    fn read_only_config_keys_fail_construction() {
        let mut scene = Scene::recording();
        let err = scene
            .create(EntityKind::Map, Config::new().set("context", "Planet"))
            .unwrap_err();
        assert!(matches!(
            err,
            ModelError::Schema(SchemaError::ImmutableAttribute { .. })
        ));
    }

    #[test]
    fn duplicate_add_fails_and_length_is_unchanged() {
        let mut scene = Scene::recording();
        let map = new_map(&mut scene);
        let layer = new_osm(&mut scene);
        scene.add_layer(map, layer).unwrap();
        let sent_before = outbound_count(&scene);

        let err = scene.add_layer(map, layer).unwrap_err();
        assert!(matches!(err, ModelError::DuplicateEntity { id } if id == layer));
        assert_eq!(layers(&scene, map).len(), 1);
        assert_eq!(outbound_count(&scene), sent_before);
    }

    #[test]
    fn remove_then_add_restores_the_collection() {
        let mut scene = Scene::recording();
        let map = new_map(&mut scene);
        let layer = new_osm(&mut scene);
        scene.add_layer(map, layer).unwrap();

        scene.remove_layer(map, layer).unwrap();
        assert!(layers(&scene, map).is_empty());
        scene.add_layer(map, layer).unwrap();
        assert_eq!(layers(&scene, map), vec![layer]);
    }

    #[test]
    fn remove_of_absent_layer_is_not_found() {
        let mut scene = Scene::recording();
        let map = new_map(&mut scene);
        let layer = new_osm(&mut scene);
        let err = scene.remove_layer(map, layer).unwrap_err();
        assert!(matches!(err, ModelError::NotFound { id } if id == layer));
    }

    #[test]
    fn substitute_preserves_length_and_position() {
        let mut scene = Scene::recording();
        let map = new_map(&mut scene);
        let first = new_osm(&mut scene);
        let second = new_osm(&mut scene);
        let third = new_osm(&mut scene);
        for layer in [first, second, third] {
            scene.add_layer(map, layer).unwrap();
        }

        let replacement = new_osm(&mut scene);
        scene.substitute_layer(map, second, replacement).unwrap();
        assert_eq!(layers(&scene, map), vec![first, replacement, third]);
    }

    #[test]
    fn substitute_of_absent_layer_is_not_found() {
        let mut scene = Scene::recording();
        let map = new_map(&mut scene);
        let present = new_osm(&mut scene);
        let absent = new_osm(&mut scene);
        scene.add_layer(map, present).unwrap();
        let replacement = new_osm(&mut scene);
        let err = scene.substitute_layer(map, absent, replacement).unwrap_err();
        assert!(matches!(err, ModelError::NotFound { id } if id == absent));
    }

    #[test]
    fn basemap_descriptor_materializes_with_resolved_date() {
        let mut scene = Scene::recording();
        let map = new_map(&mut scene);
        let basemap = Basemap {
            url: "https://x/%s/{z}/{x}/{y}.png".to_string(),
            name: "X".to_string(),
            attribution: "X contributors".to_string(),
            min_zoom: 1,
            max_zoom: 9,
        };
        let layer = scene
            .add_layer_for_day(map, &basemap, &Day::On("2020-01-01".to_string()))
            .unwrap();

        assert_eq!(
            scene.get(layer, "url").unwrap(),
            AttrValue::Str("https://x/2020-01-01/{z}/{x}/{y}.png".to_string())
        );
        assert_eq!(scene.get(layer, "background").unwrap(), AttrValue::Bool(true));
        assert_eq!(scene.get(layer, "max_zoom").unwrap(), AttrValue::Int(9));
        assert_eq!(layers(&scene, map), vec![layer]);
    }

    #[test]
    fn click_callback_fires_once_then_not_after_off() {
        let mut scene = Scene::recording();
        let layer = scene
            .create(EntityKind::Layer(LayerKind::GeoJson), Config::new())
            .unwrap();

        let seen: Rc<RefCell<Vec<Value>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let handle = scene
            .on(layer, EventKind::Click, move |payload| {
                sink.borrow_mut().push(payload.clone());
            })
            .unwrap();

        let message = json!({"type": "click", "feature": {"id": 12}});
        assert_eq!(scene.deliver(layer, &message), 1);
        assert_eq!(*seen.borrow(), vec![message.clone()]);

        assert!(scene.off(layer, EventKind::Click, handle).unwrap());
        assert_eq!(scene.deliver(layer, &message), 0);
        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn sky_crs_yields_sky_context() {
        let mut scene = Scene::recording();
        let map = scene
            .create(EntityKind::Map, Config::new().set("crs", "Galactic"))
            .unwrap();
        assert_eq!(
            scene.get(map, "context").unwrap(),
            AttrValue::Str("Sky".to_string())
        );
    }

    #[test]
    fn context_rejects_direct_writes() {
        let mut scene = Scene::recording();
        let map = new_map(&mut scene);
        let err = scene.set(map, "context", "Sky").unwrap_err();
        assert!(matches!(
            err,
            ModelError::Schema(SchemaError::ImmutableAttribute { .. })
        ));
        assert_eq!(
            scene.get(map, "context").unwrap(),
            AttrValue::Str("Planet".to_string())
        );
    }

    #[test]
    fn crs_changes_may_not_switch_the_frozen_context() {
        let mut scene = Scene::recording();
        let map = new_map(&mut scene);
        // Mars is still a Planet-context CRS.
        scene.set(map, "crs", "IAU2000:49901").unwrap();

        let err = scene.set(map, "crs", "Equatorial").unwrap_err();
        assert!(matches!(
            err,
            ModelError::Schema(SchemaError::OutOfDomain { .. })
        ));
        assert_eq!(
            scene.get(map, "crs").unwrap(),
            AttrValue::Str("IAU2000:49901".to_string())
        );
    }

    #[test]
    fn zoom_opts_distance_must_be_numeric() {
        let mut scene = Scene::recording();
        let map = new_map(&mut scene);
        scene
            .set(map, "zoom_opts", json!({"distance": 7_000_000.0}))
            .unwrap();
        let err = scene
            .set(map, "zoom_opts", json!({"distance": "far"}))
            .unwrap_err();
        assert!(matches!(
            err,
            ModelError::Schema(SchemaError::OutOfDomain { .. })
        ));
    }

    #[test]
    fn each_logical_mutation_is_one_patch() {
        let mut scene = Scene::recording();
        let layer = new_osm(&mut scene);
        assert_eq!(outbound_count(&scene), 1); // initial state

        scene.set(layer, "name", "base").unwrap();
        assert_eq!(outbound_count(&scene), 2);

        let map = new_map(&mut scene);
        scene.add_layer(map, layer).unwrap();
        // one patch for the map creation, one for the collection commit
        assert_eq!(outbound_count(&scene), 4);

        let (entity, changes) = last_patch(&scene);
        assert_eq!(entity, map.raw());
        assert_eq!(changes["layers"], json!([layer.raw()]));
    }

    #[test]
    fn initial_patch_carries_the_full_synced_state() {
        let mut scene = Scene::recording();
        let layer = new_osm(&mut scene);
        let (entity, changes) = last_patch(&scene);
        assert_eq!(entity, layer.raw());
        assert_eq!(changes["opacity"], json!(1.0));
        assert_eq!(changes["visible"], json!(true));
        assert_eq!(changes["url"], json!("https://c.tile.openstreetmap.org"));
        assert!(changes.contains_key("options"));
    }

    #[test]
    fn stored_structures_are_deep_copies() {
        let mut scene = Scene::recording();
        let layer = scene
            .create(EntityKind::Layer(LayerKind::GeoJson), Config::new())
            .unwrap();
        scene
            .set(layer, "data", json!({"type": "Feature", "properties": {}}))
            .unwrap();

        // Mutating a read-back copy must not touch the stored value.
        if let AttrValue::Json(mut copy) = scene.get(layer, "data").unwrap() {
            copy["type"] = json!("FeatureCollection");
        }
        assert_eq!(
            scene.get(layer, "data").unwrap(),
            AttrValue::Json(json!({"type": "Feature", "properties": {}}))
        );
    }

    #[test]
    fn malformed_inbound_messages_are_dropped() {
        let mut scene = Scene::recording();
        let layer = new_osm(&mut scene);
        assert_eq!(scene.deliver(layer, &json!({"feature": {"id": 1}})), 0);
        assert_eq!(scene.deliver(layer, &json!("click")), 0);
        assert_eq!(scene.deliver(EntityId::new(999), &json!({"type": "click"})), 0);
    }

    #[test]
    fn options_are_derived_from_the_schema() {
        let mut scene = Scene::recording();
        let wms = scene
            .create(EntityKind::Layer(LayerKind::Wms), Config::new())
            .unwrap();
        let AttrValue::StrList(options) = scene.get(wms, "options").unwrap() else {
            panic!("options is not a string list");
        };
        for name in ["min_zoom", "max_zoom", "attribution", "layers", "format", "transparent"] {
            assert!(options.contains(&name.to_string()), "missing {name}");
        }
        assert!(!options.contains(&"url".to_string()));
    }

    #[test]
    fn groups_hold_layers_like_maps_do() {
        let mut scene = Scene::recording();
        let group = scene
            .create(EntityKind::Layer(LayerKind::Group), Config::new())
            .unwrap();
        let layer = new_osm(&mut scene);
        scene.add_layer(group, layer).unwrap();
        assert_eq!(layers(&scene, group), vec![layer]);

        let other = new_osm(&mut scene);
        let err = scene.add_layer(layer, other).unwrap_err();
        assert!(matches!(err, ModelError::KindMismatch { .. }));
    }

    #[test]
    fn controls_have_their_own_collection() {
        let mut scene = Scene::recording();
        let map = new_map(&mut scene);
        let zoom = scene
            .create(EntityKind::Control(ControlKind::Zoom), Config::new())
            .unwrap();
        scene.add_control(map, zoom).unwrap();

        let err = scene.add_control(map, zoom).unwrap_err();
        assert!(matches!(err, ModelError::DuplicateEntity { .. }));

        scene.remove_control(map, zoom).unwrap();
        let err = scene.remove_control(map, zoom).unwrap_err();
        assert!(matches!(err, ModelError::NotFound { .. }));
    }

    #[test]
    fn layers_cannot_join_the_controls_collection() {
        let mut scene = Scene::recording();
        let map = new_map(&mut scene);
        let layer = new_osm(&mut scene);
        let err = scene.add_control(map, layer).unwrap_err();
        assert!(matches!(err, ModelError::KindMismatch { .. }));
    }

    #[test]
    fn wholesale_collection_assignment_keeps_the_invariants() {
        let mut scene = Scene::recording();
        let map = new_map(&mut scene);
        let a = new_osm(&mut scene);
        let b = new_osm(&mut scene);

        scene.set(map, "layers", vec![a, b]).unwrap();
        assert_eq!(layers(&scene, map), vec![a, b]);

        let err = scene.set(map, "layers", vec![a, a]).unwrap_err();
        assert!(matches!(err, ModelError::DuplicateEntity { id } if id == a));

        let zoom = scene
            .create(EntityKind::Control(ControlKind::Zoom), Config::new())
            .unwrap();
        let err = scene.set(map, "layers", vec![a, zoom]).unwrap_err();
        assert!(matches!(err, ModelError::KindMismatch { .. }));

        let err = scene
            .set(map, "layers", vec![EntityId::new(999)])
            .unwrap_err();
        assert!(matches!(err, ModelError::UnknownEntity { .. }));
        assert_eq!(layers(&scene, map), vec![a, b]);
    }

    #[test]
    fn clear_layers_empties_in_one_commit() {
        let mut scene = Scene::recording();
        let map = new_map(&mut scene);
        let osm1 = new_osm(&mut scene);
        scene.add_layer(map, osm1).unwrap();
        let osm2 = new_osm(&mut scene);
        scene.add_layer(map, osm2).unwrap();
        let sent_before = outbound_count(&scene);

        scene.clear_layers(map).unwrap();
        assert!(layers(&scene, map).is_empty());
        assert_eq!(outbound_count(&scene), sent_before + 1);
    }

    #[test]
    fn links_propagate_until_unlinked() {
        let mut scene = Scene::recording();
        let a = new_osm(&mut scene);
        let b = new_osm(&mut scene);
        scene.set(a, "opacity", 0.5).unwrap();

        let link = scene.link((a, "opacity"), (b, "opacity")).unwrap();
        // the destination takes the source's current value immediately
        assert_eq!(scene.get(b, "opacity").unwrap(), AttrValue::Float(0.5));

        scene.set(a, "opacity", 0.25).unwrap();
        assert_eq!(scene.get(b, "opacity").unwrap(), AttrValue::Float(0.25));

        assert!(scene.unlink(link));
        scene.set(a, "opacity", 0.75).unwrap();
        assert_eq!(scene.get(b, "opacity").unwrap(), AttrValue::Float(0.25));
    }

    #[test]
    fn link_cycles_terminate() {
        let mut scene = Scene::recording();
        let a = new_osm(&mut scene);
        let b = new_osm(&mut scene);
        scene.link((a, "opacity"), (b, "opacity")).unwrap();
        scene.link((b, "opacity"), (a, "opacity")).unwrap();

        scene.set(a, "opacity", 0.1).unwrap();
        assert_eq!(scene.get(a, "opacity").unwrap(), AttrValue::Float(0.1));
        assert_eq!(scene.get(b, "opacity").unwrap(), AttrValue::Float(0.1));
    }

    #[test]
    fn links_refuse_read_only_destinations() {
        let mut scene = Scene::recording();
        let a = new_map(&mut scene);
        let b = new_map(&mut scene);
        let err = scene.link((a, "crs"), (b, "context")).unwrap_err();
        assert!(matches!(
            err,
            ModelError::Schema(SchemaError::ImmutableAttribute { .. })
        ));
    }

    #[test]
    fn redraw_is_a_command_for_tile_services_only() {
        let mut scene = Scene::recording();
        let osm = new_osm(&mut scene);
        scene.redraw(osm).unwrap();
        match scene.sink().sent().last().unwrap() {
            Outbound::Command(cmd) => {
                assert_eq!(cmd.entity, osm.raw());
                assert_eq!(cmd.msg, "redraw");
            }
            Outbound::Patch(_) => panic!("expected command"),
        }

        let geojson = scene
            .create(EntityKind::Layer(LayerKind::GeoJson), Config::new())
            .unwrap();
        assert!(matches!(
            scene.redraw(geojson).unwrap_err(),
            ModelError::KindMismatch { .. }
        ));
    }
}
