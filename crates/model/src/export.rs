//! Static-document export.
//!
//! Serializes a map and everything it transitively references into the
//! wire-format state document and wraps it in a minimal HTML shell. Turning
//! that shell into a live page is the external embedding toolchain's job.

use std::collections::BTreeSet;
use std::io::Write;

use foundation::ids::EntityId;
use schema::AttrValue;
use serde_json::{Map, Value, json};
use sync::PatchSink;

use crate::error::ModelError;
use crate::scene::Scene;
use crate::schemas::schema_for;

impl<S: PatchSink> Scene<S> {
    /// Full synced state of `root` and every entity reachable from it:
    /// entity id → attribute name → wire value. Entity-valued attributes
    /// serialize to their id(s).
    pub fn state_document(&self, root: EntityId) -> Result<Value, ModelError> {
        let mut entities = Map::new();
        let mut queue = vec![root];
        let mut seen: BTreeSet<EntityId> = BTreeSet::new();

        while let Some(id) = queue.pop() {
            if !seen.insert(id) {
                continue;
            }
            let entity = self.entity(id).ok_or(ModelError::UnknownEntity { id })?;
            let schema = schema_for(entity.kind());
            let mut state = Map::new();
            for spec in schema.iter().filter(|s| s.sync) {
                let Some(value) = entity.get(spec.name) else {
                    continue;
                };
                match value {
                    AttrValue::Entity(child) => queue.push(*child),
                    AttrValue::Entities(children) => queue.extend(children.iter().copied()),
                    _ => {}
                }
                state.insert(spec.name.to_string(), value.to_wire());
            }
            entities.insert(
                id.to_string(),
                json!({"kind": entity.kind().name(), "state": Value::Object(state)}),
            );
        }

        Ok(json!({
            "version": 1,
            "root": root.raw(),
            "entities": Value::Object(entities),
        }))
    }

    /// Writes the state document into a static HTML page.
    pub fn save_html(&self, root: EntityId, out: &mut dyn Write) -> Result<(), ModelError> {
        let document = self.state_document(root)?;
        let state =
            serde_json::to_string_pretty(&document).map_err(|e| ModelError::Io(e.to_string()))?;
        let html = format!(
            "<!DOCTYPE html>\n\
             <html>\n\
             <head>\n\
             <meta charset=\"utf-8\" />\n\
             <title>Globe scene</title>\n\
             </head>\n\
             <body>\n\
             <div id=\"viewer\" data-root=\"{root}\"></div>\n\
             <script type=\"application/json\" id=\"scene-state\">\n\
             {state}\n\
             </script>\n\
             </body>\n\
             </html>\n"
        );
        out.write_all(html.as_bytes())
            .map_err(|e| ModelError::Io(e.to_string()))
    }
}
