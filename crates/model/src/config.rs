use schema::AttrValue;
use serde_json::Value;

use crate::error::ModelError;

/// Initial attribute values for [`crate::scene::Scene::create`].
///
/// Recognized keys are exactly the target schema's attribute names;
/// unknown keys fail construction before anything is committed.
#[derive(Debug, Clone, Default)]
pub struct Config {
    entries: Vec<(String, AttrValue)>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.entries.push((name.into(), value.into()));
        self
    }

    /// Builds a configuration from a plain JSON mapping. Scalars map to
    /// their scalar values; arrays and objects stay structured.
    pub fn from_value(value: Value) -> Result<Config, ModelError> {
        let Value::Object(map) = value else {
            return Err(ModelError::InvalidConfig(
                "configuration must be a mapping".to_string(),
            ));
        };
        let mut config = Config::new();
        for (name, value) in map {
            config.entries.push((name, json_to_attr(value)));
        }
        Ok(config)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn entries(&self) -> impl Iterator<Item = &(String, AttrValue)> {
        self.entries.iter()
    }
}

fn json_to_attr(value: Value) -> AttrValue {
    match value {
        Value::Null => AttrValue::Null,
        Value::Bool(b) => AttrValue::Bool(b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => AttrValue::Int(i),
            None => AttrValue::Float(n.as_f64().unwrap_or(f64::NAN)),
        },
        Value::String(s) => AttrValue::Str(s),
        structured => AttrValue::Json(structured),
    }
}
