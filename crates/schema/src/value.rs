use foundation::geo::LngLat;
use foundation::ids::EntityId;
use serde_json::Value;

/// Owned attribute value.
///
/// `Clone` is deep: the model stores and hands out copies, so in-place
/// aliasing of nested structures can never leak past a commit. The sync
/// layer only sees whole values.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    StrList(Vec<String>),
    /// Structured mapping or sequence, kept as raw JSON.
    Json(Value),
    Entity(EntityId),
    Entities(Vec<EntityId>),
}

impl AttrValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            AttrValue::Null => "null",
            AttrValue::Bool(_) => "bool",
            AttrValue::Int(_) => "int",
            AttrValue::Float(_) => "float",
            AttrValue::Str(_) => "string",
            AttrValue::StrList(_) => "string list",
            AttrValue::Json(_) => "json",
            AttrValue::Entity(_) => "entity",
            AttrValue::Entities(_) => "entity list",
        }
    }

    /// Wire form of the value. Entity references collapse to their ids.
    pub fn to_wire(&self) -> Value {
        match self {
            AttrValue::Null => Value::Null,
            AttrValue::Bool(b) => Value::from(*b),
            AttrValue::Int(n) => Value::from(*n),
            AttrValue::Float(x) => Value::from(*x),
            AttrValue::Str(s) => Value::from(s.as_str()),
            AttrValue::StrList(items) => Value::from(items.clone()),
            AttrValue::Json(v) => v.clone(),
            AttrValue::Entity(id) => Value::from(id.raw()),
            AttrValue::Entities(ids) => {
                Value::from(ids.iter().map(|id| id.raw()).collect::<Vec<u64>>())
            }
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_entities(&self) -> Option<&[EntityId]> {
        match self {
            AttrValue::Entities(ids) => Some(ids),
            _ => None,
        }
    }
}

impl From<bool> for AttrValue {
    fn from(b: bool) -> Self {
        AttrValue::Bool(b)
    }
}

impl From<i64> for AttrValue {
    fn from(n: i64) -> Self {
        AttrValue::Int(n)
    }
}

impl From<f64> for AttrValue {
    fn from(x: f64) -> Self {
        AttrValue::Float(x)
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::Str(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        AttrValue::Str(s)
    }
}

impl From<Vec<String>> for AttrValue {
    fn from(items: Vec<String>) -> Self {
        AttrValue::StrList(items)
    }
}

impl From<Value> for AttrValue {
    fn from(v: Value) -> Self {
        AttrValue::Json(v)
    }
}

impl From<EntityId> for AttrValue {
    fn from(id: EntityId) -> Self {
        AttrValue::Entity(id)
    }
}

impl From<Vec<EntityId>> for AttrValue {
    fn from(ids: Vec<EntityId>) -> Self {
        AttrValue::Entities(ids)
    }
}

impl From<LngLat> for AttrValue {
    fn from(p: LngLat) -> Self {
        AttrValue::Json(Value::from(vec![p.lon, p.lat]))
    }
}

#[cfg(test)]
mod tests {
    use super::AttrValue;
    use foundation::ids::EntityId;
    use serde_json::json;

    #[test]
    fn entity_references_serialize_to_ids() {
        let v = AttrValue::Entities(vec![EntityId::new(3), EntityId::new(7)]);
        assert_eq!(v.to_wire(), json!([3, 7]));
        assert_eq!(AttrValue::Entity(EntityId::new(4)).to_wire(), json!(4));
    }

    #[test]
    fn clone_is_deep_for_json() {
        let v = AttrValue::Json(json!({"a": {"b": 1}}));
        let mut copy = v.clone();
        if let AttrValue::Json(inner) = &mut copy {
            inner["a"]["b"] = json!(2);
        }
        assert_eq!(v.to_wire(), json!({"a": {"b": 1}}));
    }
}
