use crate::error::SchemaError;
use crate::value::AttrValue;

/// Declared value domain for one attribute.
#[derive(Debug, Clone)]
pub enum AttrDomain {
    Bool,
    Int {
        min: Option<i64>,
        max: Option<i64>,
    },
    Float {
        min: Option<f64>,
        max: Option<f64>,
    },
    Str,
    /// String drawn from a fixed set.
    OneOf(&'static [&'static str]),
    StrList,
    /// Structured mapping or sequence, unconstrained.
    Json,
    /// Structured mapping whose listed keys, when present, must be numeric.
    MapNumericKeys(&'static [&'static str]),
    /// `[lon, lat]` pair of finite numbers.
    LngLatPair,
    Entity,
    Entities,
}

impl AttrDomain {
    /// Validates a value against the domain, coercing where the domain
    /// allows it (integers widen to floats). Returns the canonical value.
    pub fn conform(&self, value: AttrValue) -> Result<AttrValue, String> {
        match (self, value) {
            (AttrDomain::Bool, v @ AttrValue::Bool(_)) => Ok(v),
            (AttrDomain::Int { min, max }, AttrValue::Int(n)) => {
                if min.is_some_and(|lo| n < lo) || max.is_some_and(|hi| n > hi) {
                    Err(format!("{n} is outside {}", bounds_str(*min, *max)))
                } else {
                    Ok(AttrValue::Int(n))
                }
            }
            (AttrDomain::Float { .. }, AttrValue::Int(n)) => {
                self.conform(AttrValue::Float(n as f64))
            }
            (AttrDomain::Float { min, max }, AttrValue::Float(x)) => {
                if !x.is_finite() {
                    Err(format!("{x} is not a finite number"))
                } else if min.is_some_and(|lo| x < lo) || max.is_some_and(|hi| x > hi) {
                    Err(format!("{x} is outside {}", bounds_str(*min, *max)))
                } else {
                    Ok(AttrValue::Float(x))
                }
            }
            (AttrDomain::Str, v @ AttrValue::Str(_)) => Ok(v),
            (AttrDomain::OneOf(allowed), AttrValue::Str(s)) => {
                if allowed.contains(&s.as_str()) {
                    Ok(AttrValue::Str(s))
                } else {
                    Err(format!("{s:?} is not one of {allowed:?}"))
                }
            }
            (AttrDomain::StrList, v @ AttrValue::StrList(_)) => Ok(v),
            (AttrDomain::Json, v @ AttrValue::Json(_)) => Ok(v),
            (AttrDomain::MapNumericKeys(keys), AttrValue::Json(v)) => {
                let Some(map) = v.as_object() else {
                    return Err("expected a mapping".to_string());
                };
                for key in *keys {
                    if let Some(entry) = map.get(*key) {
                        if !entry.is_number() {
                            return Err(format!("key {key:?} must be numeric"));
                        }
                    }
                }
                Ok(AttrValue::Json(v))
            }
            (AttrDomain::LngLatPair, AttrValue::Json(v)) => {
                let ok = v.as_array().is_some_and(|pair| {
                    pair.len() == 2
                        && pair
                            .iter()
                            .all(|c| c.as_f64().is_some_and(|x| x.is_finite()))
                });
                if ok {
                    Ok(AttrValue::Json(v))
                } else {
                    Err("expected a [lon, lat] pair of finite numbers".to_string())
                }
            }
            (AttrDomain::Entity, v @ AttrValue::Entity(_)) => Ok(v),
            (AttrDomain::Entities, v @ AttrValue::Entities(_)) => Ok(v),
            (_, v) => Err(format!("unexpected {} value", v.type_name())),
        }
    }
}

fn bounds_str(min: Option<impl std::fmt::Display>, max: Option<impl std::fmt::Display>) -> String {
    match (min, max) {
        (Some(lo), Some(hi)) => format!("[{lo}, {hi}]"),
        (Some(lo), None) => format!("[{lo}, ..]"),
        (None, Some(hi)) => format!("[.., {hi}]"),
        (None, None) => "any range".to_string(),
    }
}

/// One declared attribute: domain, default, and how it behaves.
#[derive(Debug, Clone)]
pub struct AttrSpec {
    pub name: &'static str,
    pub domain: AttrDomain,
    pub default: AttrValue,
    /// Mirrored to the view on every commit.
    pub sync: bool,
    /// Listed in the entity's derived `options` attribute.
    pub option: bool,
    /// Derived value; external writes fail.
    pub read_only: bool,
    /// Accepts `Null` in place of a domain value.
    pub nullable: bool,
}

impl AttrSpec {
    pub fn new(name: &'static str, domain: AttrDomain, default: AttrValue) -> Self {
        AttrSpec {
            name,
            domain,
            default,
            sync: true,
            option: false,
            read_only: false,
            nullable: false,
        }
    }

    pub fn option(mut self) -> Self {
        self.option = true;
        self
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn unsynced(mut self) -> Self {
        self.sync = false;
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }
}

/// Declarative attribute set for one entity kind. Built once at startup,
/// never discovered per-instance.
#[derive(Debug, Clone)]
pub struct EntitySchema {
    kind: &'static str,
    attrs: Vec<AttrSpec>,
}

impl EntitySchema {
    pub fn builder(kind: &'static str) -> SchemaBuilder {
        SchemaBuilder {
            kind,
            attrs: Vec::new(),
        }
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn get(&self, name: &str) -> Option<&AttrSpec> {
        self.attrs.iter().find(|a| a.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AttrSpec> {
        self.attrs.iter()
    }

    /// Names flagged as configuration options, in declaration order.
    /// Derived from the schema, not from live values.
    pub fn options(&self) -> Vec<String> {
        self.attrs
            .iter()
            .filter(|a| a.option)
            .map(|a| a.name.to_string())
            .collect()
    }

    /// Materializes the default value of every attribute.
    pub fn defaults(&self) -> Vec<(&'static str, AttrValue)> {
        self.attrs
            .iter()
            .map(|a| (a.name, a.default.clone()))
            .collect()
    }

    /// Validates `value` for the named attribute. Fails on unknown names
    /// and out-of-domain values; read-only enforcement is the caller's
    /// concern (internal recomputes are allowed to write).
    pub fn conform(&self, name: &str, value: AttrValue) -> Result<AttrValue, SchemaError> {
        let spec = self.get(name).ok_or_else(|| SchemaError::UnknownAttribute {
            kind: self.kind,
            name: name.to_string(),
        })?;
        if spec.nullable && matches!(value, AttrValue::Null) {
            return Ok(AttrValue::Null);
        }
        spec.domain
            .conform(value)
            .map_err(|reason| SchemaError::OutOfDomain {
                name: name.to_string(),
                reason,
            })
    }
}

/// Builds an [`EntitySchema`]; duplicate names and defaults outside their
/// own domain are schema-author errors and panic at startup.
#[derive(Debug)]
pub struct SchemaBuilder {
    kind: &'static str,
    attrs: Vec<AttrSpec>,
}

impl SchemaBuilder {
    pub fn attr(mut self, spec: AttrSpec) -> Self {
        assert!(
            self.attrs.iter().all(|a| a.name != spec.name),
            "duplicate attribute {:?} on {}",
            spec.name,
            self.kind
        );
        if !(spec.nullable && matches!(spec.default, AttrValue::Null)) {
            assert!(
                spec.domain.conform(spec.default.clone()).is_ok(),
                "default for {}.{} is outside its own domain",
                self.kind,
                spec.name
            );
        }
        self.attrs.push(spec);
        self
    }

    pub fn build(self) -> EntitySchema {
        EntitySchema {
            kind: self.kind,
            attrs: self.attrs,
        }
    }
}
