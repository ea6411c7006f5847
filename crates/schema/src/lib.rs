//! Declarative attribute schemas for synced entities.
//!
//! Every entity kind declares, per attribute: a value domain, a default,
//! whether commits are mirrored to the view, and whether the attribute is
//! one of the kind's configuration options. Validation always runs before
//! state is touched.

pub mod error;
pub mod spec;
pub mod value;

pub use error::SchemaError;
pub use spec::{AttrDomain, AttrSpec, EntitySchema, SchemaBuilder};
pub use value::AttrValue;
