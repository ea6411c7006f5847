//! Host-side entity model for the globe viewer: layers, controls and maps
//! as schema-typed entities in a single-owner [`scene::Scene`], mirrored to
//! a remote view through the sync channel.

pub mod config;
pub mod entity;
pub mod error;
pub mod export;
pub mod kind;
pub mod scene;
pub mod schemas;

pub use config::Config;
pub use entity::Entity;
pub use error::ModelError;
pub use kind::{ControlKind, EntityKind, LayerKind};
pub use scene::{LayerSource, LinkId, Scene};
pub use schemas::schema_for;
