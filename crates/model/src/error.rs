use foundation::ids::EntityId;
use schema::SchemaError;

/// Errors raised synchronously by mutating operations. State is never
/// partially committed: a failed operation leaves the scene unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    Schema(SchemaError),
    /// The id names no entity in this scene.
    UnknownEntity { id: EntityId },
    /// Add of an identity already present in the collection.
    DuplicateEntity { id: EntityId },
    /// Remove/substitute of an identity absent from the collection.
    NotFound { id: EntityId },
    /// The entity is not of the kind the operation applies to.
    KindMismatch {
        id: EntityId,
        expected: &'static str,
    },
    /// The configuration object itself is not usable (not a mapping).
    InvalidConfig(String),
    Io(String),
}

impl std::fmt::Display for ModelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelError::Schema(err) => err.fmt(f),
            ModelError::UnknownEntity { id } => write!(f, "no entity with id {id} in this scene"),
            ModelError::DuplicateEntity { id } => {
                write!(f, "entity {id} is already in the collection, only use each entity once")
            }
            ModelError::NotFound { id } => write!(f, "entity {id} is not in the collection"),
            ModelError::KindMismatch { id, expected } => {
                write!(f, "entity {id} is not {expected}")
            }
            ModelError::InvalidConfig(msg) => write!(f, "invalid configuration: {msg}"),
            ModelError::Io(msg) => write!(f, "write failed: {msg}"),
        }
    }
}

impl std::error::Error for ModelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ModelError::Schema(err) => Some(err),
            _ => None,
        }
    }
}

impl From<SchemaError> for ModelError {
    fn from(err: SchemaError) -> Self {
        ModelError::Schema(err)
    }
}
