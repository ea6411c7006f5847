/// Validation failures raised before any state is mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// The attribute name is not declared by the entity's schema.
    UnknownAttribute { kind: &'static str, name: String },
    /// The value is outside the attribute's declared domain.
    OutOfDomain { name: String, reason: String },
    /// Write attempt on a derived or read-only attribute.
    ImmutableAttribute { name: String },
}

impl std::fmt::Display for SchemaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemaError::UnknownAttribute { kind, name } => {
                write!(f, "{kind} has no attribute named {name:?}")
            }
            SchemaError::OutOfDomain { name, reason } => {
                write!(f, "invalid value for attribute {name:?}: {reason}")
            }
            SchemaError::ImmutableAttribute { name } => {
                write!(f, "attribute {name:?} is read-only")
            }
        }
    }
}

impl std::error::Error for SchemaError {}
