pub mod crs;
pub mod geo;
pub mod ids;

// Foundation crate: small, well-tested primitives only.
pub use crs::*;
pub use geo::*;
pub use ids::*;
