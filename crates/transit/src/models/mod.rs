//! Route data models and types.

pub mod types;

// Re-exports for convenience
pub use types::{
    ResolutionSource, ResolvedStop, Result, ShapePoint, Stop, TransitError, Vehicle, VehicleEta,
};
