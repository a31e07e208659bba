//! # bustrack-transit
//!
//! Typed model and position logic for tracking buses along a single route.
//!
//! ## Features
//!
//! - **Typed identifiers**: cheap `Arc<str>` ids for stops, routes and buses
//! - **Stop resolution**: trust a live-reported stop, or derive the nearest one
//! - **Classification**: label every stop relative to a vehicle and a target
//!
//! ## Example
//!
//! ```
//! use bustrack_transit::prelude::*;
//! use geo::Point;
//!
//! let stops = vec![
//!     Stop::new("s1", "Pasar Seni", 1, Point::new(101.6953, 3.1422)),
//!     Stop::new("s2", "Merdeka", 2, Point::new(101.7020, 3.1390)),
//!     Stop::new("s3", "Bukit Bintang", 3, Point::new(101.7114, 3.1466)),
//! ];
//!
//! let vehicle = Vehicle::new("WB1234", "T7890", 3.1391, 101.7018);
//! let current = resolve(&vehicle, &stops).unwrap();
//! assert_eq!(current.stop_id.as_str(), "s2");
//! assert_eq!(current.source, ResolutionSource::Derived);
//!
//! let labels = classify(&stops, Some(current.sequence), Some(3));
//! assert_eq!(labels[0].state, StopState::Passed);
//! assert_eq!(labels[2].state, StopState::Target);
//! ```

pub mod identifiers;
pub mod models;
pub mod position;
pub mod provider;
pub mod spatial;

// Re-exports for convenience
pub mod prelude {
    pub use crate::identifiers::*;
    pub use crate::models::types::*;
    pub use crate::position::{
        classify, classify_sequence, resolve, ClassifiedStop, StopSequenceResolver, StopState,
    };
    pub use crate::provider::RouteView;
}

pub use prelude::*;
