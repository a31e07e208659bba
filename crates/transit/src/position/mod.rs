//! Where a vehicle is along the route, and where every stop sits relative to it.

pub mod classifier;
pub mod resolver;

pub use classifier::{classify, classify_sequence, ClassifiedStop, StopState};
pub use resolver::{resolve, StopSequenceResolver};
