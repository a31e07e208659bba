//! Wire types for the bus tracking backend.
//!
//! Payloads are loosely typed upstream. [`normalize`] turns them into the
//! concrete records in [`records`] so that nothing past this crate has to
//! sniff shapes at runtime.

mod lenient;
pub mod normalize;
pub mod records;

pub use records::*;
