//! In-memory view of the tracked route: stops, shape and lookups.
//!
//! Stops and shape are immutable for a route view. They are kept sorted by
//! sequence, and the stop resolver is rebuilt only when the stop list changes.

use std::collections::HashMap;

use crate::identifiers::*;
use crate::models::types::*;
use crate::position::{classify, ClassifiedStop, StopSequenceResolver};

#[derive(Clone)]
pub struct RouteView {
    pub route_id: RouteIdentifier,
    pub short_name: String,
    pub long_name: String,

    stops: Vec<Stop>,
    shape: Vec<ShapePoint>,

    // Lookup maps
    stop_slots: HashMap<StopIdentifier, usize>,
    resolver: StopSequenceResolver,
}

impl RouteView {
    /// Create an empty view for a route
    pub fn new(route_id: RouteIdentifier) -> Self {
        Self {
            route_id,
            short_name: String::new(),
            long_name: String::new(),
            stops: Vec::new(),
            shape: Vec::new(),
            stop_slots: HashMap::new(),
            resolver: StopSequenceResolver::new(&[]),
        }
    }

    /// Replace the stop list. Stops are sorted by sequence.
    ///
    /// Returns `Err` if two stops share a sequence.
    pub fn set_stops(&mut self, mut stops: Vec<Stop>) -> Result<()> {
        stops.sort_by_key(|s| s.sequence);

        if let Some(pair) = stops.windows(2).find(|w| w[0].sequence == w[1].sequence) {
            return Err(TransitError::InvalidData(format!(
                "Stops {} and {} share sequence {}",
                pair[0].id, pair[1].id, pair[0].sequence
            )));
        }

        self.stop_slots = stops
            .iter()
            .enumerate()
            .map(|(slot, s)| (s.id.clone(), slot))
            .collect();
        self.resolver = StopSequenceResolver::new(&stops);
        self.stops = stops;
        Ok(())
    }

    /// Replace the route polyline. Points are sorted by sequence.
    pub fn set_shape(&mut self, mut shape: Vec<ShapePoint>) {
        shape.sort_by_key(|p| p.sequence);
        self.shape = shape;
    }

    pub fn stops(&self) -> &[Stop] {
        &self.stops
    }

    pub fn shape(&self) -> &[ShapePoint] {
        &self.shape
    }

    pub fn resolver(&self) -> &StopSequenceResolver {
        &self.resolver
    }

    pub fn stop(&self, id: &StopIdentifier) -> Option<&Stop> {
        self.stop_slots.get(id).map(|slot| &self.stops[*slot])
    }

    pub fn stop_name(&self, id: &StopIdentifier) -> Option<&str> {
        self.stop(id).map(|s| s.name.as_str())
    }

    pub fn sequence_of(&self, id: &StopIdentifier) -> Option<u32> {
        self.stop(id).map(|s| s.sequence)
    }

    /// Classify every stop against a vehicle and an optional target stop.
    pub fn classify_for(
        &self,
        vehicle: Option<&Vehicle>,
        target: Option<&StopIdentifier>,
    ) -> Vec<ClassifiedStop> {
        let current = vehicle.and_then(|v| v.resolved_sequence());
        let target = target.and_then(|id| self.sequence_of(id));
        classify(&self.stops, current, target)
    }
}
