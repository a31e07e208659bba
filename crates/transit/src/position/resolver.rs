//! Current-stop resolution for a single vehicle.
//!
//! A stop id reported by the vehicle feed wins whenever it names a stop on the
//! route. Otherwise the stop is inferred from the vehicle's coordinates: the
//! geographically nearest stop by great-circle distance, with exact ties going
//! to the lower sequence.

use std::collections::HashMap;

use crate::identifiers::StopIdentifier;
use crate::models::types::*;
use crate::spatial::StopIndex;

/// Resolver bound to one route's stop list.
///
/// Build it once per stop list and reuse it for every vehicle of every poll.
#[derive(Clone)]
pub struct StopSequenceResolver {
    stops: Vec<Stop>,
    by_id: HashMap<StopIdentifier, usize>,
    index: StopIndex,
}

impl StopSequenceResolver {
    pub fn new(stops: &[Stop]) -> Self {
        let by_id = stops
            .iter()
            .enumerate()
            .map(|(slot, stop)| (stop.id.clone(), slot))
            .collect();

        Self {
            stops: stops.to_vec(),
            by_id,
            index: StopIndex::new(stops),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    /// Resolve the vehicle's current stop.
    ///
    /// Fails with [`TransitError::UnresolvedPosition`] when there are no stops to
    /// derive a position from.
    pub fn resolve(&self, vehicle: &Vehicle) -> Result<ResolvedStop> {
        if let Some(slot) = vehicle
            .reported_stop_ids
            .iter()
            .find_map(|id| self.by_id.get(id))
        {
            return Ok(self.resolved(*slot, ResolutionSource::Live));
        }

        self.index
            .nearest(vehicle.location)
            .map(|slot| self.resolved(slot, ResolutionSource::Derived))
            .ok_or(TransitError::UnresolvedPosition)
    }

    /// Resolve and attach the result to the vehicle; an unresolved vehicle is
    /// left with no current stop.
    pub fn annotate(&self, mut vehicle: Vehicle) -> Vehicle {
        vehicle.resolved = self.resolve(&vehicle).ok();
        vehicle
    }

    fn resolved(&self, slot: usize, source: ResolutionSource) -> ResolvedStop {
        let stop = &self.stops[slot];
        ResolvedStop {
            stop_id: stop.id.clone(),
            sequence: stop.sequence,
            source,
        }
    }
}

/// One-shot resolution against a stop list.
pub fn resolve(vehicle: &Vehicle, stops: &[Stop]) -> Result<ResolvedStop> {
    StopSequenceResolver::new(stops).resolve(vehicle)
}
