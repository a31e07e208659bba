//! R-tree nodes for stop lookups.
//!
//! ## Two-Stage Filtering
//!
//! Nearest-stop queries use a two-stage approach:
//! 1. **R-tree filter**: Euclidean distance over unit-sphere coordinates, which
//!    orders stops exactly like great-circle distance does
//! 2. **Haversine re-rank**: candidates within floating tolerance of the best
//!    chord distance are compared by Haversine distance, then by the lower
//!    stop sequence
//!
//! Step 2 makes the tie-break deterministic when two stops are equidistant.

use geo::Point;
use rstar::{PointDistance, RTree, RTreeObject, AABB};

use crate::models::types::Stop;
use crate::spatial::queries::{haversine_distance, to_unit_vector};

/// Relative slack applied to the best chord distance when collecting tie candidates.
const TIE_TOLERANCE: f64 = 1e-9;

// ============================================================================
// Stop Spatial Node
// ============================================================================

#[derive(Clone, Debug)]
pub struct StopNode {
    /// Position of the stop in the slice the index was built from.
    pub slot: usize,
    pub sequence: u32,
    pub location: Point,
    point: [f64; 3],
}

impl StopNode {
    pub fn new(slot: usize, stop: &Stop) -> Self {
        Self {
            slot,
            sequence: stop.sequence,
            location: stop.location,
            point: to_unit_vector(stop.location),
        }
    }
}

impl RTreeObject for StopNode {
    type Envelope = AABB<[f64; 3]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for StopNode {
    fn distance_2(&self, point: &[f64; 3]) -> f64 {
        let dx = self.point[0] - point[0];
        let dy = self.point[1] - point[1];
        let dz = self.point[2] - point[2];
        dx * dx + dy * dy + dz * dz
    }
}

// ============================================================================
// Stop Index
// ============================================================================

/// Spatial index over one route's stop list.
#[derive(Clone)]
pub struct StopIndex {
    tree: RTree<StopNode>,
}

impl StopIndex {
    pub fn new(stops: &[Stop]) -> Self {
        let nodes = stops
            .iter()
            .enumerate()
            .map(|(slot, stop)| StopNode::new(slot, stop))
            .collect();

        Self {
            tree: RTree::bulk_load(nodes),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Slot of the stop nearest to `point`, with ties going to the lower sequence.
    pub fn nearest(&self, point: Point) -> Option<usize> {
        let query = to_unit_vector(point);
        let mut candidates = self.tree.nearest_neighbor_iter_with_distance_2(&query);

        let (first, best_d2) = candidates.next()?;
        let limit = best_d2 + best_d2.max(f64::EPSILON) * TIE_TOLERANCE;

        let mut best = first;
        let mut best_m = haversine_distance(point, first.location);

        for (node, d2) in candidates {
            if d2 > limit {
                break;
            }

            let meters = haversine_distance(point, node.location);
            let closer = meters < best_m;
            let tied_lower = meters == best_m && node.sequence < best.sequence;
            if closer || tied_lower {
                best = node;
                best_m = meters;
            }
        }

        Some(best.slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stop(id: &str, seq: u32, lat: f64, lon: f64) -> Stop {
        Stop::new(id, id, seq, Point::new(lon, lat))
    }

    #[test]
    fn test_empty_index() {
        let index = StopIndex::new(&[]);
        assert!(index.is_empty());
        assert_eq!(index.nearest(Point::new(101.6, 3.1)), None);
    }

    #[test]
    fn test_nearest_picks_closest() {
        let stops = vec![
            stop("a", 1, 3.1000, 101.6000),
            stop("b", 2, 3.1100, 101.6000),
            stop("c", 3, 3.1200, 101.6000),
        ];
        let index = StopIndex::new(&stops);

        assert_eq!(index.nearest(Point::new(101.6000, 3.1090)), Some(1));
        assert_eq!(index.nearest(Point::new(101.6000, 3.1300)), Some(2));
    }

    #[test]
    fn test_exact_tie_prefers_lower_sequence() {
        // Two stops at the same coordinates; listed out of sequence order.
        let stops = vec![
            stop("later", 7, 3.1000, 101.6000),
            stop("earlier", 4, 3.1000, 101.6000),
        ];
        let index = StopIndex::new(&stops);

        assert_eq!(index.nearest(Point::new(101.6010, 3.1010)), Some(1));
    }
}
