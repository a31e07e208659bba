//! Spatial query utilities for distance calculations.
//!
//! Uses Haversine formula for accurate distances on Earth's surface.

use geo::{HaversineDistance, Point};

/// Calculate Haversine distance between two points in meters
pub fn haversine_distance(p1: Point, p2: Point) -> f64 {
    p1.haversine_distance(&p2)
}

/// Project a lon/lat point onto the unit sphere.
///
/// Straight-line (chord) distance between two projected points grows
/// monotonically with their great-circle distance, so Euclidean nearest
/// neighbour queries over these coordinates return great-circle nearest stops.
pub fn to_unit_vector(point: Point) -> [f64; 3] {
    let lat = point.y().to_radians();
    let lon = point.x().to_radians();
    [lat.cos() * lon.cos(), lat.cos() * lon.sin(), lat.sin()]
}
