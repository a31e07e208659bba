//! Core data types and enums for route data.

use geo::Point;

use crate::identifiers::*;

// ============================================================================
// Enums
// ============================================================================

/// Where a vehicle's current stop came from.
///
/// `Live` means the stop id was reported by the vehicle feed and exists on the
/// route; `Derived` means it was inferred from the vehicle's coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ResolutionSource {
    Live,
    Derived,
    #[default]
    None,
}

impl ResolutionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Derived => "derived",
            Self::None => "none",
        }
    }

    /// Parse the backend's `stop_resolution_source` tag. Unknown tags map to `None`.
    pub fn from_tag(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "live" => Self::Live,
            "derived" | "nearest" | "gps" => Self::Derived,
            _ => Self::None,
        }
    }
}

// ============================================================================
// Data Structures
// ============================================================================

/// A stop on the tracked route.
///
/// `sequence` defines travel order and is unique within a route.
#[derive(Clone, Debug, PartialEq)]
pub struct Stop {
    pub id: StopIdentifier,
    pub name: String,
    pub sequence: u32,
    /// x = longitude, y = latitude
    pub location: Point,
    pub description: Option<String>,
}

impl Stop {
    pub fn new(
        id: impl Into<StopIdentifier>,
        name: impl Into<String>,
        sequence: u32,
        location: Point,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            sequence,
            location,
            description: None,
        }
    }
}

/// One sample of the route polyline.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShapePoint {
    pub location: Point,
    pub sequence: u32,
}

impl ShapePoint {
    pub fn new(lat: f64, lon: f64, sequence: u32) -> Self {
        Self {
            location: Point::new(lon, lat),
            sequence,
        }
    }
}

/// The stop a vehicle is considered to be at for one poll.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedStop {
    pub stop_id: StopIdentifier,
    pub sequence: u32,
    pub source: ResolutionSource,
}

/// A vehicle as seen in a single poll. Replaced wholesale on every poll.
#[derive(Clone, Debug, PartialEq)]
pub struct Vehicle {
    pub bus_no: BusNumber,
    pub route: RouteIdentifier,
    pub location: Point,
    pub speed_kmh: f64,
    /// Stop ids the vehicle feed vouches for, most trusted first.
    pub reported_stop_ids: Vec<StopIdentifier>,
    pub resolved: Option<ResolvedStop>,
}

impl Vehicle {
    pub fn new(
        bus_no: impl Into<BusNumber>,
        route: impl Into<RouteIdentifier>,
        lat: f64,
        lon: f64,
    ) -> Self {
        Self {
            bus_no: bus_no.into(),
            route: route.into(),
            location: Point::new(lon, lat),
            speed_kmh: 0.0,
            reported_stop_ids: Vec::new(),
            resolved: None,
        }
    }

    pub fn lat(&self) -> f64 {
        self.location.y()
    }

    pub fn lon(&self) -> f64 {
        self.location.x()
    }

    pub fn resolved_stop_id(&self) -> Option<&StopIdentifier> {
        self.resolved.as_ref().map(|r| &r.stop_id)
    }

    pub fn resolved_sequence(&self) -> Option<u32> {
        self.resolved.as_ref().map(|r| r.sequence)
    }

    pub fn resolution_source(&self) -> ResolutionSource {
        self.resolved
            .as_ref()
            .map(|r| r.source)
            .unwrap_or(ResolutionSource::None)
    }
}

/// Backend-computed arrival estimate for one vehicle.
#[derive(Clone, Debug, PartialEq)]
pub struct VehicleEta {
    pub route_id: Option<RouteIdentifier>,
    pub bus_no: BusNumber,
    pub current_stop_id: Option<StopIdentifier>,
    pub current_stop_name: Option<String>,
    pub current_sequence: Option<u32>,
    pub resolution_source: ResolutionSource,
    pub stops_away: Option<i64>,
    pub distance_km: Option<f64>,
    pub speed_kmh: Option<f64>,
    pub eta_minutes: Option<f64>,
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum TransitError {
    #[error("Unable to resolve a current stop: route has no stops")]
    UnresolvedPosition,

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

pub type Result<T> = std::result::Result<T, TransitError>;
