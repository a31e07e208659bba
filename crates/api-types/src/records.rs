//! Records exchanged with the tracking backend.

use serde::{Deserialize, Serialize};

use crate::lenient;

/// One vehicle from `GET /get-route-t789`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VehicleRecord {
    #[serde(deserialize_with = "lenient::id")]
    pub bus_no: String,
    #[serde(default, deserialize_with = "lenient::opt_id")]
    pub route: Option<String>,
    #[serde(alias = "lat", deserialize_with = "lenient::number")]
    pub latitude: f64,
    #[serde(alias = "lon", alias = "lng", deserialize_with = "lenient::number")]
    pub longitude: f64,
    #[serde(default, deserialize_with = "lenient::opt_number")]
    pub speed: Option<f64>,

    /// Stop id reported by the vehicle itself
    #[serde(default, deserialize_with = "lenient::opt_id")]
    pub busstop_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_id")]
    pub resolved_stop_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_id")]
    pub resolved_stop_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_sequence")]
    pub resolved_stop_sequence: Option<u32>,
    #[serde(default, deserialize_with = "lenient::opt_id")]
    pub stop_resolution_source: Option<String>,
}

/// One record from `GET /get-t789-eta` or `GET /stops/{stop_id}/eta`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EtaRecord {
    #[serde(default, deserialize_with = "lenient::opt_id")]
    pub route_id: Option<String>,
    #[serde(deserialize_with = "lenient::id")]
    pub bus_no: String,
    #[serde(default, deserialize_with = "lenient::opt_id")]
    pub current_stop_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_id")]
    pub current_stop_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_sequence")]
    pub current_sequence: Option<u32>,
    #[serde(default, deserialize_with = "lenient::opt_id")]
    pub stop_resolution_source: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_integer")]
    pub stops_away: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_number")]
    pub distance_km: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_number")]
    pub speed_kmh: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_number")]
    pub eta_minutes: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StopRecord {
    #[serde(deserialize_with = "lenient::id")]
    pub stop_id: String,
    #[serde(default)]
    pub stop_name: String,
    #[serde(default, deserialize_with = "lenient::opt_id")]
    pub stop_desc: Option<String>,
    #[serde(deserialize_with = "lenient::number")]
    pub stop_lat: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub stop_lon: f64,
    #[serde(deserialize_with = "lenient::sequence")]
    pub sequence: u32,
}

/// Body of `GET /route/{route_id}/stops`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteStopsResponse {
    #[serde(default, deserialize_with = "lenient::opt_id")]
    pub route_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_id")]
    pub route_short_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_id")]
    pub route_long_name: Option<String>,
    #[serde(default)]
    pub stops: Vec<StopRecord>,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShapePointRecord {
    #[serde(deserialize_with = "lenient::number")]
    pub lat: f64,
    #[serde(alias = "lng", deserialize_with = "lenient::number")]
    pub lon: f64,
    #[serde(deserialize_with = "lenient::sequence")]
    pub sequence: u32,
}

/// Body of `GET /route/{route_id}/shape`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteShapeResponse {
    #[serde(default, deserialize_with = "lenient::opt_id")]
    pub route_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_id")]
    pub shape_id: Option<String>,
    #[serde(default)]
    pub points: Vec<ShapePointRecord>,
}

/// Body of `GET /stops/nearest?lat=&lon=`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NearestStopResponse {
    #[serde(deserialize_with = "lenient::id")]
    pub stop_id: String,
    #[serde(default)]
    pub stop_name: String,
    #[serde(default, deserialize_with = "lenient::opt_id")]
    pub stop_desc: Option<String>,
    #[serde(deserialize_with = "lenient::number")]
    pub stop_lat: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub stop_lon: f64,
    #[serde(default, deserialize_with = "lenient::opt_number")]
    pub distance_km: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_number")]
    pub distance_meters: Option<f64>,
}

impl NearestStopResponse {
    /// Distance in meters, from whichever unit the backend supplied.
    pub fn distance_m(&self) -> Option<f64> {
        self.distance_meters
            .or_else(|| self.distance_km.map(|km| km * 1000.0))
    }
}

/// Error body; every endpoint may return `{ "error": "..." }`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}

impl ErrorBody {
    /// The server's message, or `fallback` when the body carries none.
    pub fn message_or(body: &[u8], fallback: &str) -> String {
        serde_json::from_slice::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.error)
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| fallback.to_owned())
    }
}
