//! Boundary normalization of loosely-shaped payloads.
//!
//! Nothing here fails: a payload of an unexpected shape becomes an empty
//! collection (with a warning), and individual malformed entries are dropped.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use crate::records::{EtaRecord, RouteShapeResponse, RouteStopsResponse, VehicleRecord};

fn shape_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn entries<T: DeserializeOwned>(items: Vec<Value>, what: &'static str) -> Vec<T> {
    let total = items.len();
    let parsed: Vec<T> = items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(payload = what, error = %e, "Dropping malformed entry");
                None
            }
        })
        .collect();

    if parsed.len() != total {
        warn!(payload = what, kept = parsed.len(), total, "Some entries were malformed");
    }
    parsed
}

/// Vehicle snapshots arrive either as one object or as an array of them.
pub fn vehicles(value: Value) -> Vec<VehicleRecord> {
    match value {
        Value::Array(items) => entries(items, "vehicles"),
        Value::Object(_) => entries(vec![value], "vehicles"),
        other => {
            warn!(shape = shape_of(&other), "Unexpected vehicle payload, treating as empty");
            Vec::new()
        }
    }
}

/// ETA lists are arrays; anything else is empty.
pub fn eta(value: Value) -> Vec<EtaRecord> {
    match value {
        Value::Array(items) => entries(items, "eta"),
        other => {
            warn!(shape = shape_of(&other), "Unexpected ETA payload, treating as empty");
            Vec::new()
        }
    }
}

pub fn stops(value: Value) -> RouteStopsResponse {
    let mut body = match value {
        Value::Object(body) => body,
        other => {
            warn!(shape = shape_of(&other), "Unexpected stops payload, treating as empty");
            return RouteStopsResponse::default();
        }
    };

    let stops = match body.remove("stops") {
        Some(Value::Array(items)) => entries(items, "stops"),
        _ => Vec::new(),
    };

    let header =
        serde_json::from_value::<RouteStopsResponse>(Value::Object(body)).unwrap_or_default();
    RouteStopsResponse { stops, ..header }
}

pub fn shape(value: Value) -> RouteShapeResponse {
    let mut body = match value {
        Value::Object(body) => body,
        other => {
            warn!(shape = shape_of(&other), "Unexpected shape payload, treating as empty");
            return RouteShapeResponse::default();
        }
    };

    let points = match body.remove("points") {
        Some(Value::Array(items)) => entries(items, "shape"),
        _ => Vec::new(),
    };

    let header =
        serde_json::from_value::<RouteShapeResponse>(Value::Object(body)).unwrap_or_default();
    RouteShapeResponse { points, ..header }
}
