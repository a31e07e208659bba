//! Wire records into the transit model.

use bustrack_api_types::{EtaRecord, RouteShapeResponse, RouteStopsResponse, VehicleRecord};
use bustrack_transit::identifiers::{BusNumber, RouteIdentifier, StopIdentifier};
use bustrack_transit::models::{ResolutionSource, ShapePoint, Stop, Vehicle, VehicleEta};
use geo::Point;

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|s| s.trim().to_owned()).filter(|s| !s.is_empty())
}

/// The stop ids the feed vouches for, most trusted first: the vehicle's own
/// report, then the backend's resolution when it is tagged live.
fn live_stop_ids(record: &VehicleRecord) -> Vec<StopIdentifier> {
    let mut ids = Vec::with_capacity(2);
    if let Some(id) = non_empty(record.busstop_id.clone()) {
        ids.push(StopIdentifier::new(id));
    }

    let source = record
        .stop_resolution_source
        .as_deref()
        .map(ResolutionSource::from_tag);
    if source == Some(ResolutionSource::Live) {
        if let Some(id) = non_empty(record.resolved_stop_id.clone()) {
            let id = StopIdentifier::new(id);
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
    }

    ids
}

/// The backend's own resolution is not trusted; the resolver recomputes it.
pub fn vehicle(record: VehicleRecord, fallback_route: &RouteIdentifier) -> Vehicle {
    let reported_stop_ids = live_stop_ids(&record);
    let route = non_empty(record.route)
        .map(RouteIdentifier::new)
        .unwrap_or_else(|| fallback_route.clone());

    let mut vehicle = Vehicle::new(
        BusNumber::new(record.bus_no.trim()),
        route,
        record.latitude,
        record.longitude,
    );
    vehicle.speed_kmh = record.speed.unwrap_or(0.0);
    vehicle.reported_stop_ids = reported_stop_ids;
    vehicle
}

pub fn vehicle_eta(record: EtaRecord) -> VehicleEta {
    VehicleEta {
        route_id: non_empty(record.route_id).map(RouteIdentifier::new),
        bus_no: BusNumber::new(record.bus_no.trim()),
        current_stop_id: non_empty(record.current_stop_id).map(StopIdentifier::new),
        current_stop_name: non_empty(record.current_stop_name),
        current_sequence: record.current_sequence,
        resolution_source: record
            .stop_resolution_source
            .as_deref()
            .map(ResolutionSource::from_tag)
            .unwrap_or_default(),
        stops_away: record.stops_away,
        distance_km: record.distance_km,
        speed_kmh: record.speed_kmh,
        eta_minutes: record.eta_minutes,
    }
}

pub fn stops(response: &RouteStopsResponse) -> Vec<Stop> {
    response
        .stops
        .iter()
        .map(|s| {
            let location = Point::new(s.stop_lon, s.stop_lat);
            let mut stop =
                Stop::new(s.stop_id.as_str(), s.stop_name.as_str(), s.sequence, location);
            stop.description = non_empty(s.stop_desc.clone());
            stop
        })
        .collect()
}

pub fn shape(response: &RouteShapeResponse) -> Vec<ShapePoint> {
    response
        .points
        .iter()
        .map(|p| ShapePoint::new(p.lat, p.lon, p.sequence))
        .collect()
}
