//! Plain-text rendering of the session for the terminal.

use std::fmt::Write;

use bustrack_core::SessionController;
use bustrack_core::api_types::{EtaRecord, NearestStopResponse};
use bustrack_core::transit::models::{Vehicle, VehicleEta};
use bustrack_core::transit::position::StopState;

fn state_mark(state: StopState) -> &'static str {
    match state {
        StopState::Passed => " ",
        StopState::Current => "●",
        StopState::Between => "·",
        StopState::Target => "◎",
        StopState::Upcoming => "○",
        StopState::Unknown => "?",
    }
}

fn eta_text(eta: Option<&VehicleEta>) -> String {
    let Some(eta) = eta else {
        return String::new();
    };

    let mut text = String::new();
    if let Some(minutes) = eta.eta_minutes {
        let _ = write!(text, "  ETA {minutes:.0} min");
    }
    if let Some(away) = eta.stops_away {
        let _ = write!(text, ", {away} stops away");
    }
    if let Some(km) = eta.distance_km {
        let _ = write!(text, " ({km:.1} km)");
    }
    text
}

fn vehicle_line(session: &SessionController, vehicle: &Vehicle) -> String {
    let selected = session.selected() == Some(&vehicle.bus_no);
    let at = match vehicle.resolved.as_ref() {
        Some(resolved) => {
            let name = session
                .route()
                .stop_name(&resolved.stop_id)
                .unwrap_or(resolved.stop_id.as_str());
            format!("at {name} (#{}, {})", resolved.sequence, resolved.source.as_str())
        }
        None => format!("at {:.5}, {:.5}", vehicle.lat(), vehicle.lon()),
    };

    format!(
        "{} {:<10} {}  {:.0} km/h{}",
        if selected { ">" } else { " " },
        vehicle.bus_no.as_str(),
        at,
        vehicle.speed_kmh,
        eta_text(session.eta_for(&vehicle.bus_no)),
    )
}

/// Everything worth printing after one update.
pub fn session(session: &SessionController) -> String {
    let mut out = String::new();
    let route = session.route();

    if let Some(error) = session.error() {
        let _ = writeln!(out, "error: {}", error.message());
        return out;
    }

    let name = if route.short_name.is_empty() {
        route.route_id.as_str()
    } else {
        route.short_name.as_str()
    };
    let _ = writeln!(
        out,
        "[poll {}] {} bus(es) on {name}",
        session.last_batch().map_or_else(|| "-".to_owned(), |id| id.to_string()),
        session.vehicles().len(),
    );

    if let Some(stop) = session.target_stop() {
        let _ = writeln!(out, "  your stop: {} (#{})", stop.name, stop.sequence);
    }
    if let Some(error) = session.eta_error() {
        let _ = writeln!(out, "  ETA unavailable: {}", error.message());
    }

    for vehicle in session.vehicles() {
        let _ = writeln!(out, "{}", vehicle_line(session, vehicle));
    }

    if let Some(detail) = session.selected_detail() {
        let _ = writeln!(out, "  stops for {}:", detail.vehicle.bus_no);
        for classified in &detail.stops {
            let _ = writeln!(
                out,
                "    {} {:>3} {} [{}]",
                state_mark(classified.state),
                classified.stop.sequence,
                classified.stop.name,
                classified.state.as_str(),
            );
        }
    }

    out
}

pub fn nearest(nearest: &NearestStopResponse) -> String {
    let distance = nearest
        .distance_m()
        .map(|m| format!(" ({m:.0} m away)"))
        .unwrap_or_default();
    format!(
        "{} {}{distance}\n  {:.5}, {:.5}\n",
        nearest.stop_id, nearest.stop_name, nearest.stop_lat, nearest.stop_lon
    )
}

pub fn arrivals(stop_id: &str, records: &[EtaRecord]) -> String {
    if records.is_empty() {
        return format!("No buses heading to {stop_id}\n");
    }

    let mut out = format!("Arrivals at {stop_id}:\n");
    for record in records {
        let route = record.route_id.as_deref().unwrap_or("?");
        let minutes = record
            .eta_minutes
            .map(|m| format!("{m:.0} min"))
            .unwrap_or_else(|| "unknown".to_owned());
        let _ = writeln!(out, "  {route:<8} {:<10} {minutes}", record.bus_no);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use bustrack_core::transit::identifiers::{RouteIdentifier, StopIdentifier};

    #[test]
    fn test_empty_session_report() {
        let session =
            SessionController::new(RouteIdentifier::new("T7890"), Some(StopIdentifier::new("s3")));
        let text = super::session(&session);
        assert_eq!(text, "[poll -] 0 bus(es) on T7890\n");
    }

    #[test]
    fn test_no_arrivals() {
        assert_eq!(arrivals("KJ14", &[]), "No buses heading to KJ14\n");
    }

    #[test]
    fn test_marks_cover_every_state() {
        let states = [
            StopState::Passed,
            StopState::Current,
            StopState::Between,
            StopState::Target,
            StopState::Upcoming,
            StopState::Unknown,
        ];
        let marks: std::collections::HashSet<_> = states.iter().map(|s| state_mark(*s)).collect();
        assert_eq!(marks.len(), states.len());
    }
}
