use bustrack_transit::identifiers::{BusNumber, StopIdentifier};
use bustrack_transit::models::{ShapePoint, Stop, Vehicle};
use geo::{BoundingRect, LineString, MultiPoint, Point, Rect};

/// Everything one sync draws. Borrowed from the session state.
#[derive(Clone, Copy, Debug, Default)]
pub struct MapSnapshot<'a> {
    pub vehicles: &'a [Vehicle],
    pub stops: &'a [Stop],
    pub shape: &'a [ShapePoint],
    pub target_stop_id: Option<&'a StopIdentifier>,
    pub selected_bus_no: Option<&'a BusNumber>,
}

/// Line drawn for the route and whether it came from the shape.
pub struct RouteLine {
    pub line: LineString,
    pub from_shape: bool,
}

impl<'a> MapSnapshot<'a> {
    pub fn target_stop(&self) -> Option<&'a Stop> {
        let target = self.target_stop_id?;
        self.stops.iter().find(|s| &s.id == target)
    }

    pub fn selected_vehicle(&self) -> Option<&'a Vehicle> {
        let selected = self.selected_bus_no?;
        self.vehicles.iter().find(|v| &v.bus_no == selected)
    }

    /// The shape polyline if it has more than one point, else the stops joined
    /// in sequence order if there is more than one, else nothing.
    pub fn route_line(&self) -> Option<RouteLine> {
        if self.shape.len() > 1 {
            let mut points: Vec<&ShapePoint> = self.shape.iter().collect();
            points.sort_by_key(|p| p.sequence);
            return Some(RouteLine {
                line: points.iter().map(|p| p.location.0).collect(),
                from_shape: true,
            });
        }

        if self.stops.len() > 1 {
            let mut stops: Vec<&Stop> = self.stops.iter().collect();
            stops.sort_by_key(|s| s.sequence);
            return Some(RouteLine {
                line: stops.iter().map(|s| s.location.0).collect(),
                from_shape: false,
            });
        }

        None
    }

    /// Every coordinate the camera should frame.
    ///
    /// The target stop is added on its own when there are no vehicles, so an
    /// empty route still frames something meaningful.
    pub fn bounds_points(&self) -> Vec<Point> {
        let mut points: Vec<Point> = self
            .shape
            .iter()
            .map(|p| p.location)
            .chain(self.stops.iter().map(|s| s.location))
            .chain(self.vehicles.iter().map(|v| v.location))
            .collect();

        if self.vehicles.is_empty() {
            if let Some(target) = self.target_stop() {
                points.push(target.location);
            }
        }

        points
    }

    pub fn bounds(&self) -> Option<Rect> {
        MultiPoint::from(self.bounds_points()).bounding_rect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stop(id: &str, seq: u32, lon: f64) -> Stop {
        Stop::new(id, id, seq, Point::new(lon, 3.1))
    }

    #[test]
    fn test_route_line_prefers_shape() {
        let shape = vec![ShapePoint::new(3.0, 101.0, 2), ShapePoint::new(3.0, 100.0, 1)];
        let stops = vec![stop("a", 1, 101.5), stop("b", 2, 101.6)];
        let snapshot = MapSnapshot {
            shape: &shape,
            stops: &stops,
            ..Default::default()
        };

        let route = snapshot.route_line().unwrap();
        assert!(route.from_shape);
        let xs: Vec<f64> = route.line.0.iter().map(|c| c.x).collect();
        assert_eq!(xs, vec![100.0, 101.0]);
    }

    #[test]
    fn test_route_line_falls_back_to_stops() {
        let shape = vec![ShapePoint::new(3.0, 101.0, 1)];
        let stops = vec![stop("b", 2, 101.6), stop("a", 1, 101.5)];
        let snapshot = MapSnapshot {
            shape: &shape,
            stops: &stops,
            ..Default::default()
        };

        let route = snapshot.route_line().unwrap();
        assert!(!route.from_shape);
        assert_eq!(route.line.0[0].x, 101.5);
    }

    #[test]
    fn test_route_line_needs_two_points() {
        let stops = vec![stop("a", 1, 101.5)];
        let snapshot = MapSnapshot {
            stops: &stops,
            ..Default::default()
        };
        assert!(snapshot.route_line().is_none());
    }

    #[test]
    fn test_bounds_with_no_points() {
        assert!(MapSnapshot::default().bounds().is_none());
    }

    #[test]
    fn test_target_added_only_without_vehicles() {
        let stops = vec![stop("a", 1, 101.5), stop("t", 2, 101.6)];
        let target = StopIdentifier::new("t");
        let vehicles = vec![Vehicle::new("1", "T7890", 3.1, 101.55)];

        let empty = MapSnapshot {
            stops: &stops,
            target_stop_id: Some(&target),
            ..Default::default()
        };
        assert_eq!(empty.bounds_points().len(), 3);

        let busy = MapSnapshot {
            vehicles: &vehicles,
            ..empty
        };
        assert_eq!(busy.bounds_points().len(), 3);
    }
}
