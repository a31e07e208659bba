//! A render surface that draws into the log.
//!
//! Used when no map view is attached: every redraw is summarized at debug
//! level and camera moves are reported at info level.

use bustrack_core::map::{
    LineStyle, Marker, MarkerKind, MountFuture, OverlayGroup, RenderSurface, SurfaceProvider,
};
use geo::{LineString, Point, Rect};
use tracing::{debug, info};

#[derive(Debug, Default)]
pub struct LogSurface {
    container: String,
    line_points: usize,
    stops: usize,
    vehicles: Vec<String>,
}

impl LogSurface {
    pub fn new(container: &str) -> Self {
        Self {
            container: container.to_owned(),
            ..Default::default()
        }
    }

    fn flush(&self) {
        if self.line_points == 0 && self.stops == 0 && self.vehicles.is_empty() {
            return;
        }
        debug!(
            container = %self.container,
            line_points = self.line_points,
            stops = self.stops,
            vehicles = ?self.vehicles,
            "Map redrawn"
        );
    }
}

impl OverlayGroup for LogSurface {
    fn clear(&mut self) {
        self.flush();
        self.line_points = 0;
        self.stops = 0;
        self.vehicles.clear();
    }

    fn add_polyline(&mut self, line: &LineString, style: &LineStyle) {
        self.line_points += line.0.len();
        debug!(points = line.0.len(), dashed = style.dashed, "Route line");
    }

    fn add_marker(&mut self, marker: Marker) {
        match marker.kind {
            MarkerKind::Stop { .. } => self.stops += 1,
            MarkerKind::Vehicle { bus_no } => self.vehicles.push(bus_no.to_string()),
        }
    }
}

impl RenderSurface for LogSurface {
    fn overlays(&mut self) -> &mut dyn OverlayGroup {
        self
    }

    fn fly_to(&mut self, center: Point, zoom: f64) {
        info!(lat = center.y(), lon = center.x(), zoom, "Following selected bus");
    }

    fn fit_bounds(&mut self, bounds: Rect, padding_px: f64) {
        let (min, max) = (bounds.min(), bounds.max());
        info!(
            south = min.y,
            west = min.x,
            north = max.y,
            east = max.x,
            padding_px,
            "Framing route"
        );
    }

    fn release(self: Box<Self>) {
        self.flush();
        debug!(container = %self.container, "Map released");
    }
}

pub struct LogSurfaceProvider;

impl SurfaceProvider for LogSurfaceProvider {
    fn mount<'a>(&'a self, container: &'a str) -> MountFuture<'a> {
        Box::pin(async move { Ok(Box::new(LogSurface::new(container)) as Box<dyn RenderSurface>) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bustrack_core::map::{MapConfig, MapSnapshot, MapSyncEngine, MapTheme};
    use bustrack_core::transit::identifiers::BusNumber;
    use bustrack_core::transit::models::Vehicle;
    use std::sync::Arc;

    #[test]
    fn test_counts_reset_on_clear() {
        let mut surface = LogSurface::new("map");
        let line: LineString = vec![(101.69, 3.14), (101.70, 3.139)].into();
        surface.add_polyline(&line, &LineStyle::solid(MapTheme::default().outline, 2.0));
        assert_eq!(surface.line_points, 2);

        surface.clear();
        assert_eq!(surface.line_points, 0);
        assert!(surface.vehicles.is_empty());
    }

    #[tokio::test]
    async fn test_engine_draws_through_log_surface() {
        let mut engine = MapSyncEngine::new(MapConfig::default(), Arc::new(|_: BusNumber| {}));
        engine.acquire(&LogSurfaceProvider).await.unwrap();

        let vehicles = vec![Vehicle::new("WB1234", "T7890", 3.139, 101.70)];
        let summary = engine
            .sync(&MapSnapshot {
                vehicles: &vehicles,
                ..Default::default()
            })
            .unwrap();
        assert_eq!(summary.vehicles, 1);

        engine.dispose();
    }
}
