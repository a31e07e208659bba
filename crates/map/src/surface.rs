//! The render substrate the engine draws on.
//!
//! A surface is a mounted tile map plus one overlay group. Implementations
//! wrap whatever actually renders (a web map, a native view, or a headless
//! logger); the engine only ever talks to these traits.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bustrack_transit::identifiers::{BusNumber, StopIdentifier};
use bustrack_transit::position::StopState;
use geo::{LineString, Point, Rect};

use crate::MapError;
use crate::style::{LineStyle, MarkerStyle};

/// Invoked when a marker is clicked.
pub type ClickHandler = Arc<dyn Fn() + Send + Sync>;

#[derive(Clone, Debug, PartialEq)]
pub enum MarkerKind {
    Stop { stop_id: StopIdentifier, state: StopState },
    Vehicle { bus_no: BusNumber },
}

#[derive(Clone)]
pub struct Marker {
    pub kind: MarkerKind,
    /// x = longitude, y = latitude
    pub position: Point,
    pub label: String,
    pub tooltip: Option<String>,
    pub style: MarkerStyle,
    pub on_click: Option<ClickHandler>,
}

impl Marker {
    /// Fire the click handler, if the marker is interactive.
    pub fn click(&self) {
        if let Some(handler) = &self.on_click {
            handler();
        }
    }
}

impl fmt::Debug for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Marker")
            .field("kind", &self.kind)
            .field("position", &self.position)
            .field("label", &self.label)
            .field("tooltip", &self.tooltip)
            .field("style", &self.style)
            .field("interactive", &self.on_click.is_some())
            .finish()
    }
}

/// A layer group that is cleared and refilled on every sync.
pub trait OverlayGroup {
    fn clear(&mut self);
    fn add_polyline(&mut self, line: &LineString, style: &LineStyle);
    fn add_marker(&mut self, marker: Marker);
}

pub trait RenderSurface {
    fn overlays(&mut self) -> &mut dyn OverlayGroup;

    /// Animate the camera to center on a point.
    fn fly_to(&mut self, center: Point, zoom: f64);

    /// Frame a set of points.
    fn fit_bounds(&mut self, bounds: Rect, padding_px: f64);

    /// Tear down the tile layer and detach from the container.
    fn release(self: Box<Self>);
}

pub type MountFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Box<dyn RenderSurface>, MapError>> + 'a>>;

/// Mounts a surface into a named container.
pub trait SurfaceProvider {
    fn mount<'a>(&'a self, container: &'a str) -> MountFuture<'a>;
}
