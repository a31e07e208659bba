//! Keeps an interactive route map in step with the latest tracking state.
//!
//! The [`MapSyncEngine`] owns one mounted [`RenderSurface`] and redraws it in
//! full from a [`MapSnapshot`] after every applied poll.

pub mod config;
pub mod engine;
pub mod snapshot;
pub mod style;
pub mod surface;

pub use config::MapConfig;
pub use engine::{
    AcquireOutcome, CameraMove, DisposeHandle, EngineStatus, MapSyncEngine, SelectionCallback,
    SyncSummary,
};
pub use snapshot::{MapSnapshot, RouteLine};
pub use style::{LineStyle, MapTheme, MarkerStyle};
pub use surface::{
    ClickHandler, Marker, MarkerKind, MountFuture, OverlayGroup, RenderSurface, SurfaceProvider,
};

#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("render surface unavailable: {0}")]
    RenderSurfaceUnavailable(String),
}
