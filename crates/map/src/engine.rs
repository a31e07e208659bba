//! Map render session.
//!
//! ```text
//! Uninitialized --acquire()--> Ready --dispose()--> Disposed
//!       |                                              ^
//!       +------------- dispose() / teardown -----------+
//! ```
//!
//! Mounting is the only asynchronous step. Teardown can happen while it is in
//! flight (through a [`DisposeHandle`]), so the disposed flag is checked as
//! soon as the mount resolves; a late surface is released without being drawn
//! on. Every sync on a ready engine clears the overlay group and redraws it
//! from the snapshot.

use std::sync::Arc;

use bustrack_transit::identifiers::BusNumber;
use bustrack_transit::position::classify_sequence;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::MapError;
use crate::config::MapConfig;
use crate::snapshot::MapSnapshot;
use crate::style::MapTheme;
use crate::surface::{Marker, MarkerKind, RenderSurface, SurfaceProvider};

/// Called with the bus number of a clicked vehicle marker.
pub type SelectionCallback = Arc<dyn Fn(BusNumber) + Send + Sync>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineStatus {
    Uninitialized,
    Ready,
    Disposed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AcquireOutcome {
    Ready,
    /// Teardown happened first; the surface was never used.
    Abandoned,
}

#[derive(Clone, Debug, PartialEq)]
pub enum CameraMove {
    None,
    FlyTo(BusNumber),
    FitBounds,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SyncSummary {
    pub route_line: bool,
    pub stops: usize,
    pub vehicles: usize,
    pub camera: CameraMove,
}

/// Tears the engine down from outside, e.g. while `acquire` is pending.
#[derive(Clone, Debug)]
pub struct DisposeHandle(CancellationToken);

impl DisposeHandle {
    pub fn dispose(&self) {
        self.0.cancel();
    }

    pub fn is_disposed(&self) -> bool {
        self.0.is_cancelled()
    }
}

enum EngineState {
    Uninitialized,
    Ready(Box<dyn RenderSurface>),
    Disposed,
}

pub struct MapSyncEngine {
    config: MapConfig,
    theme: MapTheme,
    state: EngineState,
    disposed: CancellationToken,
    on_select: SelectionCallback,

    /// Selection the camera last flew to.
    followed: Option<BusNumber>,
    fitted: bool,
    unavailable: bool,
}

impl MapSyncEngine {
    pub fn new(config: MapConfig, on_select: SelectionCallback) -> Self {
        Self {
            config,
            theme: MapTheme::default(),
            state: EngineState::Uninitialized,
            disposed: CancellationToken::new(),
            on_select,
            followed: None,
            fitted: false,
            unavailable: false,
        }
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    pub fn dispose_handle(&self) -> DisposeHandle {
        DisposeHandle(self.disposed.clone())
    }

    pub fn status(&self) -> EngineStatus {
        match self.state {
            EngineState::Uninitialized => EngineStatus::Uninitialized,
            EngineState::Ready(_) => EngineStatus::Ready,
            EngineState::Disposed => EngineStatus::Disposed,
        }
    }

    /// True once mounting failed. The engine stays map-less; sync is a no-op.
    pub fn is_unavailable(&self) -> bool {
        self.unavailable
    }

    /// Mount the surface. Not retried on failure.
    pub async fn acquire(
        &mut self,
        provider: &dyn SurfaceProvider,
    ) -> Result<AcquireOutcome, MapError> {
        match self.state {
            EngineState::Ready(_) => return Ok(AcquireOutcome::Ready),
            EngineState::Disposed => return Ok(AcquireOutcome::Abandoned),
            EngineState::Uninitialized if self.disposed.is_cancelled() => {
                self.state = EngineState::Disposed;
                return Ok(AcquireOutcome::Abandoned);
            }
            EngineState::Uninitialized if self.unavailable => {
                return Err(MapError::RenderSurfaceUnavailable("mount already failed".to_owned()));
            }
            EngineState::Uninitialized => {}
        }

        let mounted = provider.mount(&self.config.container).await;
        self.attach(mounted)
    }

    /// Finish acquisition with the result of a mount that was driven elsewhere.
    pub fn attach(
        &mut self,
        mounted: Result<Box<dyn RenderSurface>, MapError>,
    ) -> Result<AcquireOutcome, MapError> {
        if self.disposed.is_cancelled() || matches!(self.state, EngineState::Disposed) {
            debug!("Engine disposed while mounting; abandoning surface");
            if let Ok(late) = mounted {
                late.release();
            }
            self.state = EngineState::Disposed;
            return Ok(AcquireOutcome::Abandoned);
        }

        if let EngineState::Ready(_) = self.state {
            return Ok(AcquireOutcome::Ready);
        }

        match mounted {
            Ok(mut surface) => {
                surface.overlays().clear();
                self.state = EngineState::Ready(surface);
                info!(container = %self.config.container, "Map surface ready");
                Ok(AcquireOutcome::Ready)
            }
            Err(e) => {
                warn!(error = %e, "Map surface unavailable, continuing without a map");
                self.unavailable = true;
                Err(e)
            }
        }
    }

    /// Release the overlay group and the surface. Idempotent.
    pub fn dispose(&mut self) {
        self.disposed.cancel();

        match std::mem::replace(&mut self.state, EngineState::Disposed) {
            EngineState::Ready(mut surface) => {
                surface.overlays().clear();
                surface.release();
                info!("Map surface released");
            }
            EngineState::Uninitialized | EngineState::Disposed => {}
        }
    }

    /// Redraw everything from `snapshot` and apply the camera policy.
    ///
    /// Returns `None` when there is nothing to draw on.
    pub fn sync(&mut self, snapshot: &MapSnapshot<'_>) -> Option<SyncSummary> {
        if self.disposed.is_cancelled() {
            self.dispose();
            return None;
        }

        let EngineState::Ready(surface) = &mut self.state else {
            return None;
        };

        let overlays = surface.overlays();
        overlays.clear();

        let route_line = snapshot.route_line();
        if let Some(route) = &route_line {
            overlays.add_polyline(&route.line, self.theme.line(route.from_shape));
        }

        let current = snapshot.selected_vehicle().and_then(|v| v.resolved_sequence());
        let target = snapshot.target_stop();

        for stop in snapshot.stops {
            let is_target = target.is_some_and(|t| t.id == stop.id);
            let state = classify_sequence(stop.sequence, current, target.map(|t| t.sequence));
            let tooltip = if is_target {
                format!("Your stop: {}", stop.name)
            } else {
                stop.name.clone()
            };

            overlays.add_marker(Marker {
                kind: MarkerKind::Stop {
                    stop_id: stop.id.clone(),
                    state,
                },
                position: stop.location,
                label: stop.name.clone(),
                tooltip: Some(tooltip),
                style: self.theme.stop(state, is_target),
                on_click: None,
            });
        }

        for vehicle in snapshot.vehicles {
            let selected = snapshot.selected_bus_no == Some(&vehicle.bus_no);
            let at = vehicle
                .resolved_stop_id()
                .and_then(|id| snapshot.stops.iter().find(|s| &s.id == id))
                .map(|s| format!(" near {}", s.name))
                .unwrap_or_default();

            let on_select = Arc::clone(&self.on_select);
            let bus_no = vehicle.bus_no.clone();

            overlays.add_marker(Marker {
                kind: MarkerKind::Vehicle {
                    bus_no: vehicle.bus_no.clone(),
                },
                position: vehicle.location,
                label: vehicle.bus_no.to_string(),
                tooltip: Some(format!("{} · {:.0} km/h{}", vehicle.bus_no, vehicle.speed_kmh, at)),
                style: self.theme.vehicle(selected),
                on_click: Some(Arc::new(move || on_select(bus_no.clone()))),
            });
        }

        let camera = self.move_camera(snapshot);

        let summary = SyncSummary {
            route_line: route_line.is_some(),
            stops: snapshot.stops.len(),
            vehicles: snapshot.vehicles.len(),
            camera,
        };
        debug!(?summary, "Map synced");
        Some(summary)
    }

    /// Fly once per selection change; without a selection, fit once ever.
    fn move_camera(&mut self, snapshot: &MapSnapshot<'_>) -> CameraMove {
        let EngineState::Ready(surface) = &mut self.state else {
            return CameraMove::None;
        };

        match snapshot.selected_bus_no {
            Some(selected) => {
                if self.followed.as_ref() == Some(selected) {
                    return CameraMove::None;
                }
                let Some(vehicle) = snapshot.selected_vehicle() else {
                    return CameraMove::None;
                };

                surface.fly_to(vehicle.location, self.config.follow_zoom);
                self.followed = Some(selected.clone());
                CameraMove::FlyTo(selected.clone())
            }
            None => {
                self.followed = None;
                if self.fitted {
                    return CameraMove::None;
                }
                let Some(bounds) = snapshot.bounds() else {
                    return CameraMove::None;
                };

                surface.fit_bounds(bounds, self.config.fit_padding_px);
                self.fitted = true;
                CameraMove::FitBounds
            }
        }
    }
}
