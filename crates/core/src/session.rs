//! Session state: the route view, the latest vehicles and ETAs, the selection
//! and the user-facing errors.

use bustrack_map::MapSnapshot;
use bustrack_transit::identifiers::{BusNumber, RouteIdentifier, StopIdentifier};
use bustrack_transit::models::{Stop, Vehicle, VehicleEta};
use bustrack_transit::position::ClassifiedStop;
use bustrack_transit::provider::RouteView;
use tracing::{debug, info, warn};

use crate::client::FetchError;
use crate::convert;
use crate::poller::PollBatch;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    /// False when the vehicle feed failed and the batch was dropped.
    pub applied: bool,
    /// The selected bus was missing from the new vehicles.
    pub selection_cleared: bool,
}

/// Everything the detail view shows for the selected bus.
#[derive(Debug)]
pub struct VehicleDetail<'a> {
    pub vehicle: &'a Vehicle,
    pub eta: Option<&'a VehicleEta>,
    pub stops: Vec<ClassifiedStop>,
}

pub struct SessionController {
    view: RouteView,
    target: Option<StopIdentifier>,

    vehicles: Vec<Vehicle>,
    etas: Vec<VehicleEta>,
    selected: Option<BusNumber>,

    /// Vehicle feed failure; replaces the whole view.
    error: Option<FetchError>,
    /// ETA feed failure; shown next to the vehicles.
    eta_error: Option<FetchError>,
    last_batch: Option<u64>,
}

impl SessionController {
    pub fn new(route: RouteIdentifier, target: Option<StopIdentifier>) -> Self {
        Self {
            view: RouteView::new(route),
            target,
            vehicles: Vec::new(),
            etas: Vec::new(),
            selected: None,
            error: None,
            eta_error: None,
            last_batch: None,
        }
    }

    pub fn route(&self) -> &RouteView {
        &self.view
    }

    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    pub fn etas(&self) -> &[VehicleEta] {
        &self.etas
    }

    pub fn error(&self) -> Option<&FetchError> {
        self.error.as_ref()
    }

    pub fn eta_error(&self) -> Option<&FetchError> {
        self.eta_error.as_ref()
    }

    pub fn last_batch(&self) -> Option<u64> {
        self.last_batch
    }

    pub fn target_stop_id(&self) -> Option<&StopIdentifier> {
        self.target.as_ref()
    }

    pub fn target_stop(&self) -> Option<&Stop> {
        self.target.as_ref().and_then(|id| self.view.stop(id))
    }

    pub fn vehicle(&self, bus_no: &BusNumber) -> Option<&Vehicle> {
        self.vehicles.iter().find(|v| &v.bus_no == bus_no)
    }

    pub fn eta_for(&self, bus_no: &BusNumber) -> Option<&VehicleEta> {
        self.etas.iter().find(|e| &e.bus_no == bus_no)
    }

    pub fn selected(&self) -> Option<&BusNumber> {
        self.selected.as_ref()
    }

    /// Select a bus from the current vehicles. Unknown buses are ignored.
    pub fn select(&mut self, bus_no: BusNumber) -> bool {
        if self.vehicle(&bus_no).is_none() {
            debug!(%bus_no, "Ignoring selection of unknown bus");
            return false;
        }
        self.selected = Some(bus_no);
        true
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Fold one poll into the session.
    ///
    /// A failed vehicle feed drops the whole batch. Otherwise: a failed ETA
    /// feed empties the ETAs, a failed stops feed keeps the previous stops and
    /// a failed shape feed clears the shape.
    pub fn apply_batch(&mut self, batch: PollBatch) -> BatchOutcome {
        let records = match batch.vehicles {
            Ok(records) => records,
            Err(e) => {
                warn!(batch = batch.id, error = %e, "Vehicle fetch failed");
                self.error = Some(e);
                return BatchOutcome::default();
            }
        };
        self.error = None;

        match batch.stops {
            Ok(response) => self.apply_stops(&response),
            Err(e) => {
                debug!(batch = batch.id, error = %e, "Stops fetch failed, keeping previous stops")
            }
        }

        match batch.shape {
            Ok(response) => self.view.set_shape(convert::shape(&response)),
            Err(e) => {
                debug!(batch = batch.id, error = %e, "Shape fetch failed, clearing shape");
                self.view.set_shape(Vec::new());
            }
        }

        match batch.eta {
            Ok(records) => {
                self.etas = records.into_iter().map(convert::vehicle_eta).collect();
                self.eta_error = None;
            }
            Err(e) => {
                warn!(batch = batch.id, error = %e, "ETA fetch failed");
                self.etas.clear();
                self.eta_error = Some(e);
            }
        }

        let resolver = self.view.resolver();
        let route = &self.view.route_id;
        self.vehicles = records
            .into_iter()
            .map(|record| resolver.annotate(convert::vehicle(record, route)))
            .collect();

        let mut outcome = BatchOutcome {
            applied: true,
            selection_cleared: false,
        };
        if let Some(selected) = &self.selected {
            if self.vehicle(selected).is_none() {
                info!(bus_no = %selected, "Selected bus left the feed");
                self.selected = None;
                outcome.selection_cleared = true;
            }
        }

        self.last_batch = Some(batch.id);
        debug!(
            batch = batch.id,
            vehicles = self.vehicles.len(),
            stops = self.view.stops().len(),
            etas = self.etas.len(),
            "Applied poll"
        );
        outcome
    }

    fn apply_stops(&mut self, response: &bustrack_api_types::RouteStopsResponse) {
        if let Some(name) = &response.route_short_name {
            self.view.short_name = name.clone();
        }
        if let Some(name) = &response.route_long_name {
            self.view.long_name = name.clone();
        }

        if let Err(e) = self.view.set_stops(convert::stops(response)) {
            warn!(error = %e, "Rejecting stop list, keeping previous stops");
        }
    }

    /// What the map should show right now.
    pub fn snapshot(&self) -> MapSnapshot<'_> {
        MapSnapshot {
            vehicles: &self.vehicles,
            stops: self.view.stops(),
            shape: self.view.shape(),
            target_stop_id: self.target.as_ref(),
            selected_bus_no: self.selected.as_ref(),
        }
    }

    pub fn selected_detail(&self) -> Option<VehicleDetail<'_>> {
        let vehicle = self.vehicle(self.selected.as_ref()?)?;
        Some(VehicleDetail {
            vehicle,
            eta: self.eta_for(&vehicle.bus_no),
            stops: self.view.classify_for(Some(vehicle), self.target.as_ref()),
        })
    }
}
