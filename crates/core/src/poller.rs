//! Periodic fetching of the four telemetry feeds.
//!
//! Every tick spawns one batch: vehicles, ETA, stops and shape requested
//! concurrently. A batch does not wait for the previous one, so batches may
//! overlap; they are handed out in completion order.

use std::sync::Arc;
use std::time::Duration;

use bustrack_api_types::{EtaRecord, RouteShapeResponse, RouteStopsResponse, VehicleRecord};
use bustrack_transit::identifiers::{RouteIdentifier, StopIdentifier};
use tokio::task::JoinSet;
use tokio::time::{Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::client::{FetchError, TelemetrySource};

/// Results of one tick. Each feed succeeds or fails on its own.
#[derive(Debug)]
pub struct PollBatch {
    /// Increases with every tick.
    pub id: u64,
    pub vehicles: Result<Vec<VehicleRecord>, FetchError>,
    pub eta: Result<Vec<EtaRecord>, FetchError>,
    pub stops: Result<RouteStopsResponse, FetchError>,
    pub shape: Result<RouteShapeResponse, FetchError>,
}

pub async fn fetch_batch(
    source: &dyn TelemetrySource,
    route: &RouteIdentifier,
    target: Option<&StopIdentifier>,
    id: u64,
) -> PollBatch {
    let (vehicles, eta, stops, shape) = tokio::join!(
        source.vehicles(),
        source.eta(target),
        source.stops(route),
        source.shape(route),
    );

    PollBatch {
        id,
        vehicles,
        eta,
        stops,
        shape,
    }
}

pub struct TelemetryPoller {
    source: Arc<dyn TelemetrySource>,
    route: RouteIdentifier,
    target: Option<StopIdentifier>,
    ticker: Interval,
    in_flight: JoinSet<PollBatch>,
    next_id: u64,
    cancel: CancellationToken,
}

impl TelemetryPoller {
    /// The first tick fires immediately. Must be called within a Tokio runtime.
    pub fn new(
        source: Arc<dyn TelemetrySource>,
        route: RouteIdentifier,
        target: Option<StopIdentifier>,
        interval: Duration,
        cancel: CancellationToken,
    ) -> Self {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        Self {
            source,
            route,
            target,
            ticker,
            in_flight: JoinSet::new(),
            next_id: 0,
            cancel,
        }
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    fn spawn_batch(&mut self) {
        let id = self.next_id;
        self.next_id += 1;

        let source = Arc::clone(&self.source);
        let route = self.route.clone();
        let target = self.target.clone();

        debug!(batch = id, in_flight = self.in_flight.len(), "Polling");
        self.in_flight
            .spawn(async move { fetch_batch(source.as_ref(), &route, target.as_ref(), id).await });
    }

    /// Wait for the next completed batch, spawning new ones on every tick.
    ///
    /// Returns `None` once cancelled; in-flight batches are aborted and never
    /// returned. Cancel-safe.
    pub async fn next_batch(&mut self) -> Option<PollBatch> {
        loop {
            tokio::select! {
                biased;

                _ = self.cancel.cancelled() => {
                    self.shutdown().await;
                    return None;
                }

                Some(joined) = self.in_flight.join_next() => match joined {
                    Ok(batch) => return Some(batch),
                    Err(e) if e.is_cancelled() => {}
                    Err(e) => warn!(error = %e, "Poll batch panicked"),
                },

                _ = self.ticker.tick() => self.spawn_batch(),
            }
        }
    }

    /// Abort every in-flight batch and wait for them to go away.
    pub async fn shutdown(&mut self) {
        if !self.in_flight.is_empty() {
            debug!(aborted = self.in_flight.len(), "Aborting in-flight polls");
        }
        self.in_flight.shutdown().await;
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;
    use tokio::time::Instant;

    use crate::client::{Endpoint, FetchFuture};

    /// Canned backend. Every call takes `delay` and records when it started.
    pub(crate) struct FakeSource {
        pub delay: Duration,
        pub vehicles: Mutex<Vec<VehicleRecord>>,
        pub fail_eta: bool,
        pub calls: AtomicUsize,
        pub started: Mutex<Vec<Instant>>,
    }

    impl FakeSource {
        pub(crate) fn new(buses: &[&str]) -> Self {
            Self {
                delay: Duration::ZERO,
                vehicles: Mutex::new(
                    buses.iter().map(|b| vehicle_record(b, 3.14, 101.69)).collect(),
                ),
                fail_eta: false,
                calls: AtomicUsize::new(0),
                started: Mutex::new(Vec::new()),
            }
        }

        async fn pause(&self) {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
        }
    }

    pub(crate) fn vehicle_record(bus: &str, lat: f64, lon: f64) -> VehicleRecord {
        serde_json::from_value(json!({
            "bus_no": bus, "route": "T7890", "lat": lat, "lon": lon, "speed": 20
        }))
        .unwrap()
    }

    pub(crate) fn stops_response() -> RouteStopsResponse {
        serde_json::from_value(json!({
            "route_id": "T7890",
            "stops": [
                {
                    "stop_id": "s1", "stop_name": "Pasar Seni",
                    "stop_lat": 3.1422, "stop_lon": 101.6953, "sequence": 1
                },
                {
                    "stop_id": "s2", "stop_name": "Merdeka",
                    "stop_lat": 3.1390, "stop_lon": 101.7020, "sequence": 2
                },
                {
                    "stop_id": "s3", "stop_name": "Bukit Bintang",
                    "stop_lat": 3.1466, "stop_lon": 101.7114, "sequence": 3
                }
            ]
        }))
        .unwrap()
    }

    impl TelemetrySource for FakeSource {
        fn vehicles(&self) -> FetchFuture<'_, Vec<VehicleRecord>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.started.lock().unwrap().push(Instant::now());
            Box::pin(async move {
                self.pause().await;
                let vehicles = self.vehicles.lock().unwrap().clone();
                Ok(vehicles)
            })
        }

        fn eta<'a>(
            &'a self,
            _target: Option<&'a StopIdentifier>,
        ) -> FetchFuture<'a, Vec<EtaRecord>> {
            Box::pin(async move {
                self.pause().await;
                if self.fail_eta {
                    return Err(FetchError::Status {
                        endpoint: Endpoint::Eta,
                        status: 500,
                        message: Endpoint::Eta.fallback_message().to_owned(),
                    });
                }
                Ok(Vec::new())
            })
        }

        fn stops<'a>(&'a self, _route: &'a RouteIdentifier) -> FetchFuture<'a, RouteStopsResponse> {
            Box::pin(async move {
                self.pause().await;
                Ok(stops_response())
            })
        }

        fn shape<'a>(&'a self, _route: &'a RouteIdentifier) -> FetchFuture<'a, RouteShapeResponse> {
            Box::pin(async move {
                self.pause().await;
                Ok(RouteShapeResponse::default())
            })
        }
    }

    fn poller(source: Arc<FakeSource>, cancel: CancellationToken) -> TelemetryPoller {
        TelemetryPoller::new(
            source,
            RouteIdentifier::new("T7890"),
            None,
            Duration::from_secs(15),
            cancel,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_batch_is_immediate() {
        let source = Arc::new(FakeSource::new(&["A1"]));
        let mut poller = poller(Arc::clone(&source), CancellationToken::new());
        let start = Instant::now();

        let batch = poller.next_batch().await.unwrap();
        assert_eq!(batch.id, 0);
        assert_eq!(start.elapsed().as_secs(), 0);
        assert_eq!(batch.vehicles.unwrap().len(), 1);
        assert_eq!(batch.stops.unwrap().stops.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_batches_follow_the_interval() {
        let source = Arc::new(FakeSource::new(&["A1"]));
        let mut poller = poller(Arc::clone(&source), CancellationToken::new());
        let start = Instant::now();

        poller.next_batch().await.unwrap();
        let second = poller.next_batch().await.unwrap();
        let third = poller.next_batch().await.unwrap();

        assert_eq!((second.id, third.id), (1, 2));
        assert_eq!(start.elapsed().as_secs(), 30);
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_batches_overlap() {
        let mut source = FakeSource::new(&["A1"]);
        source.delay = Duration::from_secs(20);
        let source = Arc::new(source);
        let mut poller = poller(Arc::clone(&source), CancellationToken::new());
        let start = Instant::now();

        let first = poller.next_batch().await.unwrap();
        assert_eq!(first.id, 0);
        assert_eq!(start.elapsed().as_secs(), 20);

        // The tick at 15s did not wait for the first batch.
        let started: Vec<u64> = source
            .started
            .lock()
            .unwrap()
            .iter()
            .map(|t| (*t - start).as_secs())
            .collect();
        assert_eq!(started, vec![0, 15]);
        assert_eq!(poller.in_flight(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_feeds_fail_independently() {
        let mut source = FakeSource::new(&["A1", "B2"]);
        source.fail_eta = true;
        let mut poller = poller(Arc::new(source), CancellationToken::new());

        let batch = poller.next_batch().await.unwrap();
        assert!(batch.eta.is_err());
        assert_eq!(batch.vehicles.unwrap().len(), 2);
        assert!(batch.shape.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_aborts_in_flight() {
        let mut source = FakeSource::new(&["A1"]);
        source.delay = Duration::from_secs(60);
        let cancel = CancellationToken::new();
        let mut poller = poller(Arc::new(source), cancel.clone());

        let stopper = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            stopper.cancel();
        });

        assert!(poller.next_batch().await.is_none());
        assert_eq!(poller.in_flight(), 0);
        // Stays stopped.
        assert!(poller.next_batch().await.is_none());
    }
}
