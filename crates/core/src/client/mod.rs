//! Access to the tracking backend.

mod http;

use std::future::Future;
use std::pin::Pin;

use bustrack_api_types::{EtaRecord, RouteShapeResponse, RouteStopsResponse, VehicleRecord};
use bustrack_transit::identifiers::{RouteIdentifier, StopIdentifier};

pub use http::HttpTelemetryClient;

/// Backend calls the client knows about.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Endpoint {
    Vehicles,
    Eta,
    RouteStops,
    RouteShape,
    NearestStop,
    StopEta,
}

impl Endpoint {
    /// Shown when the backend gives no error message of its own.
    pub fn fallback_message(&self) -> &'static str {
        match self {
            Self::Vehicles => "Failed to fetch bus locations",
            Self::Eta => "Failed to fetch ETA",
            Self::RouteStops => "Failed to fetch route stops",
            Self::RouteShape => "Failed to fetch route shape",
            Self::NearestStop => "Failed to find the nearest stop",
            Self::StopEta => "Failed to fetch arrivals for stop",
        }
    }
}

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum FetchError {
    /// The request never produced a response.
    #[error("{message}: {reason}")]
    Network {
        endpoint: Endpoint,
        message: String,
        reason: String,
    },

    /// The backend answered with a non-success status.
    #[error("{message} (HTTP {status})")]
    Status {
        endpoint: Endpoint,
        status: u16,
        message: String,
    },
}

impl FetchError {
    pub fn endpoint(&self) -> Endpoint {
        match self {
            Self::Network { endpoint, .. } | Self::Status { endpoint, .. } => *endpoint,
        }
    }

    /// The user-facing message.
    pub fn message(&self) -> &str {
        match self {
            Self::Network { message, .. } | Self::Status { message, .. } => message,
        }
    }
}

pub type FetchFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, FetchError>> + Send + 'a>>;

/// The four feeds polled on every tick. Payloads come back normalized.
pub trait TelemetrySource: Send + Sync {
    fn vehicles(&self) -> FetchFuture<'_, Vec<VehicleRecord>>;

    /// Arrival estimates, toward `target` when one is given.
    fn eta<'a>(&'a self, target: Option<&'a StopIdentifier>) -> FetchFuture<'a, Vec<EtaRecord>>;

    fn stops<'a>(&'a self, route: &'a RouteIdentifier) -> FetchFuture<'a, RouteStopsResponse>;

    fn shape<'a>(&'a self, route: &'a RouteIdentifier) -> FetchFuture<'a, RouteShapeResponse>;
}
