pub mod client;
pub mod config;
pub mod convert;
pub mod poller;
pub mod runner;
pub mod session;

pub use client::{Endpoint, FetchError, HttpTelemetryClient, TelemetrySource};
pub use config::{ConfigError, TrackerConfig};
pub use poller::{PollBatch, TelemetryPoller};
pub use runner::{Command, TrackingSession};
pub use session::{BatchOutcome, SessionController, VehicleDetail};

// Re-export the layers this crate is built on
pub use bustrack_api_types as api_types;
pub use bustrack_map as map;
pub use bustrack_transit as transit;
