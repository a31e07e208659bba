use std::time::Duration;

use bustrack_api_types::{
    ErrorBody, EtaRecord, NearestStopResponse, RouteShapeResponse, RouteStopsResponse,
    VehicleRecord, normalize,
};
use bustrack_transit::identifiers::{RouteIdentifier, StopIdentifier};
use reqwest::Url;
use serde_json::Value;
use tracing::{debug, warn};

use super::{Endpoint, FetchError, FetchFuture, TelemetrySource};
use crate::config::{ConfigError, TrackerConfig};

const VEHICLES_PATH: &str = "get-route-t789";
const ETA_PATH: &str = "get-t789-eta";

/// JSON-over-HTTP client for the tracking backend.
#[derive(Clone, Debug)]
pub struct HttpTelemetryClient {
    http: reqwest::Client,
    base: Url,
}

impl HttpTelemetryClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ConfigError> {
        let base = Url::parse(base_url).map_err(|e| ConfigError::BaseUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;
        if base.cannot_be_a_base() {
            return Err(ConfigError::BaseUrl {
                url: base_url.to_owned(),
                reason: "not a hierarchical URL".to_owned(),
            });
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self { http, base })
    }

    pub fn from_config(config: &TrackerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Self::new(&config.base_url, config.request_timeout())
    }

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// GET and decode the body as JSON. A success response with an
    /// undecodable body yields `Null`, which normalizes to empty.
    async fn get_json(&self, endpoint: Endpoint, url: Url) -> Result<Value, FetchError> {
        debug!(?endpoint, %url, "GET");

        let response = self.http.get(url).send().await.map_err(|e| FetchError::Network {
            endpoint,
            message: endpoint.fallback_message().to_owned(),
            reason: e.to_string(),
        })?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| FetchError::Network {
            endpoint,
            message: endpoint.fallback_message().to_owned(),
            reason: e.to_string(),
        })?;

        if !status.is_success() {
            return Err(FetchError::Status {
                endpoint,
                status: status.as_u16(),
                message: ErrorBody::message_or(&body, endpoint.fallback_message()),
            });
        }

        Ok(serde_json::from_slice(&body).unwrap_or_else(|e| {
            warn!(?endpoint, error = %e, "Response body is not JSON");
            Value::Null
        }))
    }

    /// The stop closest to a coordinate, across all routes.
    pub async fn nearest_stop(
        &self,
        lat: f64,
        lon: f64,
    ) -> Result<Option<NearestStopResponse>, FetchError> {
        let mut url = self.url(&["stops", "nearest"]);
        url.query_pairs_mut()
            .append_pair("lat", &lat.to_string())
            .append_pair("lon", &lon.to_string());

        let value = self.get_json(Endpoint::NearestStop, url).await?;
        match serde_json::from_value(value) {
            Ok(nearest) => Ok(Some(nearest)),
            Err(e) => {
                warn!(error = %e, "Unexpected nearest-stop payload");
                Ok(None)
            }
        }
    }

    /// Upcoming arrivals at one stop.
    pub async fn stop_eta(&self, stop: &StopIdentifier) -> Result<Vec<EtaRecord>, FetchError> {
        let url = self.url(&["stops", stop.as_str(), "eta"]);
        let value = self.get_json(Endpoint::StopEta, url).await?;
        Ok(normalize::eta(value))
    }
}

impl TelemetrySource for HttpTelemetryClient {
    fn vehicles(&self) -> FetchFuture<'_, Vec<VehicleRecord>> {
        Box::pin(async move {
            let value = self.get_json(Endpoint::Vehicles, self.url(&[VEHICLES_PATH])).await?;
            Ok(normalize::vehicles(value))
        })
    }

    fn eta<'a>(&'a self, target: Option<&'a StopIdentifier>) -> FetchFuture<'a, Vec<EtaRecord>> {
        Box::pin(async move {
            let mut url = self.url(&[ETA_PATH]);
            if let Some(stop) = target {
                url.query_pairs_mut().append_pair("stop_id", stop.as_str());
            }
            let value = self.get_json(Endpoint::Eta, url).await?;
            Ok(normalize::eta(value))
        })
    }

    fn stops<'a>(&'a self, route: &'a RouteIdentifier) -> FetchFuture<'a, RouteStopsResponse> {
        Box::pin(async move {
            let url = self.url(&["route", route.as_str(), "stops"]);
            let value = self.get_json(Endpoint::RouteStops, url).await?;
            Ok(normalize::stops(value))
        })
    }

    fn shape<'a>(&'a self, route: &'a RouteIdentifier) -> FetchFuture<'a, RouteShapeResponse> {
        Box::pin(async move {
            let url = self.url(&["route", route.as_str(), "shape"]);
            let value = self.get_json(Endpoint::RouteShape, url).await?;
            Ok(normalize::shape(value))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use axum::Json;
    use axum::Router;
    use axum::extract::{Path, Query};
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use axum::routing::get;
    use serde_json::json;

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn backend() -> Router {
        Router::new()
            .route(
                "/api/get-route-t789",
                get(|| async {
                    Json(json!({"bus_no": "WB1234", "lat": "3.139", "lon": 101.70, "speed": 22}))
                }),
            )
            .route(
                "/api/get-t789-eta",
                get(|Query(q): Query<HashMap<String, String>>| async move {
                    match q.get("stop_id").map(String::as_str) {
                        Some("KJ14") => Json(json!([
                            {"bus_no": "WB1234", "eta_minutes": 4.5, "stops_away": 2}
                        ]))
                        .into_response(),
                        Some(_) => (
                            StatusCode::INTERNAL_SERVER_ERROR,
                            Json(json!({"error": "ETA service down"})),
                        )
                            .into_response(),
                        None => Json(json!([])).into_response(),
                    }
                }),
            )
            .route(
                "/api/route/{route_id}/stops",
                get(|Path(route_id): Path<String>| async move {
                    Json(json!({
                        "route_id": route_id,
                        "route_short_name": "T789",
                        "stops": [
                            {
                                "stop_id": "KJ14", "stop_name": "Pasar Seni",
                                "stop_lat": 3.1422, "stop_lon": 101.6953, "sequence": 1
                            },
                            {"stop_id": "bad"}
                        ]
                    }))
                }),
            )
            .route(
                "/api/route/{route_id}/shape",
                get(|| async { (StatusCode::NOT_FOUND, "no shape here") }),
            )
            .route(
                "/api/stops/nearest",
                get(|Query(q): Query<HashMap<String, String>>| async move {
                    let lat: f64 = q.get("lat").and_then(|v| v.parse().ok()).unwrap_or_default();
                    Json(json!({
                        "stop_id": "KJ14",
                        "stop_name": "Pasar Seni",
                        "stop_lat": lat,
                        "stop_lon": 101.6953,
                        "distance_meters": 42.0
                    }))
                }),
            )
            .route(
                "/api/stops/{stop_id}/eta",
                get(|Path(stop_id): Path<String>| async move {
                    if stop_id == "KJ 15" {
                        Json(json!([{"bus_no": 77, "route_id": "T7890", "eta_minutes": "9"}]))
                    } else {
                        Json(json!("nope"))
                    }
                }),
            )
    }

    async fn client() -> HttpTelemetryClient {
        let base = serve(backend()).await;
        HttpTelemetryClient::new(&format!("{base}/api/"), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_bare_vehicle_object_becomes_one_record() {
        let client = client().await;
        let vehicles = client.vehicles().await.unwrap();
        assert_eq!(vehicles.len(), 1);
        assert_eq!(vehicles[0].bus_no, "WB1234");
        assert_eq!(vehicles[0].latitude, 3.139);
    }

    #[tokio::test]
    async fn test_eta_target_is_sent_as_query() {
        let client = client().await;

        let targeted = client.eta(Some(&StopIdentifier::new("KJ14"))).await.unwrap();
        assert_eq!(targeted.len(), 1);
        assert_eq!(targeted[0].stops_away, Some(2));

        let untargeted = client.eta(None).await.unwrap();
        assert!(untargeted.is_empty());
    }

    #[tokio::test]
    async fn test_error_body_message_is_used() {
        let client = client().await;
        let err = client.eta(Some(&StopIdentifier::new("KJ99"))).await.unwrap_err();

        assert_eq!(
            err,
            FetchError::Status {
                endpoint: Endpoint::Eta,
                status: 500,
                message: "ETA service down".to_owned(),
            }
        );
    }

    #[tokio::test]
    async fn test_generic_message_without_error_body() {
        let client = client().await;
        let err = client.shape(&RouteIdentifier::new("T7890")).await.unwrap_err();

        assert_eq!(err.endpoint(), Endpoint::RouteShape);
        assert_eq!(err.message(), "Failed to fetch route shape");
        assert!(matches!(err, FetchError::Status { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_stops_drop_malformed_entries() {
        let client = client().await;
        let stops = client.stops(&RouteIdentifier::new("T7890")).await.unwrap();

        assert_eq!(stops.route_id.as_deref(), Some("T7890"));
        assert_eq!(stops.route_short_name.as_deref(), Some("T789"));
        assert_eq!(stops.stops.len(), 1);
        assert_eq!(stops.stops[0].stop_id, "KJ14");
    }

    #[tokio::test]
    async fn test_nearest_stop() {
        let client = client().await;
        let nearest = client.nearest_stop(3.1421, 101.6951).await.unwrap().unwrap();

        assert_eq!(nearest.stop_id, "KJ14");
        assert_eq!(nearest.stop_lat, 3.1421);
        assert_eq!(nearest.distance_m(), Some(42.0));
    }

    #[tokio::test]
    async fn test_stop_eta_escapes_stop_id() {
        let client = client().await;

        let arrivals = client.stop_eta(&StopIdentifier::new("KJ 15")).await.unwrap();
        assert_eq!(arrivals.len(), 1);
        assert_eq!(arrivals[0].bus_no, "77");
        assert_eq!(arrivals[0].eta_minutes, Some(9.0));

        let malformed = client.stop_eta(&StopIdentifier::new("KJ14")).await.unwrap();
        assert!(malformed.is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_network_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client =
            HttpTelemetryClient::new(&format!("http://{addr}"), Duration::from_secs(2)).unwrap();
        let err = client.vehicles().await.unwrap_err();

        assert!(matches!(err, FetchError::Network { endpoint: Endpoint::Vehicles, .. }));
        assert_eq!(err.message(), "Failed to fetch bus locations");
    }

    #[test]
    fn test_rejects_unusable_base_url() {
        assert!(matches!(
            HttpTelemetryClient::new("not a url", Duration::from_secs(1)),
            Err(ConfigError::BaseUrl { .. })
        ));
        assert!(matches!(
            HttpTelemetryClient::new("mailto:buses@example.org", Duration::from_secs(1)),
            Err(ConfigError::BaseUrl { .. })
        ));
    }

    #[test]
    fn test_zero_timeout_config_rejected() {
        let config = TrackerConfig {
            request_timeout_secs: 0,
            ..Default::default()
        };
        assert!(matches!(
            HttpTelemetryClient::from_config(&config),
            Err(ConfigError::RequestTimeout)
        ));
    }

    #[test]
    fn test_url_joins_under_base_path() {
        let client =
            HttpTelemetryClient::new("http://127.0.0.1:3000/api", Duration::from_secs(1)).unwrap();
        assert_eq!(
            client.url(&["route", "T7890", "stops"]).as_str(),
            "http://127.0.0.1:3000/api/route/T7890/stops"
        );
    }
}
