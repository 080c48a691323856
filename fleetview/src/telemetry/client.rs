//! Telemetry client trait and Traccar implementation.
//!
//! The [`TelemetryClient`] trait is the only surface the tracking engine
//! depends on. [`TraccarClient`] talks to a Traccar REST API with HTTP Basic
//! authentication and to a Nominatim-compatible reverse geocoder.

use std::future::Future;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::config::TelemetryClientConfig;
use super::error::TelemetryError;
use crate::device::{Device, Position};

/// Returned by the geocoder when it has no address for a coordinate.
pub const UNKNOWN_LOCATION: &str = "Unknown location";

/// Operations the engine consumes from the remote side.
///
/// Every operation reports failure through `Err`; none of them swallow errors.
pub trait TelemetryClient: Send + Sync {
    /// Fetch all devices visible to the account.
    fn fetch_devices(&self) -> impl Future<Output = Result<Vec<Device>, TelemetryError>> + Send;

    /// Fetch the latest position of every device.
    fn fetch_positions(
        &self,
    ) -> impl Future<Output = Result<Vec<Position>, TelemetryError>> + Send;

    /// Resolve a coordinate pair to a human-readable address.
    fn reverse_geocode(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> impl Future<Output = Result<String, TelemetryError>> + Send;
}

/// Nominatim reverse response; only `display_name` is used.
#[derive(Deserialize)]
struct ReverseGeocodeResponse {
    display_name: Option<String>,
}

/// Traccar error bodies sometimes carry a JSON `message`.
#[derive(Deserialize)]
struct ServerErrorBody {
    message: String,
}

/// Client for a Traccar server plus a public reverse geocoder.
///
/// Uses a single reusable `reqwest::Client` with connection pooling and a
/// per-request timeout.
pub struct TraccarClient {
    http: reqwest::Client,
    config: TelemetryClientConfig,
}

impl TraccarClient {
    /// Create a client from configuration.
    pub fn new(config: TelemetryClientConfig) -> Result<Self, TelemetryError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| TelemetryError::ClientBuild(e.to_string()))?;

        Ok(Self { http, config })
    }

    /// The configured server base URL.
    pub fn server_url(&self) -> &str {
        &self.config.server_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.server_url.trim_end_matches('/'), path)
    }

    /// Authenticated GET against the Traccar API, decoding a JSON body.
    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, TelemetryError> {
        let url = self.endpoint(path);

        let response = self
            .http
            .get(&url)
            .basic_auth(&self.config.email, Some(&self.config.password))
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| TelemetryError::HttpError(e.to_string()))?;

        let response = check_status(response).await?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| TelemetryError::HttpError(e.to_string()))?;

        serde_json::from_slice(&bytes).map_err(|e| TelemetryError::JsonError(e.to_string()))
    }
}

impl TelemetryClient for TraccarClient {
    async fn fetch_devices(&self) -> Result<Vec<Device>, TelemetryError> {
        let devices: Vec<Device> = self.get_json("devices").await?;
        tracing::debug!(count = devices.len(), "Devices fetched");
        Ok(devices)
    }

    async fn fetch_positions(&self) -> Result<Vec<Position>, TelemetryError> {
        let positions: Vec<Position> = self.get_json("positions").await?;
        tracing::debug!(count = positions.len(), "Positions fetched");
        Ok(positions)
    }

    async fn reverse_geocode(&self, latitude: f64, longitude: f64) -> Result<String, TelemetryError> {
        let zoom = self.config.geocoder_zoom.to_string();
        let lat = latitude.to_string();
        let lon = longitude.to_string();

        let response = self
            .http
            .get(&self.config.geocoder_url)
            .query(&[
                ("format", "json"),
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("zoom", zoom.as_str()),
                ("addressdetails", "1"),
            ])
            .send()
            .await
            .map_err(|e| TelemetryError::HttpError(e.to_string()))?;

        let response = check_status(response).await?;

        let body: ReverseGeocodeResponse = response
            .json()
            .await
            .map_err(|e| TelemetryError::JsonError(e.to_string()))?;

        Ok(address_or_unknown(body))
    }
}

fn address_or_unknown(body: ReverseGeocodeResponse) -> String {
    body.display_name
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| UNKNOWN_LOCATION.to_string())
}

/// Turn a non-success response into [`TelemetryError::Status`].
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, TelemetryError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(TelemetryError::Status {
        status: status.as_u16(),
        message: error_message(&body, status.canonical_reason()),
    })
}

/// Prefer a JSON `message`, then the raw body, then the HTTP reason phrase.
fn error_message(body: &str, reason: Option<&str>) -> String {
    if let Ok(parsed) = serde_json::from_str::<ServerErrorBody>(body) {
        return parsed.message;
    }
    let trimmed = body.trim();
    if !trimmed.is_empty() {
        return trimmed.to_string();
    }
    reason.unwrap_or("request failed").to_string()
}
