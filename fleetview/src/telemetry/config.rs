//! Configuration for the telemetry client.

use std::time::Duration;

/// Default Traccar API base URL.
pub const DEFAULT_SERVER_URL: &str = "http://localhost:8082/api";

/// Default reverse-geocoding endpoint (Nominatim).
pub const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org/reverse";

/// Default HTTP timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Default Nominatim zoom level (18 = building).
pub const DEFAULT_GEOCODER_ZOOM: u8 = 18;

/// Configuration for [`TraccarClient`](super::TraccarClient).
#[derive(Debug, Clone)]
pub struct TelemetryClientConfig {
    /// Base URL of the Traccar REST API, without trailing slash.
    pub server_url: String,

    /// Account email for HTTP Basic authentication.
    pub email: String,

    /// Account password for HTTP Basic authentication.
    pub password: String,

    /// Reverse-geocoding endpoint.
    pub geocoder_url: String,

    /// User-Agent sent to the geocoder (Nominatim rejects anonymous clients).
    pub user_agent: String,

    /// Nominatim zoom (address detail level).
    pub geocoder_zoom: u8,

    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for TelemetryClientConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            email: String::new(),
            password: String::new(),
            geocoder_url: DEFAULT_GEOCODER_URL.to_string(),
            user_agent: default_user_agent(),
            geocoder_zoom: DEFAULT_GEOCODER_ZOOM,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// `fleetview/<version>`.
pub fn default_user_agent() -> String {
    format!("fleetview/{}", crate::VERSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TelemetryClientConfig::default();
        assert_eq!(config.server_url, DEFAULT_SERVER_URL);
        assert_eq!(config.geocoder_zoom, 18);
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert!(config.user_agent.starts_with("fleetview/"));
    }
}
