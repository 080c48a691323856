//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file.
//! These are pure data types with no parsing or serialization logic.

use std::path::PathBuf;

/// Complete application configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    /// Traccar server settings
    pub server: ServerSettings,
    /// Reverse geocoder settings
    pub geocoder: GeocoderSettings,
    /// Poll timing and staleness
    pub polling: PollingSettings,
    /// Movement trail settings
    pub trail: TrailSettings,
    /// Logging settings
    pub logging: LoggingSettings,
}

/// Traccar server connection.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerSettings {
    /// API base URL, e.g. `http://localhost:8082/api`
    pub url: String,
    /// Account email for HTTP Basic authentication
    pub email: String,
    pub password: String,
    /// Request timeout in seconds.
    pub timeout: u64,
}

/// Nominatim-compatible reverse geocoder.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocoderSettings {
    pub url: String,
    /// Sent with every geocoder request; public Nominatim requires one.
    pub user_agent: String,
    pub zoom: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PollingSettings {
    /// Seconds between polls.
    pub interval: u64,
    /// Seconds after which a device report counts as stale.
    pub online_threshold: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrailSettings {
    /// Points kept per device.
    pub max_points: usize,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    /// Log file path
    pub file: PathBuf,
}
