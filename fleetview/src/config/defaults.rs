//! Default values and constants for all configuration settings.
//!
//! Contains all `DEFAULT_*` constants and the `ConfigFile::default()`
//! implementation.

use super::file::config_directory;
use super::settings::*;
use crate::telemetry::{
    default_user_agent, DEFAULT_GEOCODER_URL, DEFAULT_GEOCODER_ZOOM, DEFAULT_SERVER_URL,
    DEFAULT_TIMEOUT_SECS,
};
use crate::tracker::{DEFAULT_POLL_INTERVAL, MAX_TRAIL_POINTS, ONLINE_THRESHOLD};

/// Default poll interval in seconds.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = DEFAULT_POLL_INTERVAL.as_secs();

/// Default staleness threshold in seconds.
pub const DEFAULT_ONLINE_THRESHOLD_SECS: u64 = ONLINE_THRESHOLD.as_secs();

/// Default trail length.
pub const DEFAULT_TRAIL_POINTS: usize = MAX_TRAIL_POINTS;

/// Log directory name under the config directory.
pub const DEFAULT_LOG_DIR: &str = "logs";

/// Default log file name.
pub const DEFAULT_LOG_FILE: &str = "fleetview.log";

/// Environment variable overriding `[server] url`.
pub const ENV_SERVER_URL: &str = "FLEETVIEW_SERVER_URL";

/// Environment variable overriding `[server] email`.
pub const ENV_EMAIL: &str = "FLEETVIEW_EMAIL";

/// Environment variable overriding `[server] password`.
pub const ENV_PASSWORD: &str = "FLEETVIEW_PASSWORD";

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            server: ServerSettings {
                url: DEFAULT_SERVER_URL.to_string(),
                email: String::new(),
                password: String::new(),
                timeout: DEFAULT_TIMEOUT_SECS,
            },
            geocoder: GeocoderSettings {
                url: DEFAULT_GEOCODER_URL.to_string(),
                user_agent: default_user_agent(),
                zoom: DEFAULT_GEOCODER_ZOOM,
            },
            polling: PollingSettings {
                interval: DEFAULT_POLL_INTERVAL_SECS,
                online_threshold: DEFAULT_ONLINE_THRESHOLD_SECS,
            },
            trail: TrailSettings {
                max_points: DEFAULT_TRAIL_POINTS,
            },
            logging: LoggingSettings {
                file: config_directory()
                    .join(DEFAULT_LOG_DIR)
                    .join(DEFAULT_LOG_FILE),
            },
        }
    }
}
