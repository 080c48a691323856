//! INI serialization logic for converting `ConfigFile` → INI string.
//!
//! This module contains the `to_config_string()` function that produces
//! the commented INI representation written to `config.ini`.

use std::path::Path;

use super::settings::ConfigFile;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    format!(
        r#"[server]
; Traccar REST API base URL (default: http://localhost:8082/api)
url = {}
; Account used for HTTP Basic authentication
; Can be overridden with FLEETVIEW_EMAIL / FLEETVIEW_PASSWORD
email = {}
password = {}
; Timeout in seconds for HTTP requests (default: 10)
timeout = {}

[geocoder]
; Nominatim-compatible reverse geocoding endpoint
url = {}
; User-Agent sent with geocoder requests (public Nominatim requires one)
user_agent = {}
; Address detail level, 0-18 (default: 18, building level)
zoom = {}

[polling]
; Seconds between polls (default: 30)
interval = {}
; Seconds after which a device's last report counts as offline (default: 300)
online_threshold = {}

[trail]
; Number of recent distinct positions kept per device (default: 10)
max_points = {}

[logging]
; Log file path (cleared at the start of each session)
file = {}
"#,
        config.server.url,
        config.server.email,
        config.server.password,
        config.server.timeout,
        config.geocoder.url,
        config.geocoder.user_agent,
        config.geocoder.zoom,
        config.polling.interval,
        config.polling.online_threshold,
        config.trail.max_points,
        path_to_string(&config.logging.file),
    )
}

/// Convert a path to a string, replacing home directory with ~.
fn path_to_string(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(stripped) = path.strip_prefix(&home) {
            return format!("~/{}", stripped.display());
        }
    }
    path.display().to_string()
}
