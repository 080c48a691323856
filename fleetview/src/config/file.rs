//! Configuration file handling for ~/.fleetview/config.ini.
//!
//! Loads and saves user configuration with sensible defaults.
//! Settings structs live in [`super::settings`], constants in [`super::defaults`],
//! parsing in [`super::parser`], and serialization in [`super::writer`].
//!
//! Layering is defaults, then the file, then environment overrides.

use ini::Ini;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use super::defaults::{ENV_EMAIL, ENV_PASSWORD, ENV_SERVER_URL};
use super::settings::ConfigFile;
use crate::telemetry::TelemetryClientConfig;
use crate::tracker::TrackerConfig;

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    /// Failed to write config file
    #[error("Failed to write config file: {0}")]
    WriteError(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    /// Failed to create config directory
    #[error("Failed to create config directory: {0}")]
    DirectoryError(std::io::Error),
}

impl ConfigFile {
    /// Load configuration from the default path with environment overrides.
    pub fn load() -> Result<Self, ConfigFileError> {
        let path = config_file_path();
        Ok(Self::load_from(&path)?.with_env_overrides())
    }

    /// Load configuration from a specific path.
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)?;
        super::parser::parse_ini(&ini)
    }

    /// Apply `FLEETVIEW_*` environment variables.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup. Empty values are ignored.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get(ENV_SERVER_URL) {
            self.server.url = url.trim().to_string();
        }
        if let Some(email) = get(ENV_EMAIL) {
            self.server.email = email;
        }
        if let Some(password) = get(ENV_PASSWORD) {
            self.server.password = password;
        }
        self
    }

    /// Save configuration to the default path (~/.fleetview/config.ini).
    pub fn save(&self) -> Result<(), ConfigFileError> {
        let path = config_file_path();
        self.save_to(&path)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigFileError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigFileError::DirectoryError)?;
        }

        let content = super::writer::to_config_string(self);
        std::fs::write(path, content).map_err(|e| ConfigFileError::WriteError(e.to_string()))
    }

    /// Create the config file at `path` if it doesn't exist.
    ///
    /// Returns true if a new file was written.
    pub fn ensure_exists_at(path: &Path) -> Result<bool, ConfigFileError> {
        if path.exists() {
            return Ok(false);
        }
        Self::default().save_to(path)?;
        Ok(true)
    }

    /// Settings for the HTTP client.
    pub fn client_config(&self) -> TelemetryClientConfig {
        TelemetryClientConfig {
            server_url: self.server.url.clone(),
            email: self.server.email.clone(),
            password: self.server.password.clone(),
            geocoder_url: self.geocoder.url.clone(),
            user_agent: self.geocoder.user_agent.clone(),
            geocoder_zoom: self.geocoder.zoom,
            timeout: Duration::from_secs(self.server.timeout),
        }
    }

    /// Settings for the tracker service.
    pub fn tracker_config(&self) -> TrackerConfig {
        TrackerConfig {
            poll_interval: Duration::from_secs(self.polling.interval),
            online_threshold: Duration::from_secs(self.polling.online_threshold),
            trail_points: self.trail.max_points,
        }
    }
}

/// Get the path to the config directory (~/.fleetview).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".fleetview")
}

/// Get the path to the config file (~/.fleetview/config.ini).
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}
