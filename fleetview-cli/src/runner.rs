//! CLI runner for common setup and operations.
//!
//! Encapsulates config loading, logging initialization, and client creation
//! to reduce duplication across command handlers.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::CliError;
use fleetview::config::{config_file_path, ConfigFile};
use fleetview::logging::{init_logging, LoggingGuard, LoggingOptions};
use fleetview::telemetry::TraccarClient;

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Logging guard - keeps logging active while runner exists
    #[allow(dead_code)]
    logging_guard: LoggingGuard,
    /// Loaded configuration file
    config: ConfigFile,
    /// Where the configuration was read from
    config_path: PathBuf,
}

impl CliRunner {
    /// Load config and initialize logging.
    ///
    /// Stdout logging stays off: the commands own stdout for their output.
    /// Events go to the log file named in the config.
    ///
    /// # Arguments
    ///
    /// * `config_path` - Config file override; defaults to ~/.fleetview/config.ini
    /// * `debug_mode` - When true, enables debug-level logging unless RUST_LOG is set
    pub fn new(config_path: Option<&Path>, debug_mode: bool) -> Result<Self, CliError> {
        let config_path = config_path
            .map(Path::to_path_buf)
            .unwrap_or_else(config_file_path);
        let config = load_config(&config_path)?;

        let logging_guard = init_logging(
            &config.logging.file,
            LoggingOptions {
                stdout: false,
                debug: debug_mode,
            },
        )
        .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            logging_guard,
            config,
            config_path,
        })
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("FleetView v{}", fleetview::VERSION);
        info!(
            config = %self.config_path.display(),
            server = %self.config.server.url,
            "FleetView CLI: {} command",
            command
        );
    }

    /// Create a Traccar client from the loaded configuration.
    pub fn create_client(&self) -> Result<TraccarClient, CliError> {
        if self.config.server.email.is_empty() {
            tracing::warn!("No server email configured, requests will be unauthenticated");
        }

        TraccarClient::new(self.config.client_config()).map_err(CliError::ClientCreation)
    }
}

/// Load configuration from `path` with environment overrides applied.
pub fn load_config(path: &Path) -> Result<ConfigFile, CliError> {
    Ok(ConfigFile::load_from(path)?.with_env_overrides())
}
