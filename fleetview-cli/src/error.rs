//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::process;

use fleetview::config::ConfigFileError;
use fleetview::telemetry::TelemetryError;
use fleetview::tracker::TrackerError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Argument failed validation
    InvalidArgument(String),
    /// Configuration error
    Config(ConfigFileError),
    /// Failed to create the telemetry client
    ClientCreation(TelemetryError),
    /// A one-shot request to the server or geocoder failed
    Request(TelemetryError),
    /// The tracker service stopped unexpectedly
    Tracker(TrackerError),
    /// Failed to read or write the terminal
    Io(std::io::Error),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        if let Some(hint) = self.hint() {
            eprintln!();
            eprintln!("{}", hint);
        }

        process::exit(1)
    }

    /// Follow-up advice printed under the error, if any.
    fn hint(&self) -> Option<&'static str> {
        match self {
            CliError::Request(TelemetryError::HttpError(_)) => Some(
                "Could not reach the server. Check that:\n  \
                 1. The Traccar server is running\n  \
                 2. [server] url in the config file points at its /api endpoint\n  \
                 3. FLEETVIEW_SERVER_URL is not overriding it with a stale value",
            ),
            CliError::Request(TelemetryError::Status { status: 401, .. }) => Some(
                "The server rejected the credentials.\n\
                 Set [server] email/password in the config file, or export\n\
                 FLEETVIEW_EMAIL and FLEETVIEW_PASSWORD.",
            ),
            CliError::Request(e) if e.is_transient() => {
                Some("The server is busy or rate limiting. Try again in a moment.")
            }
            CliError::Config(_) => Some(
                "Run 'fleetview config path' to locate the file,\n\
                 or 'fleetview config init' to write a fresh default.",
            ),
            _ => None,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            CliError::Config(e) => write!(f, "Configuration error: {}", e),
            CliError::ClientCreation(e) => write!(f, "Failed to create client: {}", e),
            CliError::Request(e) => write!(f, "Request failed: {}", e),
            CliError::Tracker(e) => write!(f, "Tracker error: {}", e),
            CliError::Io(e) => write!(f, "Terminal I/O error: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(e) => Some(e),
            CliError::ClientCreation(e) => Some(e),
            CliError::Request(e) => Some(e),
            CliError::Tracker(e) => Some(e),
            CliError::Io(e) => Some(e),
            CliError::LoggingInit(_) | CliError::InvalidArgument(_) => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e)
    }
}

impl From<TelemetryError> for CliError {
    fn from(e: TelemetryError) -> Self {
        CliError::Request(e)
    }
}

impl From<TrackerError> for CliError {
    fn from(e: TrackerError) -> Self {
        CliError::Tracker(e)
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Io(e)
    }
}
