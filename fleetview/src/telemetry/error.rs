//! Error types for the telemetry client.

use thiserror::Error;

/// Errors that can occur when talking to the telemetry server or geocoder.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Could not construct the HTTP client.
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    /// Request failed before a response was received (DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    /// Server answered with a non-success status.
    #[error("Server returned {status}: {message}")]
    Status { status: u16, message: String },

    /// Response body was not the expected JSON.
    #[error("Failed to parse response: {0}")]
    JsonError(String),
}

impl TelemetryError {
    /// Whether retrying later could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::HttpError(_) => true,
            Self::Status { status, .. } => *status >= 500 || *status == 429,
            Self::ClientBuild(_) | Self::JsonError(_) => false,
        }
    }
}
