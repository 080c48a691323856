//! Telemetry client: the engine's view of the remote side.
//!
//! # Architecture
//!
//! ```text
//! TrackerService
//!     │
//!     ├── TelemetryClient trait ─► TraccarClient (reqwest, Basic auth)
//!     │       ├── fetch_devices()    GET {server}/devices
//!     │       ├── fetch_positions()  GET {server}/positions
//!     │       └── reverse_geocode()  GET {geocoder}?format=json&lat=..&lon=..
//!     │
//!     └── tests use an in-memory mock implementing the same trait
//! ```

mod client;
mod config;
mod error;

pub use client::{TelemetryClient, TraccarClient, UNKNOWN_LOCATION};
pub use config::{
    default_user_agent, TelemetryClientConfig, DEFAULT_GEOCODER_URL, DEFAULT_GEOCODER_ZOOM,
    DEFAULT_SERVER_URL, DEFAULT_TIMEOUT_SECS,
};
pub use error::TelemetryError;
