//! FleetView - live device tracking for Traccar servers
//!
//! This library polls a Traccar server for devices and their latest
//! positions and reconciles them into a presentation state: one view per
//! device with online/offline status, bounded movement trails, name search,
//! a stable selection, and cached reverse-geocoded addresses.
//!
//! # High-Level API
//!
//! For most use cases, the [`tracker`] module provides a running service:
//!
//! ```no_run
//! use fleetview::config::ConfigFile;
//! use fleetview::telemetry::TraccarClient;
//! use fleetview::tracker::TrackerService;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConfigFile::load()?;
//! let client = TraccarClient::new(config.client_config())?;
//! let handle = TrackerService::new(client, config.tracker_config()).start();
//!
//! let mut snapshots = handle.subscribe();
//! snapshots.changed().await?;
//! println!("{} devices", snapshots.borrow().devices.len());
//!
//! handle.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod device;
pub mod geocode;
pub mod logging;
pub mod telemetry;
pub mod time;
pub mod tracker;

/// Version of the FleetView library and CLI.
///
/// This is synchronized across all components in the workspace.
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
