//! User configuration for FleetView.
//!
//! Settings are read from `~/.fleetview/config.ini`, layered as
//! defaults → file → `FLEETVIEW_*` environment variables.
//!
//! # Example
//!
//! ```no_run
//! use fleetview::config::ConfigFile;
//!
//! let config = ConfigFile::load()?;
//! let client_config = config.client_config();
//! let tracker_config = config.tracker_config();
//! # Ok::<(), fleetview::config::ConfigFileError>(())
//! ```

mod defaults;
mod file;
mod parser;
mod settings;
mod writer;

pub use defaults::*;
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{
    ConfigFile, GeocoderSettings, LoggingSettings, PollingSettings, ServerSettings, TrailSettings,
};
