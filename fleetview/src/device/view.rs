//! The merged, UI-facing representation of a device.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::model::{Device, DeviceId, GeoPoint, Position};

/// Online/offline classification derived from report staleness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    /// Reported within the staleness threshold.
    Online,
    /// No position, no report time, or the last report is too old.
    #[default]
    Offline,
}

impl DeviceStatus {
    pub fn is_online(&self) -> bool {
        matches!(self, Self::Online)
    }
}

impl std::fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Online => f.pad("online"),
            Self::Offline => f.pad("offline"),
        }
    }
}

/// A device joined with its most recent position.
///
/// Views are rebuilt wholesale on every poll; nothing mutates a view in
/// place except attaching a resolved address to the selected one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceView {
    /// Server metadata, unchanged.
    pub device: Device,

    /// Location of the chosen position, if the device has one.
    pub coordinates: Option<GeoPoint>,

    pub status: DeviceStatus,

    /// Position report time, or the device's own timestamp as a fallback.
    pub last_update: Option<DateTime<Utc>>,

    /// Speed in knots; 0 when unknown.
    pub speed: f64,

    /// Course in degrees; 0 when unknown.
    pub course: f64,

    /// Reverse-geocoded address, only ever set on the selected view.
    pub address: Option<String>,
}

impl DeviceView {
    /// Build a view from a device and its chosen position.
    pub(crate) fn build(device: &Device, position: Option<&Position>, status: DeviceStatus) -> Self {
        let last_update = position
            .and_then(|p| p.device_time)
            .or(device.last_update);

        Self {
            device: device.clone(),
            coordinates: position.map(Position::point),
            status,
            last_update,
            speed: position.and_then(|p| p.speed).unwrap_or(0.0),
            course: position.and_then(|p| p.course).unwrap_or(0.0),
            address: None,
        }
    }

    pub fn id(&self) -> DeviceId {
        self.device.id
    }

    pub fn name(&self) -> &str {
        &self.device.name
    }

    pub fn has_coordinates(&self) -> bool {
        self.coordinates.is_some()
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }
}
