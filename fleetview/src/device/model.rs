//! Server-sourced records: devices and positions.
//!
//! These types mirror the JSON returned by the telemetry server's
//! `/devices` and `/positions` endpoints. Only the fields the engine needs
//! are typed; everything else is kept in `extra` and passed through
//! unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Stable device identifier assigned by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(pub i64);

impl std::fmt::Display for DeviceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for DeviceId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(DeviceId)
    }
}

/// A latitude/longitude pair in decimal degrees.
///
/// Equality is exact on both components; two points are the same only if
/// the server reported identical values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// A tracked unit as reported by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub id: DeviceId,

    #[serde(default)]
    pub name: String,

    /// The server's own notion of when the device last reported.
    ///
    /// Used only as a fallback when no position is available.
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub last_update: Option<DateTime<Utc>>,

    /// Remaining server metadata, passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Device {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id: DeviceId(id),
            name: name.into(),
            last_update: None,
            extra: Map::new(),
        }
    }
}

/// A single location report for a device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub device_id: DeviceId,
    pub latitude: f64,
    pub longitude: f64,

    /// Speed in knots, as reported by the server.
    #[serde(default)]
    pub speed: Option<f64>,

    /// Course over ground in degrees.
    #[serde(default)]
    pub course: Option<f64>,

    /// When the device physically produced this report (not the poll time).
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub device_time: Option<DateTime<Utc>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Position {
    pub fn new(device_id: i64, latitude: f64, longitude: f64) -> Self {
        Self {
            device_id: DeviceId(device_id),
            latitude,
            longitude,
            speed: None,
            course: None,
            device_time: None,
            extra: Map::new(),
        }
    }

    pub fn with_device_time(mut self, device_time: DateTime<Utc>) -> Self {
        self.device_time = Some(device_time);
        self
    }

    pub fn with_motion(mut self, speed: f64, course: f64) -> Self {
        self.speed = Some(speed);
        self.course = Some(course);
        self
    }

    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

/// Deserialize an optional RFC 3339 timestamp, mapping malformed values to `None`.
///
/// A bad timestamp on one record must not fail the whole poll.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::String(s)) => match DateTime::parse_from_rfc3339(&s) {
            Ok(ts) => Some(ts.with_timezone(&Utc)),
            Err(e) => {
                tracing::debug!(value = %s, error = %e, "Ignoring malformed timestamp");
                None
            }
        },
        _ => None,
    })
}
