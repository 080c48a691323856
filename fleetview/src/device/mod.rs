//! Device data model.
//!
//! - [`model`] - Server-sourced records: [`Device`], [`Position`], [`GeoPoint`]
//! - [`view`] - Derived per-device state: [`DeviceView`], [`DeviceStatus`]

mod model;
mod view;

pub use model::{Device, DeviceId, GeoPoint, Position};
pub use view::{DeviceStatus, DeviceView};
