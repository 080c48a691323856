//! Map framing for the current view set.

use serde::Serialize;

use crate::device::{DeviceView, GeoPoint};

/// Map centre used before any device has coordinates.
pub const DEFAULT_CENTER: GeoPoint = GeoPoint {
    latitude: 9.145,
    longitude: 40.4897,
};

pub const DEFAULT_ZOOM: u8 = 6;

/// Zoom used when centring on the selected device.
pub const SELECTED_ZOOM: u8 = 13;

/// Padding in pixels around fitted bounds.
pub const FIT_PADDING: u32 = 50;

/// Axis-aligned box around a set of points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub south_west: GeoPoint,
    pub north_east: GeoPoint,
}

impl Bounds {
    /// Smallest box containing every point, `None` for an empty input.
    pub fn enclosing(points: impl IntoIterator<Item = GeoPoint>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;

        let bounds = iter.fold(
            Self {
                south_west: first,
                north_east: first,
            },
            |b, p| Self {
                south_west: GeoPoint::new(
                    b.south_west.latitude.min(p.latitude),
                    b.south_west.longitude.min(p.longitude),
                ),
                north_east: GeoPoint::new(
                    b.north_east.latitude.max(p.latitude),
                    b.north_east.longitude.max(p.longitude),
                ),
            },
        );
        Some(bounds)
    }

    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(
            (self.south_west.latitude + self.north_east.latitude) / 2.0,
            (self.south_west.longitude + self.north_east.longitude) / 2.0,
        )
    }
}

/// How a map should frame the visible devices.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum MapFrame {
    /// Nothing to show yet.
    Default { center: GeoPoint, zoom: u8 },
    /// Fit every located device.
    Fit { bounds: Bounds, padding: u32 },
    /// Fly to the selected device.
    Center { center: GeoPoint, zoom: u8 },
}

impl Default for MapFrame {
    fn default() -> Self {
        Self::Default {
            center: DEFAULT_CENTER,
            zoom: DEFAULT_ZOOM,
        }
    }
}

/// Pick a frame: the located selection wins, then all located views.
pub fn frame(views: &[DeviceView], selected: Option<&DeviceView>) -> MapFrame {
    if let Some(center) = selected.and_then(|v| v.coordinates) {
        return MapFrame::Center {
            center,
            zoom: SELECTED_ZOOM,
        };
    }

    match Bounds::enclosing(views.iter().filter_map(|v| v.coordinates)) {
        Some(bounds) => MapFrame::Fit {
            bounds,
            padding: FIT_PADDING,
        },
        None => MapFrame::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{Device, DeviceStatus, Position};

    fn view(id: i64, coords: Option<(f64, f64)>) -> DeviceView {
        let position = coords.map(|(lat, lon)| Position::new(id, lat, lon));
        DeviceView::build(&Device::new(id, "dev"), position.as_ref(), DeviceStatus::Online)
    }

    #[test]
    fn test_no_located_devices_uses_default() {
        assert_eq!(frame(&[], None), MapFrame::default());
        assert_eq!(frame(&[view(1, None)], None), MapFrame::default());
    }

    #[test]
    fn test_fit_covers_all_points() {
        let views = [view(1, Some((9.0, 40.0))), view(2, Some((8.0, 42.0))), view(3, None)];

        let MapFrame::Fit { bounds, padding } = frame(&views, None) else {
            panic!("expected fit");
        };
        assert_eq!(padding, FIT_PADDING);
        assert_eq!(bounds.south_west, GeoPoint::new(8.0, 40.0));
        assert_eq!(bounds.north_east, GeoPoint::new(9.0, 42.0));
        assert_eq!(bounds.center(), GeoPoint::new(8.5, 41.0));
    }

    #[test]
    fn test_selected_device_is_centred() {
        let views = [view(1, Some((9.0, 40.0))), view(2, Some((8.0, 42.0)))];
        assert_eq!(
            frame(&views, Some(&views[1])),
            MapFrame::Center {
                center: GeoPoint::new(8.0, 42.0),
                zoom: SELECTED_ZOOM
            }
        );
    }

    #[test]
    fn test_unlocated_selection_falls_back_to_fit() {
        let views = [view(1, Some((9.0, 40.0))), view(2, None)];
        assert!(matches!(frame(&views, Some(&views[1])), MapFrame::Fit { .. }));
    }
}
