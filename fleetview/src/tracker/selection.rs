//! Selection and filtering over reconciled views.
//!
//! # Selection lifecycle
//!
//! ```text
//!            pick(id)                 refresh (id present)
//!   None ─────────────► Selected ◄──────────────────────┐
//!    ▲                    │  │                           │
//!    │     clear()        │  └───────────────────────────┘
//!    └────────────────────┘
//!                         │ refresh (id absent)
//!                         ▼
//!                 Selected, detached (last known view kept)
//! ```
//!
//! A poll never clears the selection. When the selected device disappears
//! from a poll, its last known view is kept and flagged as detached; the
//! flag drops as soon as the device shows up again.
//!
//! A failed address lookup stays on the view until the device moves or is
//! picked again; only an explicit pick retries it.

use crate::device::{DeviceId, DeviceView, GeoPoint};
use crate::geocode::LOOKUP_FAILED;

/// Views whose name contains `term`, ignoring case. Blank terms match everything.
pub fn filter_by_name(views: &[DeviceView], term: &str) -> Vec<DeviceView> {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return views.to_vec();
    }

    views
        .iter()
        .filter(|v| v.name().to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

/// The view with `selected_id`, if present.
pub fn resolve_selection(views: &[DeviceView], selected_id: DeviceId) -> Option<DeviceView> {
    views.iter().find(|v| v.id() == selected_id).cloned()
}

/// The user's current device selection.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Selection {
    #[default]
    None,
    Selected {
        view: DeviceView,
        /// The device was absent from the most recent poll.
        detached: bool,
    },
}

impl Selection {
    /// Select `id` from `views`. Unknown ids leave the selection unchanged.
    ///
    /// Returns true if the selection changed to the requested device.
    pub fn pick(&mut self, views: &[DeviceView], id: DeviceId) -> bool {
        match resolve_selection(views, id) {
            Some(view) => {
                // Re-picking the same device keeps a resolved address but
                // drops a failed one so the lookup runs again.
                let address = match self {
                    Self::Selected { view: current, .. }
                        if current.id() == id && current.coordinates == view.coordinates =>
                    {
                        current.address.clone().filter(|a| a != LOOKUP_FAILED)
                    }
                    _ => None,
                };
                *self = Self::Selected {
                    view: DeviceView { address, ..view },
                    detached: false,
                };
                true
            }
            None => {
                tracing::debug!(device_id = %id, "Ignoring selection of unknown device");
                false
            }
        }
    }

    pub fn clear(&mut self) {
        *self = Self::None;
    }

    /// Re-resolve after a reconciliation.
    ///
    /// `fresh` is the new view for the selected id, or `None` if it vanished.
    pub fn refresh(&mut self, fresh: Option<DeviceView>) {
        let Self::Selected { view, detached } = self else {
            return;
        };

        match fresh {
            Some(new_view) => {
                // Keep the address only while the device has not moved.
                let address = if new_view.coordinates == view.coordinates {
                    view.address.take()
                } else {
                    None
                };
                *view = DeviceView { address, ..new_view };
                *detached = false;
            }
            None => {
                if !*detached {
                    tracing::info!(
                        device_id = %view.id(),
                        "Selected device missing from poll, keeping last known view"
                    );
                }
                *detached = true;
            }
        }
    }

    /// Attach a resolved address if it is still relevant.
    ///
    /// Ignored when another device is selected or the selected device has
    /// moved since the lookup started. Returns true if attached.
    pub fn attach_address(&mut self, id: DeviceId, point: GeoPoint, address: String) -> bool {
        match self {
            Self::Selected { view, .. } if view.id() == id && view.coordinates == Some(point) => {
                view.address = Some(address);
                true
            }
            _ => false,
        }
    }

    pub fn id(&self) -> Option<DeviceId> {
        self.view().map(DeviceView::id)
    }

    pub fn view(&self) -> Option<&DeviceView> {
        match self {
            Self::Selected { view, .. } => Some(view),
            Self::None => None,
        }
    }

    pub fn is_detached(&self) -> bool {
        matches!(self, Self::Selected { detached: true, .. })
    }

    /// Coordinates that still need an address, if any.
    pub fn pending_address(&self) -> Option<(DeviceId, GeoPoint)> {
        match self {
            Self::Selected { view, .. } if view.address.is_none() => {
                view.coordinates.map(|point| (view.id(), point))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{Device, DeviceStatus, Position};

    fn view(id: i64, name: &str, coords: Option<(f64, f64)>) -> DeviceView {
        let position = coords.map(|(lat, lon)| Position::new(id, lat, lon));
        DeviceView::build(&Device::new(id, name), position.as_ref(), DeviceStatus::Offline)
    }

    fn fleet() -> Vec<DeviceView> {
        vec![
            view(1, "Truck A", Some((9.0, 40.0))),
            view(2, "Van B", Some((8.9, 38.7))),
            view(3, "truck C", None),
        ]
    }

    #[test]
    fn test_filter_empty_term_returns_all_in_order() {
        let views = fleet();
        assert_eq!(filter_by_name(&views, ""), views);
        assert_eq!(filter_by_name(&views, "   "), views);
    }

    #[test]
    fn test_filter_no_match_is_empty() {
        assert!(filter_by_name(&fleet(), "ZZZ").is_empty());
    }

    #[test]
    fn test_filter_case_insensitive_substring() {
        let names: Vec<String> = filter_by_name(&fleet(), "TRUCK")
            .iter()
            .map(|v| v.name().to_string())
            .collect();
        assert_eq!(names, vec!["Truck A", "truck C"]);
    }

    #[test]
    fn test_filter_trims_term() {
        assert_eq!(filter_by_name(&fleet(), "  van ").len(), 1);
    }

    #[test]
    fn test_resolve_selection() {
        let views = fleet();
        assert_eq!(resolve_selection(&views, DeviceId(2)).unwrap().name(), "Van B");
        assert!(resolve_selection(&views, DeviceId(9)).is_none());
    }

    #[test]
    fn test_pick_known_device() {
        let mut selection = Selection::default();
        assert!(selection.pick(&fleet(), DeviceId(1)));
        assert_eq!(selection.id(), Some(DeviceId(1)));
        assert!(!selection.is_detached());
    }

    #[test]
    fn test_pick_unknown_device_is_rejected() {
        let mut selection = Selection::default();
        assert!(!selection.pick(&fleet(), DeviceId(42)));
        assert_eq!(selection, Selection::None);
    }

    #[test]
    fn test_refresh_updates_same_device() {
        let mut selection = Selection::default();
        selection.pick(&fleet(), DeviceId(1));

        selection.refresh(Some(view(1, "Truck A", Some((9.1, 40.1)))));

        let current = selection.view().unwrap();
        assert_eq!(current.id(), DeviceId(1));
        assert_eq!(current.coordinates, Some(GeoPoint::new(9.1, 40.1)));
    }

    #[test]
    fn test_refresh_vanished_keeps_last_view() {
        let mut selection = Selection::default();
        selection.pick(&fleet(), DeviceId(1));

        selection.refresh(None);

        assert!(selection.is_detached());
        assert_eq!(selection.id(), Some(DeviceId(1)));
        assert_eq!(
            selection.view().unwrap().coordinates,
            Some(GeoPoint::new(9.0, 40.0))
        );
    }

    #[test]
    fn test_reappearing_device_reattaches() {
        let mut selection = Selection::default();
        selection.pick(&fleet(), DeviceId(1));
        selection.refresh(None);
        selection.refresh(Some(view(1, "Truck A", Some((9.0, 40.0)))));

        assert!(!selection.is_detached());
    }

    #[test]
    fn test_refresh_on_none_stays_none() {
        let mut selection = Selection::None;
        selection.refresh(Some(view(1, "Truck A", None)));
        assert_eq!(selection, Selection::None);
    }

    #[test]
    fn test_address_kept_while_stationary() {
        let mut selection = Selection::default();
        selection.pick(&fleet(), DeviceId(1));
        assert!(selection.attach_address(DeviceId(1), GeoPoint::new(9.0, 40.0), "Addis Ababa".into()));

        selection.refresh(Some(view(1, "Truck A", Some((9.0, 40.0)))));
        assert_eq!(
            selection.view().unwrap().address.as_deref(),
            Some("Addis Ababa")
        );

        selection.refresh(Some(view(1, "Truck A", Some((9.2, 40.0)))));
        assert!(selection.view().unwrap().address.is_none());
        assert_eq!(
            selection.pending_address(),
            Some((DeviceId(1), GeoPoint::new(9.2, 40.0)))
        );
    }

    #[test]
    fn test_repick_keeps_resolved_address() {
        let mut selection = Selection::default();
        selection.pick(&fleet(), DeviceId(1));
        selection.attach_address(DeviceId(1), GeoPoint::new(9.0, 40.0), "Addis Ababa".into());

        assert!(selection.pick(&fleet(), DeviceId(1)));
        assert_eq!(
            selection.view().unwrap().address.as_deref(),
            Some("Addis Ababa")
        );
        assert!(selection.pending_address().is_none());
    }

    #[test]
    fn test_repick_retries_failed_lookup() {
        let mut selection = Selection::default();
        selection.pick(&fleet(), DeviceId(1));
        selection.attach_address(DeviceId(1), GeoPoint::new(9.0, 40.0), LOOKUP_FAILED.into());

        // A poll at the same spot does not retry.
        selection.refresh(Some(view(1, "Truck A", Some((9.0, 40.0)))));
        assert!(selection.pending_address().is_none());

        assert!(selection.pick(&fleet(), DeviceId(1)));
        assert!(selection.view().unwrap().address.is_none());
        assert_eq!(
            selection.pending_address(),
            Some((DeviceId(1), GeoPoint::new(9.0, 40.0)))
        );
    }

    #[test]
    fn test_stale_address_rejected() {
        let mut selection = Selection::default();
        selection.pick(&fleet(), DeviceId(1));

        assert!(!selection.attach_address(DeviceId(2), GeoPoint::new(8.9, 38.7), "Elsewhere".into()));
        assert!(!selection.attach_address(DeviceId(1), GeoPoint::new(1.0, 1.0), "Old spot".into()));
        assert!(selection.view().unwrap().address.is_none());
    }

    #[test]
    fn test_pending_address_requires_coordinates() {
        let mut selection = Selection::default();
        selection.pick(&fleet(), DeviceId(3));
        assert!(selection.pending_address().is_none());
    }

    #[test]
    fn test_clear() {
        let mut selection = Selection::default();
        selection.pick(&fleet(), DeviceId(2));
        selection.clear();
        assert!(selection.id().is_none());
    }
}
