//! Path tracking - bounded movement history per device.
//!
//! Each device gets a sliding window of its most recent distinct positions,
//! oldest first. A point equal to the current last point is dropped so a
//! stationary device does not grow its trail.
//!
//! Trails are fed from reconciled [`DeviceView`]s, not raw polls, so a
//! device missing from one poll keeps its trail as it was.

use std::collections::{HashMap, VecDeque};

use crate::device::{DeviceId, DeviceView, GeoPoint};

/// Default number of points kept per device.
pub const MAX_TRAIL_POINTS: usize = 10;

/// Recent distinct positions of one device, oldest first.
#[derive(Debug, Clone, PartialEq)]
pub struct PathTrail {
    points: VecDeque<GeoPoint>,
    capacity: usize,
}

impl PathTrail {
    fn new(capacity: usize) -> Self {
        Self {
            points: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Append `point` unless it repeats the last one. Returns true if appended.
    fn push(&mut self, point: GeoPoint) -> bool {
        if self.points.back() == Some(&point) {
            return false;
        }

        self.points.push_back(point);
        while self.points.len() > self.capacity {
            self.points.pop_front();
        }
        true
    }

    /// Copy of the points, oldest first.
    pub fn points(&self) -> Vec<GeoPoint> {
        self.points.iter().copied().collect()
    }

    pub fn last(&self) -> Option<GeoPoint> {
        self.points.back().copied()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// All trails, keyed by device id. Lives for the life of the tracker.
#[derive(Debug, Clone)]
pub struct TrailBook {
    trails: HashMap<DeviceId, PathTrail>,
    capacity: usize,
}

impl TrailBook {
    pub fn new() -> Self {
        Self::with_capacity(MAX_TRAIL_POINTS)
    }

    /// Create a book whose trails keep `capacity` points (minimum 1).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            trails: HashMap::new(),
            capacity: capacity.max(1),
        }
    }

    /// Append a point to a device's trail, creating the trail on first sighting.
    pub fn append_point(&mut self, device_id: DeviceId, point: GeoPoint) -> &PathTrail {
        let capacity = self.capacity;
        let trail = self
            .trails
            .entry(device_id)
            .or_insert_with(|| PathTrail::new(capacity));

        if trail.push(point) {
            tracing::trace!(
                device_id = %device_id,
                latitude = point.latitude,
                longitude = point.longitude,
                len = trail.len(),
                "Trail extended"
            );
        }
        trail
    }

    /// Record one reconciliation cycle. Views without coordinates are skipped.
    pub fn record_views(&mut self, views: &[DeviceView]) {
        for view in views {
            if let Some(point) = view.coordinates {
                self.append_point(view.id(), point);
            }
        }
    }

    pub fn trail(&self, device_id: DeviceId) -> Option<&PathTrail> {
        self.trails.get(&device_id)
    }

    /// Points of a device's trail, empty if never seen.
    pub fn points(&self, device_id: DeviceId) -> Vec<GeoPoint> {
        self.trail(device_id)
            .map(PathTrail::points)
            .unwrap_or_default()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of devices with a trail.
    pub fn len(&self) -> usize {
        self.trails.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trails.is_empty()
    }
}

impl Default for TrailBook {
    fn default() -> Self {
        Self::new()
    }
}
