//! Reverse-geocoding address cache.
//!
//! See [`GeocodeCache`] for the caching and coalescing rules.

mod cache;

pub use cache::{CoordKey, GeocodeCache, GeocodeStats, LOOKUP_FAILED};
