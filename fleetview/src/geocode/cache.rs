//! Address cache with request coalescing.
//!
//! # Architecture
//!
//! ```text
//! resolve(9.0, 40.0) ─┐
//!                     │                               lookup
//! resolve(9.0, 40.0) ─┼──► GeocodeCache ──(one call)──► reverse_geocode
//!                     │        │                           │
//! resolve(9.0, 40.0) ─┘        ▼                           ▼
//!                      [all callers get the same address or the sentinel]
//! ```
//!
//! Keys are the exact bit patterns of the coordinate pair; nothing is
//! rounded. Successful lookups are kept forever. Failed lookups store
//! nothing and every caller for that attempt receives [`LOOKUP_FAILED`].
//!
//! When a key is already in flight, later callers subscribe to a broadcast
//! channel instead of issuing another lookup. If the leading caller is
//! dropped mid-lookup its guard releases the key and waiters get the
//! sentinel.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::broadcast;

use crate::telemetry::TelemetryError;

/// Returned instead of an address when the lookup fails.
pub const LOOKUP_FAILED: &str = "Address lookup failed";

/// Cache key: exact bit patterns of latitude and longitude.
///
/// `0.0` and `-0.0` are different keys, as are any two values that differ
/// in the last bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CoordKey {
    lat_bits: u64,
    lon_bits: u64,
}

impl CoordKey {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            lat_bits: latitude.to_bits(),
            lon_bits: longitude.to_bits(),
        }
    }
}

/// Statistics for monitoring cache effectiveness.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GeocodeStats {
    /// Total resolve calls.
    pub requests: u64,
    /// Answered from the cache.
    pub hits: u64,
    /// Waited on another caller's in-flight lookup.
    pub coalesced: u64,
    /// Lookups actually issued.
    pub lookups: u64,
    /// Lookups that failed.
    pub failures: u64,
}

impl GeocodeStats {
    /// Fraction of requests answered without a new lookup (0.0 to 1.0).
    pub fn saved_ratio(&self) -> f64 {
        if self.requests == 0 {
            0.0
        } else {
            (self.hits + self.coalesced) as f64 / self.requests as f64
        }
    }
}

#[derive(Default)]
struct CacheState {
    resolved: HashMap<CoordKey, String>,
    in_flight: HashMap<CoordKey, broadcast::Sender<String>>,
    stats: GeocodeStats,
}

enum Registration {
    Hit(String),
    Waiter(broadcast::Receiver<String>),
    Leader(broadcast::Sender<String>),
}

/// Memoizing, coalescing reverse-geocode cache.
#[derive(Default)]
pub struct GeocodeCache {
    state: Mutex<CacheState>,
}

impl GeocodeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve an address, calling `lookup` only on a miss with nothing in flight.
    ///
    /// Never fails: lookup errors become [`LOOKUP_FAILED`].
    pub async fn resolve<F, Fut>(&self, latitude: f64, longitude: f64, lookup: F) -> String
    where
        F: FnOnce(f64, f64) -> Fut,
        Fut: Future<Output = Result<String, TelemetryError>>,
    {
        let key = CoordKey::new(latitude, longitude);

        match self.register(key) {
            Registration::Hit(address) => address,
            Registration::Waiter(mut rx) => match rx.recv().await {
                Ok(address) => address,
                Err(_) => LOOKUP_FAILED.to_string(),
            },
            Registration::Leader(tx) => {
                let guard = InFlightGuard {
                    cache: self,
                    key,
                    armed: true,
                };
                let result = lookup(latitude, longitude).await;
                guard.complete(tx, result, latitude, longitude)
            }
        }
    }

    /// Answer a request from the cache alone.
    ///
    /// A hit counts as a request in [`GeocodeStats`]. A miss records nothing;
    /// follow it with [`GeocodeCache::resolve`], which counts the request.
    pub fn cached(&self, latitude: f64, longitude: f64) -> Option<String> {
        let mut state = self.lock();
        let address = state
            .resolved
            .get(&CoordKey::new(latitude, longitude))
            .cloned()?;
        state.stats.requests += 1;
        state.stats.hits += 1;
        Some(address)
    }

    /// Cached address for an exact coordinate pair. Not counted in stats.
    pub fn get(&self, latitude: f64, longitude: f64) -> Option<String> {
        self.lock()
            .resolved
            .get(&CoordKey::new(latitude, longitude))
            .cloned()
    }

    /// Number of cached addresses.
    pub fn len(&self) -> usize {
        self.lock().resolved.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of lookups currently in flight.
    pub fn in_flight_count(&self) -> usize {
        self.lock().in_flight.len()
    }

    pub fn stats(&self) -> GeocodeStats {
        self.lock().stats
    }

    pub fn log_stats(&self) {
        let (stats, cached) = {
            let state = self.lock();
            (state.stats, state.resolved.len())
        };

        tracing::info!(
            requests = stats.requests,
            hits = stats.hits,
            coalesced = stats.coalesced,
            lookups = stats.lookups,
            failures = stats.failures,
            cached,
            saved_ratio = format!("{:.1}%", stats.saved_ratio() * 100.0),
            "Geocode cache statistics"
        );
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn register(&self, key: CoordKey) -> Registration {
        let mut state = self.lock();
        state.stats.requests += 1;

        if let Some(address) = state.resolved.get(&key).cloned() {
            state.stats.hits += 1;
            return Registration::Hit(address);
        }

        if let Some(tx) = state.in_flight.get(&key) {
            let rx = tx.subscribe();
            state.stats.coalesced += 1;
            tracing::debug!(?key, "Coalescing address lookup");
            return Registration::Waiter(rx);
        }

        // One result per lookup; capacity only needs to hold that.
        let (tx, _rx) = broadcast::channel(1);
        state.in_flight.insert(key, tx.clone());
        state.stats.lookups += 1;
        Registration::Leader(tx)
    }
}

/// Releases an in-flight key if the leading caller never completes.
struct InFlightGuard<'a> {
    cache: &'a GeocodeCache,
    key: CoordKey,
    armed: bool,
}

impl InFlightGuard<'_> {
    fn complete(
        mut self,
        tx: broadcast::Sender<String>,
        result: Result<String, TelemetryError>,
        latitude: f64,
        longitude: f64,
    ) -> String {
        self.armed = false;
        let mut state = self.cache.lock();
        state.in_flight.remove(&self.key);

        match result {
            Ok(address) => {
                state.resolved.insert(self.key, address.clone());
                // Waiters may have gone away; nothing to do then.
                let _ = tx.send(address.clone());
                tracing::debug!(latitude, longitude, %address, "Address resolved");
                address
            }
            Err(e) => {
                state.stats.failures += 1;
                tracing::warn!(latitude, longitude, error = %e, "Address lookup failed");
                // Dropping the sender wakes waiters with a closed channel.
                LOOKUP_FAILED.to_string()
            }
        }
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.cache.lock().in_flight.remove(&self.key);
            tracing::debug!(key = ?self.key, "Address lookup abandoned");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    async fn addis(_lat: f64, _lon: f64) -> Result<String, TelemetryError> {
        Ok("Addis Ababa".to_string())
    }

    #[tokio::test]
    async fn test_miss_then_hit_calls_lookup_once() {
        let cache = GeocodeCache::new();
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            let address = cache
                .resolve(9.0, 40.0, |lat, lon| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    addis(lat, lon)
                })
                .await;
            assert_eq!(address, "Addis Ababa");
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let stats = cache.stats();
        assert_eq!(stats.requests, 2);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.lookups, 1);
    }

    #[tokio::test]
    async fn test_cached_counts_hits_only() {
        let cache = GeocodeCache::new();
        assert!(cache.cached(9.0, 40.0).is_none());
        assert_eq!(cache.stats(), GeocodeStats::default());

        cache.resolve(9.0, 40.0, addis).await;
        assert_eq!(cache.cached(9.0, 40.0).as_deref(), Some("Addis Ababa"));

        let stats = cache.stats();
        assert_eq!(stats.requests, 2);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.lookups, 1);
        assert!((stats.saved_ratio() - 0.5).abs() < 0.001);
    }

    #[tokio::test]
    async fn test_lookup_receives_exact_coordinates() {
        let cache = GeocodeCache::new();
        let address = cache
            .resolve(9.012345, 38.765432, |lat, lon| async move {
                Ok(format!("{lat},{lon}"))
            })
            .await;
        assert_eq!(address, "9.012345,38.765432");
    }

    #[tokio::test]
    async fn test_nearby_coordinates_are_distinct_keys() {
        let cache = GeocodeCache::new();
        cache.resolve(9.0, 40.0, addis).await;

        assert!(cache.get(9.0, 40.0).is_some());
        assert!(cache.get(9.0000001, 40.0).is_none());
        assert!(cache.get(40.0, 9.0).is_none());
        assert_ne!(CoordKey::new(0.0, 0.0), CoordKey::new(-0.0, 0.0));
    }

    #[tokio::test]
    async fn test_failure_returns_sentinel_and_is_not_cached() {
        let cache = GeocodeCache::new();

        let address = cache
            .resolve(9.0, 40.0, |_, _| async {
                Err(TelemetryError::HttpError("connection refused".into()))
            })
            .await;
        assert_eq!(address, LOOKUP_FAILED);
        assert!(cache.is_empty());
        assert_eq!(cache.in_flight_count(), 0);

        // Next attempt performs a fresh lookup.
        let address = cache.resolve(9.0, 40.0, addis).await;
        assert_eq!(address, "Addis Ababa");
        assert_eq!(cache.stats().lookups, 2);
        assert_eq!(cache.stats().failures, 1);
    }

    #[tokio::test]
    async fn test_concurrent_requests_are_coalesced() {
        let cache = Arc::new(GeocodeCache::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();

        let leader = {
            let cache = Arc::clone(&cache);
            let calls = Arc::clone(&calls);
            tokio::spawn(async move {
                cache
                    .resolve(9.0, 40.0, move |_, _| async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        let _ = release_rx.await;
                        Ok("Addis Ababa".to_string())
                    })
                    .await
            })
        };

        // Let the leader register before the others arrive.
        while cache.in_flight_count() == 0 {
            tokio::task::yield_now().await;
        }

        let waiters: Vec<_> = (0..3)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let calls = Arc::clone(&calls);
                tokio::spawn(async move {
                    cache
                        .resolve(9.0, 40.0, move |lat, lon| {
                            calls.fetch_add(1, Ordering::SeqCst);
                            addis(lat, lon)
                        })
                        .await
                })
            })
            .collect();

        while cache.stats().coalesced < 3 {
            tokio::task::yield_now().await;
        }
        release_tx.send(()).unwrap();

        assert_eq!(leader.await.unwrap(), "Addis Ababa");
        for waiter in futures::future::join_all(waiters).await {
            assert_eq!(waiter.unwrap(), "Addis Ababa");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_waiters_get_sentinel_when_leader_fails() {
        let cache = Arc::new(GeocodeCache::new());
        let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();

        let leader = {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move {
                cache
                    .resolve(1.0, 2.0, move |_, _| async move {
                        let _ = release_rx.await;
                        Err(TelemetryError::Status {
                            status: 503,
                            message: "busy".into(),
                        })
                    })
                    .await
            })
        };
        while cache.in_flight_count() == 0 {
            tokio::task::yield_now().await;
        }

        let waiter = {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move { cache.resolve(1.0, 2.0, addis).await })
        };
        while cache.stats().coalesced < 1 {
            tokio::task::yield_now().await;
        }
        release_tx.send(()).unwrap();

        assert_eq!(leader.await.unwrap(), LOOKUP_FAILED);
        assert_eq!(waiter.await.unwrap(), LOOKUP_FAILED);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_abandoned_leader_releases_key() {
        let cache = Arc::new(GeocodeCache::new());

        let leader = {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move {
                cache
                    .resolve(5.0, 5.0, |_, _| async {
                        tokio::time::sleep(Duration::from_secs(3600)).await;
                        Ok("never".to_string())
                    })
                    .await
            })
        };
        while cache.in_flight_count() == 0 {
            tokio::task::yield_now().await;
        }

        leader.abort();
        let _ = leader.await;

        assert_eq!(cache.in_flight_count(), 0);
        assert_eq!(cache.resolve(5.0, 5.0, addis).await, "Addis Ababa");
    }

    #[test]
    fn test_saved_ratio() {
        let stats = GeocodeStats {
            requests: 4,
            hits: 2,
            coalesced: 1,
            lookups: 1,
            failures: 0,
        };
        assert!((stats.saved_ratio() - 0.75).abs() < 0.001);
        assert_eq!(GeocodeStats::default().saved_ratio(), 0.0);
    }
}
