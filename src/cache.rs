//! Time-to-live cache for upstream weather lookups.
//!
//! The caller passes the current [`Instant`] on every call, so expiry is
//! deterministic under test and the cache carries no clock of its own.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

// ---

#[derive(Debug)]
pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: HashMap<K, (V, Instant)>,
}

impl<K: Eq + Hash, V: Clone> TtlCache<K, V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    /// Return a fresh entry, dropping it if it has expired.
    pub fn get(&mut self, key: &K, now: Instant) -> Option<V> {
        // ---
        let fresh = match self.entries.get(key) {
            Some((_, fetched_at)) => now.saturating_duration_since(*fetched_at) < self.ttl,
            None => return None,
        };
        if fresh {
            self.entries.get(key).map(|(value, _)| value.clone())
        } else {
            self.entries.remove(key);
            None
        }
    }

    pub fn insert(&mut self, key: K, value: V, now: Instant) {
        self.entries.insert(key, (value, now));
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Hashable forecast cache key; coordinates are quantized to 1e-4 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ForecastKey {
    lat_e4: i64,
    lon_e4: i64,
    hours: u32,
}

impl ForecastKey {
    pub fn new(lat: f64, lon: f64, hours: u32) -> Self {
        Self {
            lat_e4: (lat * 1e4).round() as i64,
            lon_e4: (lon * 1e4).round() as i64,
            hours,
        }
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn test_entry_expires_after_ttl() {
        // ---
        let start = Instant::now();
        let mut cache = TtlCache::new(Duration::from_secs(300));
        cache.insert("Kandahar".to_string(), (31.62, 65.71), start);

        let key = "Kandahar".to_string();
        assert_eq!(cache.get(&key, start + Duration::from_secs(299)), Some((31.62, 65.71)));
        assert_eq!(cache.get(&key, start + Duration::from_secs(300)), None);
        assert_eq!(cache.len(), 0, "expired entry should be dropped");
    }

    #[test]
    fn test_reinsert_refreshes_entry() {
        // ---
        let start = Instant::now();
        let mut cache = TtlCache::new(Duration::from_secs(60));
        cache.insert(1u8, "old", start);
        cache.insert(1u8, "new", start + Duration::from_secs(50));

        assert_eq!(cache.get(&1, start + Duration::from_secs(100)), Some("new"));
        assert_eq!(cache.get(&2, start), None);
    }

    #[test]
    fn test_forecast_key_quantizes_coordinates() {
        // ---
        assert_eq!(
            ForecastKey::new(31.620_57, 65.715_71, 24),
            ForecastKey::new(31.620_61, 65.715_73, 24)
        );
        assert_ne!(ForecastKey::new(31.62, 65.71, 24), ForecastKey::new(31.62, 65.71, 48));
    }
}
