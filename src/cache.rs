//! In-memory key/value store with per-entry expiry.
//!
//! Expired entries are evicted lazily: a lookup that finds an entry at or past
//! its expiry removes it and reports a miss. There is no background sweep.
//! Stores may optionally be bounded, in which case inserting a new key beyond
//! capacity evicts the oldest-inserted key (FIFO, not LRU).

use parking_lot::Mutex;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use tokio::time::Instant;

use crate::utils::round_to_decimals;

pub const GEOCODE_TTL: Duration = Duration::from_secs(10 * 60);
pub const WEATHER_TTL: Duration = Duration::from_secs(10 * 60);
pub const AI_TEXT_TTL: Duration = Duration::from_secs(30 * 60);
pub const AI_TEXT_CAPACITY: usize = 100;

#[derive(Clone, Debug)]
pub struct CacheEntry<V> {
    pub value: V,
    pub expires_at: Instant,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entry_count: usize,
}

struct Inner<V> {
    entries: HashMap<String, CacheEntry<V>>,
    // Insertion order of live keys, only maintained for bounded stores.
    order: VecDeque<String>,
}

pub struct TtlCache<V> {
    name: &'static str,
    capacity: Option<usize>,
    inner: Mutex<Inner<V>>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            capacity: None,
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                order: VecDeque::new(),
            }),
        }
    }

    pub fn bounded(name: &'static str, capacity: usize) -> Self {
        Self {
            capacity: Some(capacity.max(1)),
            ..Self::new(name)
        }
    }

    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        let mut guard = self.inner.lock();
        let inner = &mut *guard;

        match inner.entries.get(key) {
            None => return None,
            Some(entry) if !entry.is_expired(now) => return Some(entry.value.clone()),
            Some(_) => {}
        }

        inner.entries.remove(key);
        if self.capacity.is_some() {
            inner.order.retain(|k| k != key);
        }
        tracing::debug!(cache = self.name, key, "cache entry expired");
        None
    }

    pub fn put(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let key = key.into();
        let entry = CacheEntry {
            value,
            expires_at: Instant::now() + ttl,
        };
        let mut inner = self.inner.lock();

        let is_new = inner.entries.insert(key.clone(), entry).is_none();

        if let Some(capacity) = self.capacity {
            if is_new {
                inner.order.push_back(key);
            }
            if inner.entries.len() > capacity {
                if let Some(oldest) = inner.order.pop_front() {
                    inner.entries.remove(&oldest);
                    tracing::debug!(cache = self.name, key = %oldest, "evicted oldest cache entry");
                }
            }
        }
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.order.clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entry_count: self.inner.lock().entries.len(),
        }
    }
}

pub fn geocode_cache_key(city: &str) -> String {
    city.trim().to_lowercase()
}

pub fn weather_cache_key(lat: f64, lon: f64, units: &str) -> String {
    format!(
        "{}_{}_{}",
        round_to_decimals(lat, 4),
        round_to_decimals(lon, 4),
        units
    )
}
