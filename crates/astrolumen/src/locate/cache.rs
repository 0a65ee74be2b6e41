//! Bounded in-memory LRU cache with optional TTL.
//!
//! Entries are never re-validated against their source; a cached lookup
//! stays valid until evicted by capacity or, when a TTL is set, by age.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

/// Time source for TTL checks
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

struct CacheEntry<V> {
    value: V,
    inserted_at: DateTime<Utc>,
    /// Access tick for LRU ordering
    last_used: u64,
}

pub struct BoundedCache<K, V> {
    capacity: usize,
    ttl: Option<Duration>,
    clock: Arc<dyn Clock>,
    entries: HashMap<K, CacheEntry<V>>,
    tick: u64,
}

impl<K, V> BoundedCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Cache holding at most `capacity` entries; zero disables caching.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            ttl: None,
            clock: Arc::new(SystemClock),
            entries: HashMap::new(),
            tick: 0,
        }
    }

    pub fn with_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&mut self, key: &K) -> Option<V> {
        let expired = match (self.entries.get(key), self.ttl) {
            (None, _) => return None,
            (Some(entry), Some(ttl)) => self.clock.now() - entry.inserted_at >= ttl,
            (Some(_), None) => false,
        };
        if expired {
            self.entries.remove(key);
            return None;
        }

        self.tick += 1;
        let tick = self.tick;
        self.entries.get_mut(key).map(|entry| {
            entry.last_used = tick;
            entry.value.clone()
        })
    }

    pub fn insert(&mut self, key: K, value: V) {
        if self.capacity == 0 {
            return;
        }
        if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
            self.evict_least_recent();
        }
        self.tick += 1;
        let entry = CacheEntry {
            value,
            inserted_at: self.clock.now(),
            last_used: self.tick,
        };
        self.entries.insert(key, entry);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn evict_least_recent(&mut self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.last_used)
            .map(|(key, _)| key.clone());
        if let Some(key) = oldest {
            self.entries.remove(&key);
        }
    }
}
