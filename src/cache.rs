// src/cache.rs
//! Bounded TTL cache for vision verdicts, keyed by image content hash.
//!
//! - Entries expire `ttl` after insertion (absolute TTL, no sliding refresh).
//! - At capacity the oldest insertion is evicted first.
//! - Expired entries are never returned and are purged lazily.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug)]
struct Inner<V> {
    entries: HashMap<String, (Instant, V)>,
    /// Insertion order; may hold stale keys that were overwritten or expired.
    order: VecDeque<(String, Instant)>,
}

#[derive(Debug)]
pub struct TtlCache<V> {
    ttl: Duration,
    capacity: usize,
    inner: Mutex<Inner<V>>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            ttl,
            capacity: capacity.max(1),
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                order: VecDeque::new(),
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner<V>> {
        match self.inner.lock() {
            Ok(g) => g,
            Err(poison) => poison.into_inner(),
        }
    }

    pub fn get(&self, key: &str) -> Option<V> {
        self.get_at(key, Instant::now())
    }

    pub fn insert(&self, key: impl Into<String>, value: V) {
        self.insert_at(key.into(), value, Instant::now())
    }

    pub(crate) fn get_at(&self, key: &str, now: Instant) -> Option<V> {
        let mut g = self.lock();
        let expired = match g.entries.get(key) {
            None => return None,
            Some((at, _)) => now.duration_since(*at) >= self.ttl,
        };
        if expired {
            g.entries.remove(key);
            return None;
        }
        g.entries.get(key).map(|(_, v)| v.clone())
    }

    pub(crate) fn insert_at(&self, key: String, value: V, now: Instant) {
        let mut g = self.lock();
        g.entries.insert(key.clone(), (now, value));
        g.order.push_back((key, now));

        while g.entries.len() > self.capacity {
            let Some((old_key, old_at)) = g.order.pop_front() else {
                break;
            };
            // Only evict if this queue slot still describes the live entry.
            if g.entries.get(&old_key).is_some_and(|(at, _)| *at == old_at) {
                g.entries.remove(&old_key);
            }
        }
        // Keep the order queue from growing without bound on repeated overwrites.
        if g.order.len() > self.capacity * 2 {
            let Inner { entries, order } = &mut *g;
            order.retain(|(k, at)| entries.get(k).is_some_and(|(live, _)| live == at));
        }
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut g = self.lock();
        g.entries.clear();
        g.order.clear();
    }
}
