//! Bounded in-memory cache with least-recently-used eviction and an optional
//! time-to-live.

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;
use std::time::{Duration, Instant};

struct Slot<V> {
    value: V,
    stamp: u64,
    inserted: Instant,
}

pub struct BoundedCache<K, V> {
    capacity: usize,
    ttl: Option<Duration>,
    entries: HashMap<K, Slot<V>>,
    /// Use stamp -> key, oldest first
    recency: BTreeMap<u64, K>,
    tick: u64,
}

impl<K: Hash + Eq + Clone, V: Clone> BoundedCache<K, V> {
    /// A capacity of zero is treated as one.
    pub fn new(capacity: usize, ttl: Option<Duration>) -> Self {
        Self {
            capacity: capacity.max(1),
            ttl,
            entries: HashMap::new(),
            recency: BTreeMap::new(),
            tick: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn next_stamp(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    fn expired(&self, slot: &Slot<V>) -> bool {
        self.ttl.is_some_and(|ttl| slot.inserted.elapsed() >= ttl)
    }

    /// Look up a value, marking it as most recently used.
    pub fn get(&mut self, key: &K) -> Option<V> {
        let expired = self.expired(self.entries.get(key)?);
        if expired {
            self.remove(key);
            return None;
        }

        let stamp = self.next_stamp();
        let slot = self.entries.get_mut(key)?;
        self.recency.remove(&slot.stamp);
        slot.stamp = stamp;
        self.recency.insert(stamp, key.clone());
        Some(slot.value.clone())
    }

    /// Insert or replace a value, evicting the least recently used entry
    /// when over capacity.
    pub fn insert(&mut self, key: K, value: V) {
        let stamp = self.next_stamp();
        let slot = Slot {
            value,
            stamp,
            inserted: Instant::now(),
        };
        if let Some(old) = self.entries.insert(key.clone(), slot) {
            self.recency.remove(&old.stamp);
        }
        self.recency.insert(stamp, key);

        while self.entries.len() > self.capacity {
            let Some((_, oldest)) = self.recency.pop_first() else {
                break;
            };
            self.entries.remove(&oldest);
        }
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        let slot = self.entries.remove(key)?;
        self.recency.remove(&slot.stamp);
        Some(slot.value)
    }
}
