//! Bounded memoization cache.
//!
//! Entries carry a monotonically increasing stamp; a `BTreeMap` from stamp to key gives the
//! eviction order. Under [`EvictionPolicy::Lru`] both writes and hits refresh the stamp, under
//! [`EvictionPolicy::Fifo`] only the first insertion does.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

/// Which entry goes first when the cache is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvictionPolicy {
    /// Least recently touched (written or hit).
    #[default]
    Lru,
    /// Oldest insertion.
    Fifo,
}

#[derive(Debug, Clone)]
struct Entry<V> {
    value: V,
    stamp: u64,
}

/// A capacity-bounded map with a pluggable eviction policy.
#[derive(Debug, Clone)]
pub struct BoundedCache<K, V> {
    capacity: usize,
    policy: EvictionPolicy,
    entries: HashMap<K, Entry<V>>,
    order: BTreeMap<u64, K>,
    next_stamp: u64,
    evictions: u64,
}

impl<K, V> BoundedCache<K, V>
where
    K: Hash + Eq + Clone,
{
    /// Create a cache holding at most `capacity` entries (minimum 1).
    pub fn new(capacity: usize, policy: EvictionPolicy) -> Self {
        Self {
            capacity: capacity.max(1),
            policy,
            entries: HashMap::new(),
            order: BTreeMap::new(),
            next_stamp: 0,
            evictions: 0,
        }
    }

    /// Maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Eviction policy.
    pub fn policy(&self) -> EvictionPolicy {
        self.policy
    }

    /// Current number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of evictions since creation.
    pub fn evictions(&self) -> u64 {
        self.evictions
    }

    /// Whether `key` is cached. Does not touch the entry.
    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Look up without touching the entry.
    pub fn peek(&self, key: &K) -> Option<&V> {
        self.entries.get(key).map(|entry| &entry.value)
    }

    /// Look up and touch the entry.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        if self.policy == EvictionPolicy::Lru && self.entries.contains_key(key) {
            let stamp = self.bump();
            let entry = self.entries.get_mut(key)?;
            self.order.remove(&entry.stamp);
            entry.stamp = stamp;
            self.order.insert(stamp, key.clone());
        }
        self.entries.get(key).map(|entry| &entry.value)
    }

    /// Insert or overwrite, returning the key evicted to make room, if any.
    pub fn insert(&mut self, key: K, value: V) -> Option<K> {
        if self.entries.contains_key(&key) {
            let stamp = (self.policy == EvictionPolicy::Lru).then(|| self.bump());
            if let Some(entry) = self.entries.get_mut(&key) {
                entry.value = value;
                if let Some(stamp) = stamp {
                    self.order.remove(&entry.stamp);
                    entry.stamp = stamp;
                    self.order.insert(stamp, key);
                }
            }
            return None;
        }

        let evicted = if self.entries.len() >= self.capacity {
            self.evict_one()
        } else {
            None
        };

        let stamp = self.bump();
        self.order.insert(stamp, key.clone());
        self.entries.insert(key, Entry { value, stamp });
        evicted
    }

    /// Remove an entry.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let entry = self.entries.remove(key)?;
        self.order.remove(&entry.stamp);
        Some(entry.value)
    }

    /// Keep only the entries for which `keep` returns `true`.
    pub fn retain(&mut self, mut keep: impl FnMut(&K, &V) -> bool) {
        let order = &mut self.order;
        self.entries.retain(|key, entry| {
            let kept = keep(key, &entry.value);
            if !kept {
                order.remove(&entry.stamp);
            }
            kept
        });
    }

    /// Drop everything.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    fn bump(&mut self) -> u64 {
        let stamp = self.next_stamp;
        self.next_stamp += 1;
        stamp
    }

    fn evict_one(&mut self) -> Option<K> {
        let (_, key) = self.order.pop_first()?;
        self.entries.remove(&key);
        self.evictions += 1;
        Some(key)
    }
}
