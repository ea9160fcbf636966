//! Storage implementations for bucket state.
//!
//! Provides concurrent, sharded storage with optional bounded capacity.

use crate::application::metrics::Metrics;
use crate::application::ports::{EvictionCandidate, EvictionPolicy, Storage};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug)]
struct Slot<V> {
    value: V,
    last_access: u64,
}

/// Thread-safe sharded storage backed by DashMap.
///
/// DashMap provides lock-free reads and fine-grained locking for writes.
/// Holding an entry through [`Storage::with_entry_mut`] locks only the shard
/// that key lives in.
///
/// When an eviction policy is attached, inserting a new key first evicts
/// entries until the policy is satisfied.
pub struct ShardedStorage<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    map: DashMap<K, Slot<V>>,
    access_seq: AtomicU64,
    eviction_policy: Option<Arc<dyn EvictionPolicy<K, V>>>,
    metrics: Option<Metrics>,
}

impl<K, V> ShardedStorage<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Create a new unbounded sharded storage instance.
    pub fn new() -> Self {
        Self {
            map: DashMap::new(),
            access_seq: AtomicU64::new(0),
            eviction_policy: None,
            metrics: None,
        }
    }

    /// Attach an eviction policy bounding the storage.
    pub fn with_eviction_policy(mut self, policy: Arc<dyn EvictionPolicy<K, V>>) -> Self {
        self.eviction_policy = Some(policy);
        self
    }

    /// Record evictions into the given metrics.
    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Check if a key exists.
    pub fn contains_key(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    /// Remove a key and return its value.
    pub fn remove(&self, key: &K) -> Option<V> {
        self.map.remove(key).map(|(_, slot)| slot.value)
    }

    fn next_access(&self) -> u64 {
        self.access_seq.fetch_add(1, Ordering::Relaxed)
    }
}

impl<K, V> ShardedStorage<K, V>
where
    K: Eq + Hash + Clone + Debug,
    V: Clone,
{
    /// Evict entries until the policy allows one more insertion.
    ///
    /// Every entry is offered to the policy, so the victim is chosen from the
    /// whole table. Must not be called while holding a guard into `map`.
    fn make_room(&self) {
        let Some(policy) = &self.eviction_policy else {
            return;
        };

        while policy.should_evict(self.map.len()) {
            let candidates: Vec<EvictionCandidate<K, V>> = self
                .map
                .iter()
                .map(|entry| EvictionCandidate {
                    key: entry.key().clone(),
                    value: entry.value().value.clone(),
                    last_access: entry.value().last_access,
                })
                .collect();

            let Some(victim) = policy.select_victim(&candidates) else {
                break;
            };

            // Lost a race with another remover, which already made room.
            if self.map.remove(&victim).is_none() {
                break;
            }

            tracing::debug!(key = ?victim, "evicted least recently used bucket");
            if let Some(metrics) = &self.metrics {
                metrics.record_eviction();
            }
        }
    }
}

impl<K, V> Default for ShardedStorage<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Debug for ShardedStorage<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShardedStorage")
            .field("len", &self.map.len())
            .field("bounded", &self.eviction_policy.is_some())
            .finish()
    }
}

// Implement the Storage port
impl<K, V> Storage<K, V> for ShardedStorage<K, V>
where
    K: Hash + Eq + Clone + Send + Sync + Debug,
    V: Clone + Send + Sync + Debug,
{
    fn with_entry_mut<F, R>(&self, key: K, factory: impl FnOnce() -> V, accessor: F) -> R
    where
        F: FnOnce(&mut V, bool) -> R,
    {
        let access = self.next_access();

        if let Some(mut slot) = self.map.get_mut(&key) {
            slot.last_access = access;
            return accessor(&mut slot.value, false);
        }

        self.make_room();

        match self.map.entry(key) {
            Entry::Occupied(mut occupied) => {
                let slot = occupied.get_mut();
                slot.last_access = access;
                accessor(&mut slot.value, false)
            }
            Entry::Vacant(vacant) => {
                let mut slot = vacant.insert(Slot {
                    value: factory(),
                    last_access: access,
                });
                accessor(&mut slot.value, true)
            }
        }
    }

    fn read<F, R>(&self, key: &K, reader: F) -> Option<R>
    where
        F: FnOnce(&V) -> R,
    {
        self.map.get(key).map(|slot| reader(&slot.value))
    }

    fn len(&self) -> usize {
        self.map.len()
    }

    fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    fn clear(&self) {
        self.map.clear()
    }

    fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&K, &V),
    {
        for entry in self.map.iter() {
            f(entry.key(), &entry.value().value);
        }
    }

    fn retain<F>(&self, mut f: F)
    where
        F: FnMut(&K, &mut V) -> bool,
    {
        self.map.retain(|key, slot| f(key, &mut slot.value));
    }
}

// Implement Storage for Arc<ShardedStorage> to allow it to be used directly
impl<K, V> Storage<K, V> for Arc<ShardedStorage<K, V>>
where
    K: Hash + Eq + Clone + Send + Sync + Debug,
    V: Clone + Send + Sync + Debug,
{
    fn with_entry_mut<F, R>(&self, key: K, factory: impl FnOnce() -> V, accessor: F) -> R
    where
        F: FnOnce(&mut V, bool) -> R,
    {
        (**self).with_entry_mut(key, factory, accessor)
    }

    fn read<F, R>(&self, key: &K, reader: F) -> Option<R>
    where
        F: FnOnce(&V) -> R,
    {
        (**self).read(key, reader)
    }

    fn len(&self) -> usize {
        (**self).len()
    }

    fn is_empty(&self) -> bool {
        (**self).is_empty()
    }

    fn clear(&self) {
        (**self).clear()
    }

    fn for_each<F>(&self, f: F)
    where
        F: FnMut(&K, &V),
    {
        (**self).for_each(f)
    }

    fn retain<F>(&self, f: F)
    where
        F: FnMut(&K, &mut V) -> bool,
    {
        (**self).retain(f)
    }
}
