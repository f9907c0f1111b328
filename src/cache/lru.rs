// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Capacity-bounded LRU memo cache with hit/miss accounting.
//!
//! Recency is tracked with a monotonic tick per entry rather than an
//! intrusive list: lookups bump the tick, eviction scans for the minimum.
//! Eviction is O(n) in the entry count, which is the right trade for a
//! memo cache whose capacity is small and whose lookups dominate.

use std::any::TypeId;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::sweep::{self, Invalidate};

/// Cache construction policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheOptions {
    /// Entry bound; least-recently-used entries are evicted past it.
    /// `None` disables the bound entirely.
    pub max_size: Option<usize>,
    /// Fold the key's `TypeId` into the stored key so values that compare
    /// equal but carry different types occupy distinct entries. With a
    /// monomorphic key type this is a no-op; it matters when a type-erasing
    /// key encoding shares one cache.
    pub typed: bool,
    /// Subscribe to the global sweep registry so the cache is emptied at
    /// every epoch boundary.
    pub clear_on_sweep: bool,
}

impl Default for CacheOptions {
    fn default() -> Self {
        CacheOptions {
            max_size: Some(128),
            typed: false,
            clear_on_sweep: true,
        }
    }
}

/// Snapshot of cache effectiveness, shaped like the classic
/// `(hits, misses, maxsize, currsize)` tuple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub max_size: Option<usize>,
    pub len: usize,
}

#[derive(Clone, PartialEq, Eq, Hash)]
struct StoredKey<K> {
    key: K,
    /// `Some` only under the `typed` policy.
    type_id: Option<TypeId>,
}

struct Slot<V> {
    value: V,
    last_used: u64,
}

struct CacheInner<K, V> {
    map: HashMap<StoredKey<K>, Slot<V>>,
    tick: u64,
    hits: u64,
    misses: u64,
}

/// Bounded, optionally type-sensitive memoization cache.
///
/// The interior lock is never held while user code runs: `get_or_compute`
/// releases it around the compute closure, so a wrapped function that
/// recursively re-enters the cache cannot deadlock. The price is that two
/// threads missing on the same key may both compute; for a pure function
/// the duplicate work is wasted but harmless, and the second insert simply
/// overwrites an equal value.
pub struct MemoCache<K, V> {
    inner: Mutex<CacheInner<K, V>>,
    max_size: Option<usize>,
    typed: bool,
}

impl<K, V> MemoCache<K, V>
where
    K: Eq + Hash + Clone + Send + 'static,
    V: Clone + Send + 'static,
{
    pub fn new(options: &CacheOptions) -> Self {
        MemoCache {
            inner: Mutex::new(CacheInner {
                map: HashMap::new(),
                tick: 0,
                hits: 0,
                misses: 0,
            }),
            max_size: options.max_size,
            typed: options.typed,
        }
    }

    /// Construct behind an `Arc` and register with the global sweep
    /// registry unless the options opt out.
    pub fn shared(options: &CacheOptions) -> Arc<Self> {
        let cache = Arc::new(Self::new(options));
        if options.clear_on_sweep {
            sweep::global().register(Arc::downgrade(&cache) as Weak<dyn Invalidate>);
        }
        cache
    }

    fn stored_key(&self, key: K) -> StoredKey<K> {
        StoredKey {
            key,
            type_id: self.typed.then(TypeId::of::<K>),
        }
    }

    /// Look up `key`, counting a hit or miss and refreshing recency.
    pub fn get(&self, key: &K) -> Option<V> {
        let stored = self.stored_key(key.clone());
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        inner.tick += 1;
        match inner.map.get_mut(&stored) {
            Some(slot) => {
                slot.last_used = inner.tick;
                inner.hits += 1;
                Some(slot.value.clone())
            }
            None => {
                inner.misses += 1;
                None
            }
        }
    }

    /// Look up `key` without touching statistics or recency.
    ///
    /// Verification paths use this so that comparing a fresh execution
    /// against the memoized value does not distort the hit/miss accounting
    /// the caller is observing.
    pub fn peek(&self, key: &K) -> Option<V> {
        let stored = self.stored_key(key.clone());
        self.inner
            .lock()
            .map
            .get(&stored)
            .map(|slot| slot.value.clone())
    }

    /// Insert `value` under `key`, evicting the least-recently-used entry
    /// if that pushes the cache past its bound.
    pub fn insert(&self, key: K, value: V) {
        let stored = self.stored_key(key);
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        inner.tick += 1;
        inner.map.insert(
            stored,
            Slot {
                value,
                last_used: inner.tick,
            },
        );
        if let Some(max) = self.max_size {
            while inner.map.len() > max {
                let oldest = inner
                    .map
                    .iter()
                    .min_by_key(|(_, slot)| slot.last_used)
                    .map(|(k, _)| k.clone());
                match oldest {
                    Some(k) => {
                        inner.map.remove(&k);
                    }
                    None => break,
                }
            }
        }
    }

    /// Return the cached value for `key`, computing and storing it on miss.
    pub fn get_or_compute(&self, key: K, compute: impl FnOnce() -> V) -> V {
        if let Some(value) = self.get(&key) {
            return value;
        }
        // Lock released; compute may recurse into this cache.
        let value = compute();
        self.insert(key, value.clone());
        value
    }

    /// Drop every entry and reset the hit/miss counters.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.map.clear();
        inner.hits = 0;
        inner.misses = 0;
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        CacheStats {
            hits: inner.hits,
            misses: inner.misses,
            max_size: self.max_size,
            len: inner.map.len(),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K, V> Invalidate for MemoCache<K, V>
where
    K: Eq + Hash + Clone + Send + 'static,
    V: Clone + Send + 'static,
{
    fn invalidate(&self) {
        self.clear();
    }
}
