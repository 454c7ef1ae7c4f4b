// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-wide, keyed cache of long-lived managers.
//!
//! `PersistentManagerPool` and `KernelManagerPool` are both instances of
//! this generic pool: insertion and eviction are serialised by a per-pool
//! mutex; lookup of an already-present entry only needs the same mutex
//! briefly to clone the `Arc`, so contention is limited to pool mutation.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

pub struct KeyedPool<K, V> {
    entries: Mutex<HashMap<K, Arc<V>>>,
}

impl<K, V> Default for KeyedPool<K, V> {
    fn default() -> Self {
        Self { entries: Mutex::new(HashMap::new()) }
    }
}

impl<K, V> KeyedPool<K, V>
where
    K: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the existing entry for `key`, or construct and insert one.
    /// `ctor` only runs when no entry exists yet.
    pub fn get_or_insert_with(&self, key: K, ctor: impl FnOnce() -> V) -> Arc<V> {
        let mut entries = self.entries.lock();
        entries
            .entry(key)
            .or_insert_with(|| Arc::new(ctor()))
            .clone()
    }

    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        self.entries.lock().get(key).cloned()
    }

    /// Remove an entry, e.g. after its manager is discovered dead.
    pub fn evict(&self, key: &K) -> Option<Arc<V>> {
        self.entries.lock().remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.lock().contains_key(key)
    }

    /// Reverse lookup: the first entry whose value matches `predicate`, for
    /// addressing a pooled manager by something other than its pool key
    /// (e.g. a kernel's connection-file path).
    pub fn find(&self, mut predicate: impl FnMut(&V) -> bool) -> Option<Arc<V>> {
        self.entries.lock().values().find(|entry| predicate(entry)).cloned()
    }
}

#[cfg(test)]
#[path = "pool_tests.rs"]
mod tests;
