//! Session result cache.
//!
//! Images and canvases live in separate stores, keyed by URL and by canvas
//! identity. Entries are never evicted.

use crate::models::{CacheEntry, CanvasId, TargetKey};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::hash::Hash;

/// Key/value store for cache entries. Implementations use interior locking.
pub trait CacheStore<K>: Send + Sync {
    /// Entry for `key`
    fn get(&self, key: &K) -> Option<CacheEntry>;

    /// Insert or replace the entry for `key`
    fn set(&self, key: K, entry: CacheEntry);

    /// Whether an entry exists
    fn has(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Number of entries
    fn len(&self) -> usize;

    /// True when no entries exist
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory store
#[derive(Debug)]
pub struct MemoryStore<K> {
    entries: Mutex<HashMap<K, CacheEntry>>,
}

impl<K> Default for MemoryStore<K> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl<K> MemoryStore<K> {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

impl<K> CacheStore<K> for MemoryStore<K>
where
    K: Eq + Hash + Send,
{
    fn get(&self, key: &K) -> Option<CacheEntry> {
        self.entries.lock().get(key).cloned()
    }

    fn set(&self, key: K, entry: CacheEntry) {
        self.entries.lock().insert(key, entry);
    }

    fn has(&self, key: &K) -> bool {
        self.entries.lock().contains_key(key)
    }

    fn len(&self) -> usize {
        self.entries.lock().len()
    }
}

/// URL-keyed and identity-keyed stores behind one [`TargetKey`] interface
pub struct ResultCache {
    images: Box<dyn CacheStore<String>>,
    canvases: Box<dyn CacheStore<CanvasId>>,
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(
            Box::new(MemoryStore::new()),
            Box::new(MemoryStore::new()),
        )
    }
}

impl ResultCache {
    /// Build a cache over the given stores
    pub fn new(
        images: Box<dyn CacheStore<String>>,
        canvases: Box<dyn CacheStore<CanvasId>>,
    ) -> Self {
        Self { images, canvases }
    }

    /// Entry for `key`
    pub fn get(&self, key: &TargetKey) -> Option<CacheEntry> {
        match key {
            TargetKey::Url(url) => self.images.get(url),
            TargetKey::Canvas(id) => self.canvases.get(id),
        }
    }

    /// Insert or replace the entry for `key`
    pub fn set(&self, key: &TargetKey, entry: CacheEntry) {
        match key {
            TargetKey::Url(url) => self.images.set(url.clone(), entry),
            TargetKey::Canvas(id) => self.canvases.set(*id, entry),
        }
    }

    /// Whether `key` has any entry
    pub fn has(&self, key: &TargetKey) -> bool {
        match key {
            TargetKey::Url(url) => self.images.has(url),
            TargetKey::Canvas(id) => self.canvases.has(id),
        }
    }

    /// Entries across both stores
    pub fn len(&self) -> usize {
        self.images.len() + self.canvases.len()
    }

    /// True when both stores are empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
