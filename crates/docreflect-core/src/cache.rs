//! Memoized resolution results.
//!
//! Resolution is a pure function of an immutable registry, so entries never
//! go stale for the provider that owns the cache. Two threads may compute
//! the same entry at once; both produce the same value and the last write
//! wins. The lock is held only for the map operation, never across a
//! resolution.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::inheritance::InheritedDoc;
use crate::name::SymbolKey;

/// Cache key: normalized symbol name and normalized owning class.
pub type CacheKey = (SymbolKey, Option<SymbolKey>);

/// Thread-safe map from `(name, owning class?)` to a resolved doc comment.
#[derive(Debug, Default)]
pub struct ResolutionCache {
    entries: RwLock<HashMap<CacheKey, Arc<InheritedDoc>>>,
}

impl ResolutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the key for a symbol.
    pub fn key(name: &str, owning_class: Option<&str>) -> CacheKey {
        (SymbolKey::new(name), owning_class.map(SymbolKey::new))
    }

    pub fn get(&self, key: &CacheKey) -> Option<Arc<InheritedDoc>> {
        self.entries.read().get(key).cloned()
    }

    /// Store an entry, replacing any previous value.
    pub fn insert(&self, key: CacheKey, value: Arc<InheritedDoc>) {
        self.entries.write().insert(key, value);
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries.write().clear();
    }
}
