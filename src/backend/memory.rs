use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};

use super::Backend;
use crate::error::{Result, StashError};

#[derive(Debug, Default)]
struct MemoryInner {
    data: HashMap<String, String>,
    /// Current total size of stored data in bytes (keys + values)
    current_size: usize,
    /// Maximum size in bytes (0 = unlimited)
    max_bytes: usize,
}

/// An in-memory key/text map standing in for local or session storage.
///
/// Clones share the same map, so a test can keep a handle to inspect or
/// seed what the stash reads.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    inner: Arc<RwLock<MemoryInner>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a map that rejects writes once keys and values together
    /// would exceed `max_bytes`, the way browsers enforce storage quotas.
    pub fn with_quota(max_bytes: usize) -> Self {
        let storage = Self::default();
        storage.write().max_bytes = max_bytes;
        storage
    }

    pub fn len(&self) -> usize {
        self.read().data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().data.is_empty()
    }

    /// Returns the stored keys in no particular order
    pub fn keys(&self) -> Vec<String> {
        self.read().data.keys().cloned().collect()
    }

    /// Current storage usage in bytes
    pub fn size(&self) -> usize {
        self.read().current_size
    }

    fn entry_size(key: &str, value: &str) -> usize {
        key.len() + value.len()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, MemoryInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, MemoryInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Backend for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.read().data.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str, _expires: Option<DateTime<Utc>>) -> Result<()> {
        let mut inner = self.write();
        let old_size = inner
            .data
            .get(key)
            .map(|old| Self::entry_size(key, old))
            .unwrap_or(0);
        let new_total = inner.current_size - old_size + Self::entry_size(key, value);

        if inner.max_bytes > 0 && new_total > inner.max_bytes {
            return Err(StashError::Backend(format!(
                "quota exceeded: {} bytes used of {} bytes maximum",
                inner.current_size, inner.max_bytes
            )));
        }

        inner.data.insert(key.to_string(), value.to_string());
        inner.current_size = new_total;
        Ok(())
    }

    fn remove(&self, key: &str) {
        let mut inner = self.write();
        if let Some(old) = inner.data.remove(key) {
            inner.current_size -= Self::entry_size(key, &old);
        }
    }

    fn clear(&self) {
        let mut inner = self.write();
        inner.data.clear();
        inner.current_size = 0;
    }
}
