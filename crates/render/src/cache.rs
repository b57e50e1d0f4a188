use std::fs;
use std::io;
use std::num::NonZeroUsize;
use std::path::Path;

use lru::LruCache;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Default number of rendered heads kept in memory.
pub const DEFAULT_CACHE_CAPACITY: usize = 2048;

/// Errors persisting the texture cache.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Filesystem failure.
    #[error("texture cache I/O: {0}")]
    Io(#[from] io::Error),
    /// Serialization failure.
    #[error("texture cache format: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Serialize, Deserialize)]
struct CacheEntry {
    key: String,
    data_url: String,
}

/// Rendered head images keyed by [`headsmith_core::cache_key`], bounded by LRU eviction.
pub struct TextureCache {
    entries: LruCache<String, String>,
}

impl Default for TextureCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

impl TextureCache {
    /// Create an empty cache holding at most `capacity` images (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(cap),
        }
    }

    /// Look up an image, marking it most recently used.
    pub fn get(&mut self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Returns true when `key` is cached, without touching recency.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains(key)
    }

    /// Store an image, evicting the least recently used entry when full.
    pub fn insert(&mut self, key: impl Into<String>, data_url: impl Into<String>) {
        if let Some((evicted, _)) = self.entries.push(key.into(), data_url.into()) {
            debug!(key = %evicted, "evicted cached head image");
        }
    }

    /// Number of cached images.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of images.
    pub fn capacity(&self) -> usize {
        self.entries.cap().get()
    }

    /// Load a persisted cache; a missing or unreadable file yields an empty cache.
    ///
    /// Entries beyond `capacity` are dropped oldest first.
    pub fn load(path: &Path, capacity: usize) -> Self {
        let mut cache = Self::new(capacity);
        let data = match fs::read_to_string(path) {
            Ok(data) => data,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return cache,
            Err(err) => {
                warn!(path = %path.display(), %err, "could not read texture cache");
                return cache;
            }
        };
        match serde_json::from_str::<Vec<CacheEntry>>(&data) {
            Ok(entries) => {
                for entry in entries {
                    cache.insert(entry.key, entry.data_url);
                }
                debug!(path = %path.display(), entries = cache.len(), "texture cache loaded");
            }
            Err(err) => warn!(path = %path.display(), %err, "discarding corrupt texture cache"),
        }
        cache
    }

    /// Persist entries oldest first so reloading preserves recency.
    pub fn save(&self, path: &Path) -> Result<(), CacheError> {
        let entries: Vec<CacheEntry> = self
            .entries
            .iter()
            .rev()
            .map(|(key, data_url)| CacheEntry {
                key: key.clone(),
                data_url: data_url.clone(),
            })
            .collect();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string(&entries)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_least_recently_used() {
        let mut cache = TextureCache::new(2);
        cache.insert("a", "data:a");
        cache.insert("b", "data:b");
        assert_eq!(cache.get("a"), Some("data:a"));
        cache.insert("c", "data:c");
        assert!(cache.contains("a"));
        assert!(!cache.contains("b"));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn zero_capacity_is_clamped() {
        assert_eq!(TextureCache::new(0).capacity(), 1);
    }

    #[test]
    fn persists_with_recency() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("cache.json");
        let mut cache = TextureCache::new(3);
        cache.insert("a", "data:a");
        cache.insert("b", "data:b");
        cache.insert("c", "data:c");
        cache.get("a");
        cache.save(&path).unwrap();

        // Reload into a smaller cache: the least recent entry ("b") goes first.
        let mut reloaded = TextureCache::load(&path, 2);
        assert_eq!(reloaded.len(), 2);
        assert!(!reloaded.contains("b"));
        assert_eq!(reloaded.get("a"), Some("data:a"));
    }

    #[test]
    fn corrupt_or_missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(TextureCache::load(&dir.path().join("none.json"), 4).is_empty());
        let path = dir.path().join("bad.json");
        fs::write(&path, "{not json").unwrap();
        assert!(TextureCache::load(&path, 4).is_empty());
    }
}
