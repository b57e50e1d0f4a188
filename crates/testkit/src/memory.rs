use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use headsmith_assets::{AssetSource, FetchError};
use tracing::trace;

/// In-memory [`AssetSource`] that records every request.
///
/// Keys are used verbatim, so absolute URLs can be served next to relative
/// paths.
#[derive(Default)]
pub struct MemorySource {
    files: HashMap<String, Vec<u8>>,
    requests: Mutex<Vec<String>>,
}

impl MemorySource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`MemorySource::insert`].
    pub fn with_file(mut self, path: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        self.insert(path, contents);
        self
    }

    /// Add or replace a file.
    pub fn insert(&mut self, path: impl Into<String>, contents: impl Into<Vec<u8>>) {
        self.files.insert(path.into(), contents.into());
    }

    /// Every path requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    /// How many times `path` was requested.
    pub fn request_count(&self, path: &str) -> usize {
        self.requests().iter().filter(|p| *p == path).count()
    }
}

#[async_trait]
impl AssetSource for MemorySource {
    async fn fetch_bytes(&self, path: &str) -> Result<Vec<u8>, FetchError> {
        trace!(path, "memory fetch");
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(path.to_string());
        }
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| FetchError::NotFound {
                path: path.to_string(),
            })
    }
}
