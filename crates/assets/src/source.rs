//! Where catalog assets come from: a local resources directory or an HTTP base URL.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

/// Failure fetching a single asset.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The asset does not exist.
    #[error("{path}: not found")]
    NotFound {
        /// Requested path or URL.
        path: String,
    },
    /// The server answered with a non-success status.
    #[error("{path}: HTTP status {status}")]
    Status {
        /// Requested URL.
        path: String,
        /// Response status code.
        status: u16,
    },
    /// Local filesystem failure.
    #[error("{path}: {source}")]
    Io {
        /// Requested path.
        path: String,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// Transport failure.
    #[error("{path}: {source}")]
    Http {
        /// Requested URL.
        path: String,
        /// Underlying error.
        #[source]
        source: reqwest::Error,
    },
    /// The source cannot serve this kind of location.
    #[error("{path}: unsupported location for {source_name}")]
    Unsupported {
        /// Requested location.
        path: String,
        /// Source description.
        source_name: &'static str,
    },
    /// Text asset is not valid UTF-8.
    #[error("{path}: not valid UTF-8")]
    Utf8 {
        /// Requested path.
        path: String,
    },
}

/// Returns true for absolute `http(s)` URLs.
pub fn is_remote(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

/// A read-only asset store addressed by relative path or absolute URL.
#[async_trait]
pub trait AssetSource: Send + Sync {
    /// Fetch raw bytes.
    async fn fetch_bytes(&self, path: &str) -> Result<Vec<u8>, FetchError>;

    /// Fetch a UTF-8 text asset.
    async fn fetch_text(&self, path: &str) -> Result<String, FetchError> {
        let bytes = self.fetch_bytes(path).await?;
        String::from_utf8(bytes).map_err(|_| FetchError::Utf8 {
            path: path.to_string(),
        })
    }
}

/// Serves relative paths from a directory on disk.
#[derive(Debug, Clone)]
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    /// Serve files below `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory being served.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl AssetSource for DirSource {
    async fn fetch_bytes(&self, path: &str) -> Result<Vec<u8>, FetchError> {
        if is_remote(path) {
            return Err(FetchError::Unsupported {
                path: path.to_string(),
                source_name: "directory source",
            });
        }
        let full = self.root.join(path.trim_start_matches('/'));
        debug!(path = %full.display(), "reading asset");
        tokio::fs::read(&full).await.map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                FetchError::NotFound {
                    path: path.to_string(),
                }
            } else {
                FetchError::Io {
                    path: path.to_string(),
                    source,
                }
            }
        })
    }
}

/// Fetches over HTTP, resolving relative paths against an optional base URL.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
    base: Option<String>,
}

impl HttpSource {
    /// Default request timeout.
    pub const TIMEOUT: Duration = Duration::from_secs(30);

    /// Create a source; `base` is used for relative paths.
    pub fn new(base: Option<String>) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Self::TIMEOUT)
            .user_agent(concat!("headsmith/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base: base.map(|b| b.trim_end_matches('/').to_string()),
        })
    }

    /// Resolve `path` to the URL that will be requested.
    pub fn resolve(&self, path: &str) -> Option<String> {
        if is_remote(path) {
            return Some(path.to_string());
        }
        self.base
            .as_ref()
            .map(|base| format!("{base}/{}", path.trim_start_matches('/')))
    }
}

#[async_trait]
impl AssetSource for HttpSource {
    async fn fetch_bytes(&self, path: &str) -> Result<Vec<u8>, FetchError> {
        let url = self.resolve(path).ok_or_else(|| FetchError::Unsupported {
            path: path.to_string(),
            source_name: "HTTP source without base URL",
        })?;
        debug!(%url, "fetching asset");
        let http = |source| FetchError::Http {
            path: url.clone(),
            source,
        };
        let response = self.client.get(&url).send().await.map_err(http)?;
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound { path: url.clone() });
        }
        if !status.is_success() {
            return Err(FetchError::Status {
                path: url.clone(),
                status: status.as_u16(),
            });
        }
        let bytes = response.bytes().await.map_err(http)?;
        Ok(bytes.to_vec())
    }
}

/// Sends absolute URLs to `remote` and everything else to `local`.
pub struct RoutedSource<L, R> {
    local: L,
    remote: R,
}

impl<L: AssetSource, R: AssetSource> RoutedSource<L, R> {
    /// Combine a local and a remote source.
    pub fn new(local: L, remote: R) -> Self {
        Self { local, remote }
    }
}

#[async_trait]
impl<L: AssetSource, R: AssetSource> AssetSource for RoutedSource<L, R> {
    async fn fetch_bytes(&self, path: &str) -> Result<Vec<u8>, FetchError> {
        if is_remote(path) {
            self.remote.fetch_bytes(path).await
        } else {
            self.local.fetch_bytes(path).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_source_resolves_against_base() {
        let source = HttpSource::new(Some("https://example.org/res/".into())).unwrap();
        assert_eq!(
            source.resolve("heads/food.yml").as_deref(),
            Some("https://example.org/res/heads/food.yml")
        );
        assert_eq!(
            source.resolve("https://other.net/x.json").as_deref(),
            Some("https://other.net/x.json")
        );
        let bare = HttpSource::new(None).unwrap();
        assert!(bare.resolve("config.yml").is_none());
    }

    #[tokio::test]
    async fn dir_source_reads_and_reports_missing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.yml"), "head-files: []\n").unwrap();
        let source = DirSource::new(dir.path());

        let text = source.fetch_text("config.yml").await.unwrap();
        assert!(text.starts_with("head-files"));
        assert!(matches!(
            source.fetch_text("missing.yml").await,
            Err(FetchError::NotFound { .. })
        ));
        assert!(matches!(
            source.fetch_bytes("https://example.org/a").await,
            Err(FetchError::Unsupported { .. })
        ));
    }
}
