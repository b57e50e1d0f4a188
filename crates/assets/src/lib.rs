#![warn(missing_docs)]
//! Catalog asset sources, manifest handling and loading.

mod loader;
mod manifest;
mod source;
mod texture_index;

pub use loader::{
    find_yaml_line, parse_head_file, CatalogLoader, FileFailure, LoadProgress, LoadReport,
    HEAD_COUNT_PATH, MANIFEST_PATH,
};
pub use manifest::{file_tag, HeadCounts, PluginConfig, DEFAULT_HEAD_FILE, DEFAULT_TOTAL_HEADS};
pub use source::{is_remote, AssetSource, DirSource, FetchError, HttpSource, RoutedSource};
pub use texture_index::{
    OctagonEntry, TextureIndex, TextureIndexError, TextureIndexLocations, MC_ASSETS_BASE,
    OCTAGON_BASE, WIKI_FILE_BASE,
};

use thiserror::Error;

/// Errors that stop a catalog load.
#[derive(Debug, Error)]
pub enum AssetError {
    /// The manifest could not be fetched.
    #[error("failed to fetch manifest: {0}")]
    Manifest(#[source] FetchError),
    /// A YAML document could not be parsed.
    #[error("failed to parse {path}: {source}")]
    Yaml {
        /// Document location.
        path: String,
        /// Parser error.
        #[source]
        source: serde_yaml::Error,
    },
}
