use anyhow::{Context, Result};
use headsmith_assets::{
    is_remote, AssetSource, DirSource, HttpSource, RoutedSource, TextureIndexLocations,
    HEAD_COUNT_PATH, MANIFEST_PATH,
};
use headsmith_render::{CORS_PROXY, DEFAULT_CACHE_CAPACITY, DEFAULT_RENDER_SIZE};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};
use tracing::warn;

pub const DEFAULT_CONFIG_PATH: &str = "catalog.toml";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Plugin resources root (directory or http(s) URL) holding `config.yml`.
    pub resources: String,
    /// Plugin manifest listing the head files, relative to the resources root.
    pub manifest: String,
    /// `head-count.json` location; empty disables progress estimates.
    pub head_counts: String,
    pub textures: TextureConfig,
    pub cache: CacheConfig,
    pub render: RenderConfig,
    pub browse: BrowseConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TextureConfig {
    /// When false, material icons render as text and no index is fetched.
    pub enabled: bool,
    pub octagon: String,
    pub items: String,
    pub blocks: String,
    pub lang: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    pub path: PathBuf,
    pub capacity: usize,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Relay prefix for skin downloads; empty fetches directly.
    pub proxy: String,
    pub size: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct BrowseConfig {
    pub debounce_ms: u64,
    /// Heads shown per page; each page counts as "visible" for texture loading.
    pub page_size: usize,
    pub load_textures: bool,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            resources: "resources".to_string(),
            manifest: MANIFEST_PATH.to_string(),
            head_counts: HEAD_COUNT_PATH.to_string(),
            textures: TextureConfig::default(),
            cache: CacheConfig::default(),
            render: RenderConfig::default(),
            browse: BrowseConfig::default(),
        }
    }
}

impl Default for TextureConfig {
    fn default() -> Self {
        let locations = TextureIndexLocations::default();
        Self {
            enabled: true,
            octagon: locations.octagon,
            items: locations.items,
            blocks: locations.blocks,
            lang: locations.lang,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(".headsmith/texture-cache.json"),
            capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            proxy: CORS_PROXY.to_string(),
            size: DEFAULT_RENDER_SIZE,
        }
    }
}

impl Default for BrowseConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 200,
            page_size: 24,
            load_textures: true,
        }
    }
}

impl CatalogConfig {
    /// Load configuration from an explicit path, falling back to defaults on errors.
    pub fn load_from_path(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<CatalogConfig>(&contents) {
                Ok(cfg) => cfg,
                Err(err) => {
                    warn!("Failed to parse {}: {err}. Using defaults", path.display());
                    CatalogConfig::default()
                }
            },
            Err(err) => {
                if path != Path::new(DEFAULT_CONFIG_PATH)
                    || err.kind() != std::io::ErrorKind::NotFound
                {
                    warn!("Failed to read {}: {err}. Using defaults", path.display());
                }
                CatalogConfig::default()
            }
        }
    }

    /// Write the configuration as TOML, creating parent directories.
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        let toml = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml).with_context(|| format!("write {}", path.display()))?;
        Ok(())
    }

    pub fn head_counts_path(&self) -> Option<String> {
        Some(self.head_counts.clone()).filter(|p| !p.is_empty())
    }

    pub fn texture_locations(&self) -> TextureIndexLocations {
        TextureIndexLocations {
            octagon: self.textures.octagon.clone(),
            items: self.textures.items.clone(),
            blocks: self.textures.blocks.clone(),
            lang: self.textures.lang.clone(),
        }
    }

    pub fn proxy(&self) -> Option<String> {
        Some(self.render.proxy.clone()).filter(|p| !p.is_empty())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.browse.debounce_ms)
    }

    /// Asset source for the resources root; absolute URLs always go over HTTP.
    pub fn asset_source(&self) -> Result<Arc<dyn AssetSource>> {
        if is_remote(&self.resources) {
            let http = HttpSource::new(Some(self.resources.clone()))
                .context("failed to build HTTP client")?;
            return Ok(Arc::new(http));
        }
        let remote = HttpSource::new(None).context("failed to build HTTP client")?;
        Ok(Arc::new(RoutedSource::new(
            DirSource::new(&self.resources),
            remote,
        )))
    }
}
