use std::sync::Arc;

use base64::Engine as _;
use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder, RgbaImage};
use tracing::{debug, warn};

use headsmith_assets::AssetSource;
use headsmith_core::{cache_key, SkinTexture};

use crate::isometric::clamp_size;
use crate::{render_isometric, RenderError, TextureCache, DEFAULT_RENDER_SIZE};

/// Public CORS relay the skin server is reached through.
pub const CORS_PROXY: &str = "https://corsproxy.io/?";

/// Encode an RGBA image as a `data:image/png;base64,` URL.
pub fn encode_data_url(image: &RgbaImage) -> Result<String, RenderError> {
    let mut png = Vec::new();
    PngEncoder::new(&mut png).write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        ColorType::Rgba8.into(),
    )?;
    Ok(format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(png)
    ))
}

/// Turns texture blobs into cached isometric head images.
pub struct HeadRenderer {
    source: Arc<dyn AssetSource>,
    proxy: Option<String>,
    size: u32,
    cache: TextureCache,
}

impl HeadRenderer {
    /// Renderer fetching skins from `source` through [`CORS_PROXY`].
    pub fn new(source: Arc<dyn AssetSource>, cache: TextureCache) -> Self {
        Self {
            source,
            proxy: Some(CORS_PROXY.to_string()),
            size: DEFAULT_RENDER_SIZE,
            cache,
        }
    }

    /// Replace the relay prefix; `None` fetches skins directly.
    pub fn with_proxy(mut self, proxy: Option<String>) -> Self {
        self.proxy = proxy.filter(|p| !p.is_empty());
        self
    }

    /// Change the render size, clamped to `1..=MAX_RENDER_SIZE`.
    pub fn with_size(mut self, size: u32) -> Self {
        self.size = clamp_size(size);
        if self.size != size {
            warn!(requested = size, size = self.size, "render size out of range, clamped");
        }
        self
    }

    /// Cache key for `blob` at this renderer's size.
    ///
    /// The default size uses the bare blob suffix; other sizes are prefixed
    /// with `<size>@` so entries of different sizes never collide.
    pub fn render_key(&self, blob: &str) -> String {
        let key = cache_key(blob);
        if self.size == DEFAULT_RENDER_SIZE {
            key.to_string()
        } else {
            format!("{}@{key}", self.size)
        }
    }

    /// Location actually requested for a skin URL.
    pub fn skin_location(&self, url: &str) -> String {
        match &self.proxy {
            Some(proxy) => format!("{proxy}{}", urlencoding::encode(url)),
            None => url.to_string(),
        }
    }

    /// Decode `blob`, fetch its skin and decode the image.
    pub async fn fetch_skin(&self, blob: &str) -> Result<RgbaImage, RenderError> {
        let skin = SkinTexture::decode(blob)?;
        let location = self.skin_location(&skin.url);
        debug!(url = %skin.url, "fetching skin");
        let bytes = self.source.fetch_bytes(&location).await?;
        Ok(image::load_from_memory(&bytes)?.to_rgba8())
    }

    /// Render `blob` without consulting the cache.
    pub async fn render(&self, blob: &str) -> Result<RgbaImage, RenderError> {
        let skin = self.fetch_skin(blob).await?;
        render_isometric(&skin, self.size)
    }

    /// Data URL of the rendered head, rendering and caching it on a miss.
    ///
    /// Failures are not cached, so a later call retries from scratch.
    pub async fn cached_isometric_head(&mut self, blob: &str) -> Result<String, RenderError> {
        let key = self.render_key(blob);
        if let Some(hit) = self.cache.get(&key) {
            return Ok(hit.to_string());
        }
        let image = match self.render(blob).await {
            Ok(image) => image,
            Err(err) => {
                warn!(%key, %err, "head render failed");
                return Err(err);
            }
        };
        let data_url = encode_data_url(&image)?;
        self.cache.insert(key, data_url.clone());
        Ok(data_url)
    }

    /// The render cache.
    pub fn cache(&self) -> &TextureCache {
        &self.cache
    }

    /// Consume the renderer, returning its cache for persistence.
    pub fn into_cache(self) -> TextureCache {
        self.cache
    }
}
