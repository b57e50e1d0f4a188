#![warn(missing_docs)]
//! Head rendering: skin fetch, isometric compositing, caching and lazy loading.

mod cache;
mod isometric;
mod lazy;
mod renderer;

pub use cache::{CacheError, TextureCache, DEFAULT_CACHE_CAPACITY};
pub use isometric::{
    canvas_size, render_isometric, DEFAULT_RENDER_SIZE, FACE_PIXELS, MAX_RENDER_SIZE,
    MIN_SKIN_HEIGHT, MIN_SKIN_WIDTH, OUTER_SCALE,
};
pub use lazy::{load_element, ElementKind, LazyElement, LoadOutcome, PassId, VisibilityLoader};
pub use renderer::{encode_data_url, HeadRenderer, CORS_PROXY};

use headsmith_assets::FetchError;
use headsmith_core::TextureError;
use thiserror::Error;

/// Errors raised while producing a head image.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The texture blob is invalid.
    #[error(transparent)]
    Texture(#[from] TextureError),
    /// The skin could not be fetched.
    #[error("failed to fetch skin: {0}")]
    Fetch(#[from] FetchError),
    /// The skin could not be decoded, or the output could not be encoded.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    /// The skin image lacks the head regions.
    #[error("skin is {width}x{height}, expected at least 48x16")]
    SkinTooSmall {
        /// Skin width.
        width: u32,
        /// Skin height.
        height: u32,
    },
}
