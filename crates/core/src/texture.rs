//! Texture blob decoding.
//!
//! A head texture is a base64 string wrapping a JSON document of the form
//! `{"textures":{"SKIN":{"url":"https://textures.minecraft.net/texture/<id>"}}}`.

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine as _;
use serde::Deserialize;
use thiserror::Error;

/// Number of trailing blob characters used as the render cache key.
pub const CACHE_KEY_LEN: usize = 32;

/// Blobs in the wild are padded inconsistently; accept both forms.
const BLOB_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Errors raised while decoding a texture blob.
#[derive(Debug, Error)]
pub enum TextureError {
    /// The blob was empty or whitespace.
    #[error("texture blob is empty")]
    Empty,
    /// The blob is not valid base64.
    #[error("texture blob is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    /// The decoded payload is not the expected JSON document.
    #[error("texture payload is not a skin document: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Deserialize)]
struct TexturePayload {
    textures: TextureSet,
}

#[derive(Deserialize)]
struct TextureSet {
    #[serde(rename = "SKIN")]
    skin: SkinEntry,
}

#[derive(Deserialize)]
struct SkinEntry {
    url: String,
}

/// Skin reference extracted from a texture blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkinTexture {
    /// Remote skin image URL.
    pub url: String,
}

impl SkinTexture {
    /// Decode a texture blob into its skin URL.
    pub fn decode(blob: &str) -> Result<Self, TextureError> {
        let blob = blob.trim();
        if blob.is_empty() {
            return Err(TextureError::Empty);
        }
        let bytes = BLOB_ENGINE.decode(blob)?;
        let payload: TexturePayload = serde_json::from_slice(&bytes)?;
        Ok(Self {
            url: payload.textures.skin.url,
        })
    }

    /// Texture id: the last path segment of the skin URL.
    pub fn texture_id(&self) -> Option<&str> {
        let (_, id) = self.url.rsplit_once('/')?;
        (!id.is_empty()).then_some(id)
    }
}

/// Encode a skin URL into a texture blob (the inverse of [`SkinTexture::decode`]).
pub fn encode_blob(url: &str) -> String {
    let json = serde_json::json!({ "textures": { "SKIN": { "url": url } } });
    base64::engine::general_purpose::STANDARD.encode(json.to_string())
}

/// Cache key for a blob: its last [`CACHE_KEY_LEN`] characters.
///
/// Distinct blobs sharing a suffix collide; blobs produced by the same
/// encoder almost never do in practice.
pub fn cache_key(blob: &str) -> &str {
    let count = blob.chars().count();
    if count <= CACHE_KEY_LEN {
        return blob;
    }
    let skip = count - CACHE_KEY_LEN;
    let start = blob
        .char_indices()
        .nth(skip)
        .map(|(idx, _)| idx)
        .unwrap_or(0);
    &blob[start..]
}
