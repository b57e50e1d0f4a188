//! Material name -> icon URL resolution.
//!
//! Sources are tried in order: pre-rendered Octagon block textures, the
//! vanilla item texture list, the vanilla block texture list, and finally the
//! wiki's inventory icon for the material's English display name.

use std::collections::{HashMap, HashSet};

use serde::Deserialize;
use tracing::{error, warn};

use crate::{AssetSource, FetchError};

/// Pre-rendered isometric block textures.
pub const OCTAGON_BASE: &str =
    "https://raw.githubusercontent.com/MyOctagon/Minecraft-Block-Textures/main";
/// Vanilla texture root (pinned game version).
pub const MC_ASSETS_BASE: &str =
    "https://raw.githubusercontent.com/InventivetalentDev/minecraft-assets/1.21.4/assets/minecraft/textures";
/// Wiki file redirect used for inventory icons.
pub const WIKI_FILE_BASE: &str = "https://minecraft.wiki/w/Special:FilePath";

/// Where each index is fetched from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureIndexLocations {
    /// Octagon index (`material -> {folder, file}`).
    pub octagon: String,
    /// Vanilla item texture list.
    pub items: String,
    /// Vanilla block texture list.
    pub blocks: String,
    /// English language file.
    pub lang: String,
}

impl Default for TextureIndexLocations {
    fn default() -> Self {
        let assets_root = MC_ASSETS_BASE.trim_end_matches("/textures");
        Self {
            octagon: "util/octagon-textures.json".to_string(),
            items: format!("{MC_ASSETS_BASE}/item/_list.json"),
            blocks: format!("{MC_ASSETS_BASE}/block/_list.json"),
            lang: format!("{assets_root}/lang/en_us.json"),
        }
    }
}

/// Location of a pre-rendered Octagon texture.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OctagonEntry {
    /// Folder in the Octagon repository.
    pub folder: String,
    /// File name inside the folder.
    pub file: String,
}

#[derive(Deserialize)]
struct TextureList {
    #[serde(default)]
    files: Vec<String>,
}

/// Failure loading one of the required indices.
#[derive(Debug, thiserror::Error)]
pub enum TextureIndexError {
    /// Fetch failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),
    /// JSON was malformed.
    #[error("{path}: {source}")]
    Json {
        /// Index location.
        path: String,
        /// Parser error.
        #[source]
        source: serde_json::Error,
    },
}

/// Lookup tables for material icons.
#[derive(Debug, Clone, Default)]
pub struct TextureIndex {
    octagon: HashMap<String, OctagonEntry>,
    items: HashSet<String>,
    blocks: HashSet<String>,
    lang: HashMap<String, String>,
}

async fn fetch_json<T: for<'de> Deserialize<'de>>(
    source: &dyn AssetSource,
    path: &str,
) -> Result<T, TextureIndexError> {
    let text = source.fetch_text(path).await?;
    serde_json::from_str(&text).map_err(|source| TextureIndexError::Json {
        path: path.to_string(),
        source,
    })
}

fn list_names(list: TextureList) -> HashSet<String> {
    list.files
        .into_iter()
        .filter_map(|f| f.strip_suffix(".png").map(str::to_string))
        .collect()
}

impl TextureIndex {
    /// Build an index from already-parsed tables.
    pub fn from_parts(
        octagon: HashMap<String, OctagonEntry>,
        items: impl IntoIterator<Item = String>,
        blocks: impl IntoIterator<Item = String>,
        lang: HashMap<String, String>,
    ) -> Self {
        Self {
            octagon,
            items: items.into_iter().collect(),
            blocks: blocks.into_iter().collect(),
            lang,
        }
    }

    /// Load every index, tolerating failures.
    ///
    /// If the Octagon index or either texture list fails, the whole index
    /// stays empty, language map included; a failing language file alone
    /// only empties the language map.
    pub async fn load(source: &dyn AssetSource, locations: &TextureIndexLocations) -> Self {
        let required = async {
            let octagon = fetch_json::<HashMap<String, OctagonEntry>>(source, &locations.octagon);
            let items = fetch_json::<TextureList>(source, &locations.items);
            let blocks = fetch_json::<TextureList>(source, &locations.blocks);
            tokio::try_join!(octagon, items, blocks)
        };
        let lang = async {
            fetch_json::<HashMap<String, String>>(source, &locations.lang)
                .await
                .unwrap_or_else(|err| {
                    warn!(%err, "language file unavailable");
                    HashMap::new()
                })
        };
        let (required, lang) = tokio::join!(required, lang);

        match required {
            Ok((octagon, items, blocks)) => Self {
                octagon,
                items: list_names(items),
                blocks: list_names(blocks),
                lang,
            },
            Err(err) => {
                warn!(%err, "failed to load texture lists");
                Self::default()
            }
        }
    }

    /// Returns true when no index has entries.
    pub fn is_empty(&self) -> bool {
        self.octagon.is_empty()
            && self.items.is_empty()
            && self.blocks.is_empty()
            && self.lang.is_empty()
    }

    /// English display name from the language file.
    pub fn display_name(&self, material: &str) -> Option<&str> {
        let name = material.to_lowercase();
        self.lang
            .get(&format!("block.minecraft.{name}"))
            .or_else(|| self.lang.get(&format!("item.minecraft.{name}")))
            .map(String::as_str)
    }

    /// Icon URL for a material, or `None` when no source knows it.
    pub fn texture_url(&self, material: &str) -> Option<String> {
        let name = material.to_lowercase();

        if let Some(entry) = self.octagon.get(&name) {
            return Some(format!(
                "{OCTAGON_BASE}/{}/{}",
                encode_component(&entry.folder),
                encode_component(&entry.file)
            ));
        }
        if self.items.contains(&name) {
            return Some(format!("{MC_ASSETS_BASE}/item/{name}.png"));
        }
        if self.blocks.contains(&name) {
            return Some(format!("{MC_ASSETS_BASE}/block/{name}.png"));
        }
        if let Some(display) = self.display_name(&name) {
            let file = format!("Invicon_{}.png", display.replace(' ', "_"));
            return Some(format!("{WIKI_FILE_BASE}/{}", encode_component(&file)));
        }

        error!(
            material = %name,
            tried = "octagon, item list, block list, language file",
            "no texture found"
        );
        None
    }
}

/// Percent-encode a URL component, leaving `!'()*` literal like
/// JavaScript's `encodeURIComponent`.
fn encode_component(text: &str) -> String {
    let mut encoded = urlencoding::encode(text).into_owned();
    for (escape, literal) in [("%21", "!"), ("%27", "'"), ("%28", "("), ("%29", ")"), ("%2A", "*")] {
        encoded = encoded.replace(escape, literal);
    }
    encoded
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> TextureIndex {
        let mut octagon = HashMap::new();
        octagon.insert(
            "carved_pumpkin".to_string(),
            OctagonEntry {
                folder: "Pumpkins & Melons".to_string(),
                file: "carved_pumpkin.png".to_string(),
            },
        );
        let mut lang = HashMap::new();
        lang.insert("item.minecraft.stone_sword".to_string(), "Stone Sword".to_string());
        lang.insert("block.minecraft.stone".to_string(), "Stone".to_string());
        TextureIndex::from_parts(
            octagon,
            ["stick".to_string()],
            ["stone".to_string()],
            lang,
        )
    }

    #[test]
    fn resolves_in_source_order() {
        let index = index();
        assert_eq!(
            index.texture_url("CARVED_PUMPKIN").as_deref(),
            Some(
                "https://raw.githubusercontent.com/MyOctagon/Minecraft-Block-Textures/main/Pumpkins%20%26%20Melons/carved_pumpkin.png"
            )
        );
        assert_eq!(
            index.texture_url("stick"),
            Some(format!("{MC_ASSETS_BASE}/item/stick.png"))
        );
        assert_eq!(
            index.texture_url("stone"),
            Some(format!("{MC_ASSETS_BASE}/block/stone.png"))
        );
    }

    #[test]
    fn falls_back_to_wiki_invicon() {
        assert_eq!(
            index().texture_url("stone_sword").as_deref(),
            Some("https://minecraft.wiki/w/Special:FilePath/Invicon_Stone_Sword.png")
        );
    }

    #[test]
    fn wiki_names_keep_apostrophes_and_parentheses() {
        let mut lang = HashMap::new();
        lang.insert("block.minecraft.jack_o_lantern".to_string(), "Jack o'Lantern".to_string());
        lang.insert("item.minecraft.potion".to_string(), "Potion (Awkward) 100%!".to_string());
        let index = TextureIndex::from_parts(HashMap::new(), Vec::new(), Vec::new(), lang);
        assert_eq!(
            index.texture_url("jack_o_lantern").as_deref(),
            Some("https://minecraft.wiki/w/Special:FilePath/Invicon_Jack_o'Lantern.png")
        );
        assert_eq!(
            index.texture_url("potion").as_deref(),
            Some("https://minecraft.wiki/w/Special:FilePath/Invicon_Potion_(Awkward)_100%25!.png")
        );
    }

    #[test]
    fn unknown_material_has_no_url() {
        assert!(index().texture_url("unobtainium").is_none());
        assert!(TextureIndex::default().texture_url("stone").is_none());
    }

    #[test]
    fn default_locations_point_at_pinned_assets() {
        let locations = TextureIndexLocations::default();
        assert!(locations.items.ends_with("/textures/item/_list.json"));
        assert_eq!(
            locations.lang,
            "https://raw.githubusercontent.com/InventivetalentDev/minecraft-assets/1.21.4/assets/minecraft/lang/en_us.json"
        );
    }
}
