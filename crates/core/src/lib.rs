#![warn(missing_docs)]
//! Core catalog primitives shared across the workspace.

pub mod catalog;
pub mod check;
pub mod color;
pub mod crafting;
pub mod drops;
pub mod filter;
pub mod head;
pub mod taxonomy;
pub mod texture;

// Re-export commonly used types
pub use catalog::Catalog;
pub use check::{check_catalog, CatalogIssue};
pub use color::{color_tokens, strip_color_codes, ColorToken};
pub use crafting::{
    CraftRecipes, GridItem, ItemSpec, Recipe, RecipeKind, Recipes, ShapedRecipe, ShapelessRecipe,
    StonecutterRecipe,
};
pub use drops::{DropRule, Drops, ToolCategory};
pub use filter::{filter_heads, matches_query, FilterState};
pub use head::{Head, HeadProperty, Provenance};
pub use taxonomy::{property_counts, split_tag, TagLevelEntry, TagTaxonomy};
pub use texture::{cache_key, encode_blob, SkinTexture, TextureError};
