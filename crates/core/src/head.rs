//! Head definitions as authored in the plugin's YAML files.

use serde::{Deserialize, Serialize};

use crate::{Drops, ItemSpec, Recipes, ToolCategory};

/// Where a head was loaded from.
///
/// The line number comes from a textual scan of the source file and is only
/// a best-effort pointer, not a parser position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    /// Manifest-relative file path (e.g. `heads/candles.yml`).
    pub file: String,
    /// 1-indexed line of the head's key, or 1 when it could not be found.
    pub line: usize,
}

/// Behaviour flags understood by the plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HeadProperty {
    /// Can be lit and unlit (candles).
    Lightable,
    /// Always emits light when placed.
    Glowing,
    /// Opens a crafting table.
    Workbench,
    /// Opens an anvil.
    Anvil,
    /// Opens an enchanting table.
    Enchanting,
    /// Opens a smithing table.
    Smithing,
    /// Opens a loom.
    Loom,
    /// Opens a stonecutter.
    Stonecutter,
    /// Opens a grindstone.
    Grindstone,
    /// Opens a cartography table.
    Cartography,
    /// Opens the ender chest.
    Enderchest,
}

impl HeadProperty {
    /// Every known property.
    pub const ALL: [HeadProperty; 11] = [
        HeadProperty::Lightable,
        HeadProperty::Glowing,
        HeadProperty::Workbench,
        HeadProperty::Anvil,
        HeadProperty::Enchanting,
        HeadProperty::Smithing,
        HeadProperty::Loom,
        HeadProperty::Stonecutter,
        HeadProperty::Grindstone,
        HeadProperty::Cartography,
        HeadProperty::Enderchest,
    ];

    /// Parse a property name, case-insensitive.
    pub fn parse(s: &str) -> Option<Self> {
        let lower = s.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|p| p.as_str() == lower)
    }

    /// Canonical lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            HeadProperty::Lightable => "lightable",
            HeadProperty::Glowing => "glowing",
            HeadProperty::Workbench => "workbench",
            HeadProperty::Anvil => "anvil",
            HeadProperty::Enchanting => "enchanting",
            HeadProperty::Smithing => "smithing",
            HeadProperty::Loom => "loom",
            HeadProperty::Stonecutter => "stonecutter",
            HeadProperty::Grindstone => "grindstone",
            HeadProperty::Cartography => "cartography",
            HeadProperty::Enderchest => "enderchest",
        }
    }
}

/// A custom head entry.
///
/// `id` and `source` are not part of the YAML entry; the loader fills them in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Head {
    /// Unique id (the YAML mapping key).
    #[serde(skip)]
    pub id: String,
    /// Display name with `&` color codes.
    pub name: Option<String>,
    /// Lore lines with `&` color codes.
    pub lore: Vec<String>,
    /// Base64 texture blob.
    pub texture: Option<String>,
    /// Flat tags or `parent/child` paths.
    pub tags: Vec<String>,
    /// Behaviour flags, matched verbatim by filters.
    pub properties: Vec<String>,
    /// Recipes producing this head.
    pub recipes: Recipes,
    /// Drop rules.
    pub drops: Drops,
    /// Load-time provenance.
    #[serde(skip)]
    pub source: Option<Provenance>,
}

impl Head {
    /// Create an empty head with the given id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Display name, falling back to the id.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }

    /// Non-blank texture blob.
    pub fn texture_blob(&self) -> Option<&str> {
        self.texture.as_deref().filter(|t| !t.trim().is_empty())
    }

    /// Exact tag membership.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Exact property membership.
    pub fn has_property(&self, property: &str) -> bool {
        self.properties.iter().any(|p| p == property)
    }

    /// Items dropped when the placed head is broken.
    ///
    /// Without a matching rule the head drops one copy of itself.
    pub fn drops_for(&self, silk_touch: bool, tool: Option<ToolCategory>) -> Vec<ItemSpec> {
        match self.drops.resolve(silk_touch, tool) {
            Some(items) => items.to_vec(),
            None => vec![ItemSpec::head(&self.id, 1)],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_yaml_entry() {
        let yaml = r#"
name: "&6Golden Chalice"
lore:
  - "&7A shiny cup"
texture: abc
tags: [chalices, "color/gold"]
properties: [glowing, sparkly]
recipes:
  craft:
    shapeless:
      - ingredients:
          - material: gold_ingot
            amount: 3
drops:
  on_break:
    - when: { silk_touch: true }
      drops:
        - head: golden_chalice
"#;
        let mut head: Head = serde_yaml::from_str(yaml).unwrap();
        head.id = "golden_chalice".into();
        assert_eq!(head.display_name(), "&6Golden Chalice");
        assert!(head.has_tag("color/gold"));
        assert!(head.has_property("sparkly"));
        assert_eq!(HeadProperty::parse(&head.properties[0]), Some(HeadProperty::Glowing));
        assert_eq!(head.recipes.len(), 1);
        assert_eq!(head.recipes.craft.shapeless[0].ingredients[0].amount, 3);
        assert_eq!(head.recipes.craft.shapeless[0].amount, 1);
        assert_eq!(head.drops_for(true, None)[0].head.as_deref(), Some("golden_chalice"));
    }

    #[test]
    fn falls_back_to_self_drop() {
        let head = Head::new("lamp");
        let drops = head.drops_for(false, Some(ToolCategory::Pickaxe));
        assert_eq!(drops, vec![ItemSpec::head("lamp", 1)]);
        assert_eq!(head.display_name(), "lamp");
        assert!(head.texture_blob().is_none());
    }

    #[test]
    fn property_parse_is_case_insensitive() {
        assert_eq!(HeadProperty::parse("ENDERCHEST"), Some(HeadProperty::Enderchest));
        assert_eq!(HeadProperty::parse("nope"), None);
    }
}
