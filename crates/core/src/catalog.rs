//! Insertion-ordered head catalog.

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::{GridItem, Head, Recipe, SkinTexture};

/// Heads keyed by id, iterated in first-insertion order.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    heads: IndexMap<String, Head>,
}

impl Catalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a head, replacing any existing entry with the same id.
    ///
    /// A replaced id keeps its original position; the old entry is returned
    /// whole (there is no field-level merge).
    pub fn insert(&mut self, head: Head) -> Option<Head> {
        self.heads.insert(head.id.clone(), head)
    }

    /// Look up a head by id.
    pub fn get(&self, id: &str) -> Option<&Head> {
        self.heads.get(id)
    }

    /// Returns true when `id` is present.
    pub fn contains(&self, id: &str) -> bool {
        self.heads.contains_key(id)
    }

    /// Number of heads.
    pub fn len(&self) -> usize {
        self.heads.len()
    }

    /// Returns true when the catalog has no heads.
    pub fn is_empty(&self) -> bool {
        self.heads.is_empty()
    }

    /// Head ids in catalog order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.heads.keys().map(String::as_str)
    }

    /// Heads in catalog order.
    pub fn heads(&self) -> impl Iterator<Item = &Head> {
        self.heads.values()
    }

    /// Reverse index from texture id (last skin URL segment) to head id.
    ///
    /// Heads whose texture is missing or undecodable are skipped; when two
    /// heads share a texture the later one wins.
    pub fn texture_ids(&self) -> HashMap<String, String> {
        self.heads()
            .filter_map(|head| {
                let skin = SkinTexture::decode(head.texture_blob()?).ok()?;
                let texture_id = skin.texture_id()?.to_string();
                Some((texture_id, head.id.clone()))
            })
            .collect()
    }

    /// First crafting-table recipe (shaped before shapeless, catalog order)
    /// that accepts the row-major `grid`.
    pub fn find_crafting(&self, grid: &[Option<GridItem>]) -> Option<(&Head, Recipe<'_>)> {
        self.heads().find_map(|head| {
            head.recipes
                .iter()
                .find(|recipe| match recipe {
                    Recipe::Shaped(r) => r.matches(grid),
                    Recipe::Shapeless(r) => r.matches(grid),
                    Recipe::Stonecutter(_) => false,
                })
                .map(|recipe| (head, recipe))
        })
    }

    /// Every stonecutter recipe that accepts `item`.
    pub fn find_stonecutting(&self, item: &GridItem) -> Vec<(&Head, Recipe<'_>)> {
        self.heads()
            .flat_map(|head| {
                head.recipes
                    .stonecutter
                    .iter()
                    .filter(|r| r.matches(item))
                    .map(move |r| (head, Recipe::Stonecutter(r)))
            })
            .collect()
    }
}

impl FromIterator<Head> for Catalog {
    fn from_iter<T: IntoIterator<Item = Head>>(iter: T) -> Self {
        let mut catalog = Catalog::new();
        for head in iter {
            catalog.insert(head);
        }
        catalog
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replacement_keeps_position() {
        let mut catalog = Catalog::new();
        catalog.insert(Head::new("a"));
        catalog.insert(Head::new("b"));
        let mut replacement = Head::new("a");
        replacement.name = Some("Second".into());
        let old = catalog.insert(replacement).expect("replaced");
        assert!(old.name.is_none());
        assert_eq!(catalog.ids().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(catalog.get("a").unwrap().display_name(), "Second");
    }

    #[test]
    fn indexes_heads_by_texture_id() {
        let mut textured = Head::new("chalice");
        textured.texture = Some(crate::encode_blob(
            "http://textures.minecraft.net/texture/abc123",
        ));
        let mut broken = Head::new("broken");
        broken.texture = Some("%%%".into());
        let catalog: Catalog = [textured, broken, Head::new("bare")].into_iter().collect();

        let index = catalog.texture_ids();
        assert_eq!(index.len(), 1);
        assert_eq!(index["abc123"], "chalice");
    }

    #[test]
    fn finds_recipes_for_grid_and_stonecutter() {
        use crate::{ItemSpec, ShapelessRecipe, StonecutterRecipe};

        let mut dust = Head::new("dust");
        dust.recipes.craft.shapeless.push(ShapelessRecipe {
            id: None,
            amount: 1,
            ingredients: vec![
                ItemSpec::material("REDSTONE", 1),
                ItemSpec::material("GLOWSTONE_DUST", 1),
            ],
        });
        dust.recipes.stonecutter.push(StonecutterRecipe {
            id: Some("dust_cut".into()),
            amount: 2,
            input: Some(ItemSpec::material("STONE", 1)),
        });
        let catalog: Catalog = [Head::new("plain"), dust].into_iter().collect();

        let mut grid = vec![None; 9];
        grid[4] = Some(GridItem::Material("glowstone_dust".into()));
        grid[8] = Some(GridItem::Material("REDSTONE".into()));
        let (head, recipe) = catalog.find_crafting(&grid).expect("match");
        assert_eq!(head.id, "dust");
        assert_eq!(recipe.id(&head.id), "dust_shapeless");

        grid[0] = Some(GridItem::Material("STICK".into()));
        assert!(catalog.find_crafting(&grid).is_none());

        let cuts = catalog.find_stonecutting(&GridItem::Material("stone".into()));
        assert_eq!(cuts.len(), 1);
        assert_eq!(cuts[0].1.id("dust"), "dust_cut");
    }
}
