//! Crafting recipes - shaped, shapeless and stonecutter variants

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

fn one() -> u32 {
    1
}

fn is_one(value: &u32) -> bool {
    *value == 1
}

/// A material or head reference with an amount.
///
/// Used for recipe ingredients, stonecutter inputs and block drops.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSpec {
    /// Vanilla material name (e.g. `oak_planks`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
    /// Head id from the catalog.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head: Option<String>,
    /// Stack amount (defaults to 1).
    #[serde(default = "one", skip_serializing_if = "is_one")]
    pub amount: u32,
}

impl ItemSpec {
    /// Reference a vanilla material.
    pub fn material(name: &str, amount: u32) -> Self {
        Self {
            material: Some(name.to_string()),
            head: None,
            amount,
        }
    }

    /// Reference a catalog head.
    pub fn head(id: &str, amount: u32) -> Self {
        Self {
            material: None,
            head: Some(id.to_string()),
            amount,
        }
    }

    /// Amount clamped to at least one.
    pub fn count(&self) -> u32 {
        self.amount.max(1)
    }

    /// Check whether an item placed in a crafting slot satisfies this spec.
    ///
    /// A material constraint takes precedence over a head constraint.
    pub fn matches(&self, item: &GridItem) -> bool {
        if let Some(material) = &self.material {
            return matches!(item, GridItem::Material(m) if m.eq_ignore_ascii_case(material));
        }
        if let Some(head) = &self.head {
            return matches!(item, GridItem::Head(h) if h == head);
        }
        false
    }
}

/// An item sitting in a crafting grid slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridItem {
    /// Plain vanilla item.
    Material(String),
    /// A catalog head, identified by id.
    Head(String),
}

/// Shaped crafting recipe (2x2 or 3x3 pattern).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapedRecipe {
    /// Recipe id (defaults to `<head>_shaped`).
    #[serde(default)]
    pub id: Option<String>,
    /// Output amount.
    #[serde(default = "one")]
    pub amount: u32,
    /// Pattern rows; spaces are empty slots.
    #[serde(default)]
    pub pattern: Vec<String>,
    /// Legend mapping pattern characters to ingredients.
    #[serde(default)]
    pub key: IndexMap<String, ItemSpec>,
}

/// Row/column bounds of the occupied cells of a pattern or grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Bounds {
    min_row: usize,
    min_col: usize,
    height: usize,
    width: usize,
}

fn occupied_bounds(cells: impl Iterator<Item = (usize, usize)>) -> Option<Bounds> {
    let mut bounds: Option<(usize, usize, usize, usize)> = None;
    for (row, col) in cells {
        bounds = Some(match bounds {
            None => (row, row, col, col),
            Some((r0, r1, c0, c1)) => (r0.min(row), r1.max(row), c0.min(col), c1.max(col)),
        });
    }
    bounds.map(|(r0, r1, c0, c1)| Bounds {
        min_row: r0,
        min_col: c0,
        height: r1 - r0 + 1,
        width: c1 - c0 + 1,
    })
}

/// Side length of a square crafting grid, if the slot count is supported.
fn grid_size(slots: usize) -> Option<usize> {
    match slots {
        4 => Some(2),
        9 => Some(3),
        _ => None,
    }
}

impl ShapedRecipe {
    /// Ingredient for a pattern character. Legend keys must be exactly one character.
    pub fn ingredient_for(&self, symbol: char) -> Option<&ItemSpec> {
        self.key.iter().find_map(|(k, spec)| {
            let mut chars = k.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if c == symbol => Some(spec),
                _ => None,
            }
        })
    }

    /// Pattern character at `(row, col)`, with missing cells treated as empty.
    pub fn symbol_at(&self, row: usize, col: usize) -> char {
        self.pattern
            .get(row)
            .and_then(|line| line.chars().nth(col))
            .unwrap_or(' ')
    }

    /// Pattern characters that have no legend entry.
    pub fn missing_symbols(&self) -> Vec<char> {
        let mut missing: Vec<char> = Vec::new();
        for line in &self.pattern {
            for c in line.chars() {
                if c != ' ' && self.ingredient_for(c).is_none() && !missing.contains(&c) {
                    missing.push(c);
                }
            }
        }
        missing
    }

    fn pattern_bounds(&self) -> Option<Bounds> {
        occupied_bounds(self.pattern.iter().enumerate().flat_map(|(row, line)| {
            line.chars()
                .enumerate()
                .filter(|(_, c)| *c != ' ')
                .map(move |(col, _)| (row, col))
        }))
    }

    /// Check a row-major 2x2 or 3x3 grid against this pattern.
    ///
    /// The pattern may sit anywhere in the grid as long as its occupied
    /// bounding box lines up exactly with the grid's.
    pub fn matches(&self, grid: &[Option<GridItem>]) -> bool {
        let Some(size) = grid_size(grid.len()) else {
            return false;
        };
        let Some(pattern) = self.pattern_bounds() else {
            return false;
        };
        let Some(placed) = occupied_bounds(
            grid.iter()
                .enumerate()
                .filter(|(_, slot)| slot.is_some())
                .map(|(idx, _)| (idx / size, idx % size)),
        ) else {
            return false;
        };
        if placed.width != pattern.width || placed.height != pattern.height {
            return false;
        }

        for row in 0..pattern.height {
            for col in 0..pattern.width {
                let symbol = self.symbol_at(pattern.min_row + row, pattern.min_col + col);
                let slot = &grid[(placed.min_row + row) * size + placed.min_col + col];
                match (symbol, slot) {
                    (' ', None) => {}
                    (' ', Some(_)) | (_, None) => return false,
                    (symbol, Some(item)) => match self.ingredient_for(symbol) {
                        Some(spec) if spec.matches(item) => {}
                        _ => return false,
                    },
                }
            }
        }
        true
    }
}

/// Shapeless crafting recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapelessRecipe {
    /// Recipe id (defaults to `<head>_shapeless`).
    #[serde(default)]
    pub id: Option<String>,
    /// Output amount.
    #[serde(default = "one")]
    pub amount: u32,
    /// Ingredients, one grid slot each.
    #[serde(default)]
    pub ingredients: Vec<ItemSpec>,
}

impl ShapelessRecipe {
    /// Check a 2x2 or 3x3 grid: every occupied slot must be claimed by exactly one ingredient.
    pub fn matches(&self, grid: &[Option<GridItem>]) -> bool {
        if grid_size(grid.len()).is_none() {
            return false;
        }
        let items: Vec<&GridItem> = grid.iter().flatten().collect();
        if items.len() != self.ingredients.len() {
            return false;
        }
        let mut used = vec![false; items.len()];
        self.ingredients.iter().all(|spec| {
            let slot = items
                .iter()
                .enumerate()
                .position(|(idx, item)| !used[idx] && spec.matches(item));
            match slot {
                Some(idx) => {
                    used[idx] = true;
                    true
                }
                None => false,
            }
        })
    }
}

/// Stonecutter recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StonecutterRecipe {
    /// Recipe id (defaults to `<head>_stonecut`).
    #[serde(default)]
    pub id: Option<String>,
    /// Output amount.
    #[serde(default = "one")]
    pub amount: u32,
    /// Single input item.
    #[serde(default)]
    pub input: Option<ItemSpec>,
}

impl StonecutterRecipe {
    /// Check whether `item` can be cut into this recipe's output.
    pub fn matches(&self, item: &GridItem) -> bool {
        self.input.as_ref().is_some_and(|spec| spec.matches(item))
    }
}

/// Crafting-table recipes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CraftRecipes {
    /// Shaped recipes.
    pub shaped: Vec<ShapedRecipe>,
    /// Shapeless recipes.
    pub shapeless: Vec<ShapelessRecipe>,
}

/// All recipes producing one head.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Recipes {
    /// Crafting-table recipes.
    pub craft: CraftRecipes,
    /// Stonecutter recipes.
    pub stonecutter: Vec<StonecutterRecipe>,
}

/// Recipe variant tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecipeKind {
    /// Shaped crafting.
    Shaped,
    /// Shapeless crafting.
    Shapeless,
    /// Stonecutter.
    Stonecutter,
}

impl RecipeKind {
    /// Human readable label.
    pub fn label(self) -> &'static str {
        match self {
            RecipeKind::Shaped => "Shaped Crafting",
            RecipeKind::Shapeless => "Shapeless Crafting",
            RecipeKind::Stonecutter => "Stonecutter",
        }
    }

    fn id_suffix(self) -> &'static str {
        match self {
            RecipeKind::Shaped => "shaped",
            RecipeKind::Shapeless => "shapeless",
            RecipeKind::Stonecutter => "stonecut",
        }
    }
}

/// Borrowed view over any recipe variant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Recipe<'a> {
    /// Shaped crafting.
    Shaped(&'a ShapedRecipe),
    /// Shapeless crafting.
    Shapeless(&'a ShapelessRecipe),
    /// Stonecutter.
    Stonecutter(&'a StonecutterRecipe),
}

impl<'a> Recipe<'a> {
    /// Variant tag.
    pub fn kind(&self) -> RecipeKind {
        match self {
            Recipe::Shaped(_) => RecipeKind::Shaped,
            Recipe::Shapeless(_) => RecipeKind::Shapeless,
            Recipe::Stonecutter(_) => RecipeKind::Stonecutter,
        }
    }

    /// Output amount, at least one.
    pub fn amount(&self) -> u32 {
        match self {
            Recipe::Shaped(r) => r.amount,
            Recipe::Shapeless(r) => r.amount,
            Recipe::Stonecutter(r) => r.amount,
        }
        .max(1)
    }

    /// Recipe id, falling back to `<head>_<kind>`.
    pub fn id(&self, head_id: &str) -> String {
        let explicit = match self {
            Recipe::Shaped(r) => r.id.as_deref(),
            Recipe::Shapeless(r) => r.id.as_deref(),
            Recipe::Stonecutter(r) => r.id.as_deref(),
        };
        explicit
            .map(str::to_string)
            .unwrap_or_else(|| format!("{head_id}_{}", self.kind().id_suffix()))
    }

    /// Every item referenced as an input.
    pub fn inputs(&self) -> Vec<&'a ItemSpec> {
        match self {
            Recipe::Shaped(r) => r.key.values().collect(),
            Recipe::Shapeless(r) => r.ingredients.iter().collect(),
            Recipe::Stonecutter(r) => r.input.iter().collect(),
        }
    }
}

impl Recipes {
    /// Iterate shaped, then shapeless, then stonecutter recipes.
    pub fn iter(&self) -> impl Iterator<Item = Recipe<'_>> {
        self.craft
            .shaped
            .iter()
            .map(Recipe::Shaped)
            .chain(self.craft.shapeless.iter().map(Recipe::Shapeless))
            .chain(self.stonecutter.iter().map(Recipe::Stonecutter))
    }

    /// Total recipe count across variants.
    pub fn len(&self) -> usize {
        self.craft.shaped.len() + self.craft.shapeless.len() + self.stonecutter.len()
    }

    /// Returns true when no recipe is defined.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
