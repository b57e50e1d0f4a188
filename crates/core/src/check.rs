//! Static consistency checks over a loaded catalog.

use std::fmt;

use crate::{Catalog, Head, HeadProperty, ItemSpec, Recipe, SkinTexture};

/// A single problem found in a catalog entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogIssue {
    /// The head has no texture blob.
    MissingTexture {
        /// Offending head.
        head: String,
    },
    /// The texture blob does not decode to a skin URL.
    BadTexture {
        /// Offending head.
        head: String,
        /// Decoder message.
        reason: String,
    },
    /// A property string the plugin does not recognise.
    UnknownProperty {
        /// Offending head.
        head: String,
        /// The unrecognised property.
        property: String,
    },
    /// A recipe ingredient or drop names a head that is not in the catalog.
    UnknownHeadRef {
        /// Offending head.
        head: String,
        /// Where the reference appears (recipe id or `drops`).
        context: String,
        /// Missing head id.
        reference: String,
    },
    /// A shaped pattern uses a character with no legend entry.
    MissingPatternKey {
        /// Offending head.
        head: String,
        /// Recipe id.
        recipe: String,
        /// Unmapped pattern character.
        symbol: char,
    },
}

impl CatalogIssue {
    /// Head the issue belongs to.
    pub fn head(&self) -> &str {
        match self {
            CatalogIssue::MissingTexture { head }
            | CatalogIssue::BadTexture { head, .. }
            | CatalogIssue::UnknownProperty { head, .. }
            | CatalogIssue::UnknownHeadRef { head, .. }
            | CatalogIssue::MissingPatternKey { head, .. } => head,
        }
    }
}

impl fmt::Display for CatalogIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogIssue::MissingTexture { head } => write!(f, "{head}: no texture"),
            CatalogIssue::BadTexture { head, reason } => {
                write!(f, "{head}: undecodable texture ({reason})")
            }
            CatalogIssue::UnknownProperty { head, property } => {
                write!(f, "{head}: unknown property '{property}'")
            }
            CatalogIssue::UnknownHeadRef {
                head,
                context,
                reference,
            } => write!(f, "{head}: {context} references unknown head '{reference}'"),
            CatalogIssue::MissingPatternKey {
                head,
                recipe,
                symbol,
            } => write!(f, "{head}: recipe {recipe} has no key for '{symbol}'"),
        }
    }
}

fn unknown_refs<'a>(
    catalog: &'a Catalog,
    items: impl IntoIterator<Item = &'a ItemSpec>,
) -> impl Iterator<Item = &'a str> {
    items
        .into_iter()
        .filter(|spec| spec.material.is_none())
        .filter_map(|spec| spec.head.as_deref())
        .filter(move |id| !catalog.contains(id))
}

fn check_head(catalog: &Catalog, head: &Head, issues: &mut Vec<CatalogIssue>) {
    let id = head.id.clone();
    match head.texture_blob() {
        None => issues.push(CatalogIssue::MissingTexture { head: id.clone() }),
        Some(blob) => {
            if let Err(err) = SkinTexture::decode(blob) {
                issues.push(CatalogIssue::BadTexture {
                    head: id.clone(),
                    reason: err.to_string(),
                });
            }
        }
    }

    for property in &head.properties {
        if HeadProperty::parse(property).is_none() {
            issues.push(CatalogIssue::UnknownProperty {
                head: id.clone(),
                property: property.clone(),
            });
        }
    }

    for recipe in head.recipes.iter() {
        let recipe_id = recipe.id(&head.id);
        for reference in unknown_refs(catalog, recipe.inputs()) {
            issues.push(CatalogIssue::UnknownHeadRef {
                head: id.clone(),
                context: recipe_id.clone(),
                reference: reference.to_string(),
            });
        }
        if let Recipe::Shaped(shaped) = recipe {
            for symbol in shaped.missing_symbols() {
                issues.push(CatalogIssue::MissingPatternKey {
                    head: id.clone(),
                    recipe: recipe_id.clone(),
                    symbol,
                });
            }
        }
    }

    let dropped = head.drops.on_break.iter().flat_map(|rule| &rule.drops);
    for reference in unknown_refs(catalog, dropped) {
        issues.push(CatalogIssue::UnknownHeadRef {
            head: id.clone(),
            context: "drops".to_string(),
            reference: reference.to_string(),
        });
    }
}

/// Check every head, returning issues in catalog order.
pub fn check_catalog(catalog: &Catalog) -> Vec<CatalogIssue> {
    let mut issues = Vec::new();
    for head in catalog.heads() {
        check_head(catalog, head, &mut issues);
    }
    issues
}
