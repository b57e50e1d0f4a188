//! Tag taxonomy: hierarchical categories and flat tags with head counts.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::Head;

/// Split a tag at its first `/` into `(parent, child)`.
///
/// Tags without a slash, or starting with one, are flat.
pub fn split_tag(tag: &str) -> Option<(&str, &str)> {
    match tag.find('/') {
        Some(idx) if idx > 0 => Some((&tag[..idx], &tag[idx + 1..])),
        _ => None,
    }
}

/// One selectable entry at a navigation level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagLevelEntry {
    /// Tag (or category) name.
    pub tag: String,
    /// Occurrence count.
    pub count: usize,
    /// True for categories that can be drilled into.
    pub has_children: bool,
}

/// Tag counts across a set of heads, rebuilt from scratch on demand.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TagTaxonomy {
    /// `parent -> child -> count` for hierarchical tags.
    pub tree: BTreeMap<String, BTreeMap<String, usize>>,
    /// `tag -> count` for flat tags.
    pub flat: BTreeMap<String, usize>,
}

impl TagTaxonomy {
    /// Count every tag occurrence across `heads`.
    pub fn build<'a>(heads: impl IntoIterator<Item = &'a Head>) -> Self {
        let mut taxonomy = Self::default();
        for head in heads {
            for tag in &head.tags {
                match split_tag(tag) {
                    Some((parent, child)) => {
                        *taxonomy
                            .tree
                            .entry(parent.to_string())
                            .or_default()
                            .entry(child.to_string())
                            .or_default() += 1;
                    }
                    None => *taxonomy.flat.entry(tag.clone()).or_default() += 1,
                }
            }
        }
        taxonomy
    }

    /// Returns true when `parent` is a hierarchical category.
    pub fn is_category(&self, parent: &str) -> bool {
        self.tree.contains_key(parent)
    }

    /// Top-level categories with the summed counts of their children, sorted by name.
    pub fn categories(&self) -> Vec<TagLevelEntry> {
        self.tree
            .iter()
            .map(|(parent, children)| TagLevelEntry {
                tag: parent.clone(),
                count: children.values().sum(),
                has_children: true,
            })
            .collect()
    }

    /// Flat tags sorted by name.
    pub fn flat_tags(&self) -> Vec<TagLevelEntry> {
        self.flat
            .iter()
            .map(|(tag, count)| TagLevelEntry {
                tag: tag.clone(),
                count: *count,
                has_children: false,
            })
            .collect()
    }

    /// Entries visible at the current drill-down `path`.
    ///
    /// At the root this is every category plus every flat tag; inside a
    /// category it is that category's children.
    pub fn tags_at_level(&self, path: &[String]) -> Vec<TagLevelEntry> {
        match path.first() {
            None => {
                let mut entries = self.categories();
                entries.extend(self.flat_tags());
                entries.sort_by(|a, b| a.tag.cmp(&b.tag));
                entries
            }
            Some(parent) => self
                .tree
                .get(parent)
                .map(|children| {
                    children
                        .iter()
                        .map(|(tag, count)| TagLevelEntry {
                            tag: tag.clone(),
                            count: *count,
                            has_children: false,
                        })
                        .collect()
                })
                .unwrap_or_default(),
        }
    }
}

/// Property occurrence counts sorted by name.
pub fn property_counts<'a>(heads: impl IntoIterator<Item = &'a Head>) -> Vec<(String, usize)> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for head in heads {
        for property in &head.properties {
            *counts.entry(property.clone()).or_default() += 1;
        }
    }
    counts.into_iter().collect()
}
