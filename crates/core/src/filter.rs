//! Catalog filtering and free-text search.

use std::collections::BTreeSet;

use crate::{strip_color_codes, Catalog, Head};

/// Active filters. All constraints combine with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    /// Flat tags; a head must carry every one.
    pub tags: BTreeSet<String>,
    /// Hierarchical drill-down path, e.g. `["alphabet", "oak"]`.
    pub tag_path: Vec<String>,
    /// Single property filter.
    pub property: Option<String>,
}

impl FilterState {
    /// Returns true when no constraint is active.
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty() && self.tag_path.is_empty() && self.property.is_none()
    }

    /// Add or remove a flat tag.
    pub fn toggle_tag(&mut self, tag: &str) {
        if !self.tags.remove(tag) {
            self.tags.insert(tag.to_string());
        }
    }

    /// Select a property, or clear it when it is already selected.
    pub fn toggle_property(&mut self, property: &str) {
        if self.property.as_deref() == Some(property) {
            self.property = None;
        } else {
            self.property = Some(property.to_string());
        }
    }

    /// Drill into a top-level category.
    pub fn enter_category(&mut self, parent: &str) {
        self.tag_path = vec![parent.to_string()];
    }

    /// Select a child of the current category.
    pub fn select_child(&mut self, child: &str) {
        match self.tag_path.first().cloned() {
            Some(parent) => self.tag_path = vec![parent, child.to_string()],
            None => self.tag_path = vec![child.to_string()],
        }
    }

    /// Breadcrumb navigation: `None` returns to the root, `Some(level)` keeps
    /// the path up to and including `level`.
    pub fn truncate_path(&mut self, level: Option<usize>) {
        match level {
            None => self.tag_path.clear(),
            Some(level) => self.tag_path.truncate(level.saturating_add(1)),
        }
    }

    /// Drop every constraint.
    pub fn clear(&mut self) {
        self.tags.clear();
        self.tag_path.clear();
        self.property = None;
    }

    /// Evaluate the structural constraints (path, tags, property) for a head.
    pub fn admits(&self, head: &Head) -> bool {
        if !self.tag_path.is_empty() {
            let full = self.tag_path.join("/");
            let prefix = format!("{full}/");
            if !head.tags.iter().any(|t| *t == full || t.starts_with(&prefix)) {
                return false;
            }
        }
        if !self.tags.iter().all(|tag| head.has_tag(tag)) {
            return false;
        }
        match &self.property {
            Some(property) => head.has_property(property),
            None => true,
        }
    }
}

/// Case-insensitive substring match against id, name, tags and lore.
///
/// `needle` must already be lowercased; an empty needle matches everything.
pub fn matches_query(id: &str, head: &Head, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    let hit = |text: &str| text.to_lowercase().contains(needle);
    hit(id)
        || head
            .name
            .as_deref()
            .is_some_and(|name| hit(&strip_color_codes(name)))
        || head.tags.iter().any(|tag| hit(tag))
        || head.lore.iter().any(|line| hit(&strip_color_codes(line)))
}

/// Ids of heads passing `state` and `query`, in catalog order.
pub fn filter_heads<'a>(catalog: &'a Catalog, state: &FilterState, query: &str) -> Vec<&'a str> {
    let needle = query.trim().to_lowercase();
    catalog
        .heads()
        .filter(|head| state.admits(head) && matches_query(&head.id, head, &needle))
        .map(|head| head.id.as_str())
        .collect()
}
