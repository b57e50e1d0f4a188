//! Interactive catalog browsing state.
//!
//! Every change to the query or the filters starts a new render pass:
//! elements still waiting from the previous pass are dropped and the
//! result list is rebuilt from scratch.

use std::time::{Duration, Instant};

use headsmith_assets::TextureIndex;
use headsmith_core::{filter_heads, property_counts, Catalog, FilterState, TagLevelEntry, TagTaxonomy};
use headsmith_render::{LazyElement, PassId, VisibilityLoader};
use tracing::debug;

use crate::debounce::Debounce;
use crate::html::{self, CardContext};

/// What the result area currently shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeadsView {
    /// Matching head ids in catalog order.
    Heads(Vec<String>),
    /// A category was entered; a child must be picked first.
    SelectSubcategory,
}

/// Cards appended to the result area in one step.
#[derive(Debug, Clone)]
pub struct Page {
    pub pass: PassId,
    pub ids: Vec<String>,
    pub html: String,
    pub elements: Vec<LazyElement>,
}

pub struct Session {
    catalog: Catalog,
    textures: Option<TextureIndex>,
    taxonomy: TagTaxonomy,
    properties: Vec<(String, usize)>,
    filters: FilterState,
    query: String,
    search: Debounce<String>,
    loader: VisibilityLoader,
    pass: PassId,
    view: HeadsView,
    page_size: usize,
    shown: usize,
}

impl Session {
    pub fn new(catalog: Catalog, textures: Option<TextureIndex>, debounce: Duration) -> Self {
        let taxonomy = TagTaxonomy::build(catalog.heads());
        let properties = property_counts(catalog.heads());
        let loader = VisibilityLoader::new();
        let pass = loader.current_pass();
        let mut session = Self {
            catalog,
            textures,
            taxonomy,
            properties,
            filters: FilterState::default(),
            query: String::new(),
            search: Debounce::new(debounce),
            loader,
            pass,
            view: HeadsView::Heads(Vec::new()),
            page_size: 24,
            shown: 0,
        };
        session.refresh();
        session
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn view(&self) -> &HeadsView {
        &self.view
    }

    pub fn pass(&self) -> PassId {
        self.pass
    }

    pub fn properties(&self) -> &[(String, usize)] {
        &self.properties
    }

    /// Tags selectable at the current drill-down level.
    pub fn level_entries(&self) -> Vec<TagLevelEntry> {
        self.taxonomy.tags_at_level(&self.filters.tag_path)
    }

    /// Flat tags, selectable at every level.
    pub fn flat_entries(&self) -> Vec<TagLevelEntry> {
        self.taxonomy.flat_tags()
    }

    /// Whether `tag` shows as selected at the current level.
    pub fn is_active(&self, tag: &str) -> bool {
        self.filters.tags.contains(tag) || self.filters.tag_path.iter().any(|t| t == tag)
    }

    pub fn counter_text(&self) -> String {
        let shown = match &self.view {
            HeadsView::Heads(ids) => ids.len(),
            HeadsView::SelectSubcategory => 0,
        };
        html::counter_text(shown, self.catalog.len())
    }

    /// Rebuild the result list and start a new render pass.
    pub fn refresh(&mut self) {
        self.pass = self.loader.begin_pass();
        self.shown = 0;
        let path = &self.filters.tag_path;
        self.view = if path.len() == 1 && self.taxonomy.is_category(&path[0]) {
            HeadsView::SelectSubcategory
        } else {
            HeadsView::Heads(
                filter_heads(&self.catalog, &self.filters, &self.query)
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
            )
        };
        debug!(query = %self.query, path = ?self.filters.tag_path, "results refreshed");
    }

    /// Queue a search query; it applies once input has been quiet for the debounce delay.
    pub fn input(&mut self, now: Instant, text: impl Into<String>) {
        self.search.push(now, text.into());
    }

    pub fn search_deadline(&self) -> Option<Instant> {
        self.search.deadline()
    }

    /// Apply a queued query whose delay has elapsed. Returns true when results changed.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.search.poll(now) {
            Some(query) => {
                self.query = query;
                self.refresh();
                true
            }
            None => false,
        }
    }

    /// Apply a queued query immediately.
    pub fn flush_search(&mut self) -> bool {
        match self.search.flush() {
            Some(query) => {
                self.query = query;
                self.refresh();
                true
            }
            None => false,
        }
    }

    /// Click on a tag shown at the current level, falling back to the flat
    /// tags. Returns false for unknown tags.
    pub fn select_tag(&mut self, tag: &str) -> bool {
        let Some(entry) = self.level_entries().into_iter().find(|e| e.tag == tag) else {
            return self.toggle_flat_tag(tag);
        };
        if entry.has_children {
            self.filters.enter_category(tag);
        } else if !self.filters.tag_path.is_empty() {
            self.filters.select_child(tag);
        } else {
            self.filters.toggle_tag(tag);
        }
        self.refresh();
        true
    }

    /// Toggle a flat tag without touching the drill-down path.
    pub fn toggle_flat_tag(&mut self, tag: &str) -> bool {
        if !self.taxonomy.flat.contains_key(tag) {
            return false;
        }
        self.filters.toggle_tag(tag);
        self.refresh();
        true
    }

    /// Breadcrumb click; `None` returns to the root. Returns false when
    /// `level` is past the end of the current path.
    pub fn breadcrumb(&mut self, level: Option<usize>) -> bool {
        if level.is_some_and(|level| level >= self.filters.tag_path.len()) {
            return false;
        }
        self.filters.truncate_path(level);
        self.refresh();
        true
    }

    pub fn toggle_property(&mut self, property: &str) {
        self.filters.toggle_property(property);
        self.refresh();
    }

    /// Reset the query and every filter.
    pub fn clear(&mut self) {
        self.query.clear();
        self.search.flush();
        self.filters.clear();
        self.refresh();
    }

    /// Whether more cards are waiting to be shown.
    pub fn has_more(&self) -> bool {
        matches!(&self.view, HeadsView::Heads(ids) if self.shown < ids.len())
    }

    /// Render the next page of cards and register their texture slots.
    pub fn next_page(&mut self) -> Option<Page> {
        let HeadsView::Heads(all) = &self.view else {
            return None;
        };
        if self.shown >= all.len() {
            return None;
        }
        let end = (self.shown + self.page_size).min(all.len());
        let ids: Vec<String> = all[self.shown..end].to_vec();
        self.shown = end;

        let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
        let ctx = CardContext {
            catalog: &self.catalog,
            textures: self.textures.as_ref(),
            outcomes: None,
        };
        let (markup, elements) = html::render_cards(&refs, ctx);
        for element in &elements {
            self.loader.observe(element.clone());
        }
        Some(Page {
            pass: self.pass,
            ids,
            html: markup,
            elements,
        })
    }

    /// Report an element as visible; returns it the first time during its pass.
    pub fn notify_visible(&mut self, pass: PassId, key: &str) -> Option<LazyElement> {
        self.loader.notify_visible(pass, key)
    }

    pub fn pending_elements(&self) -> usize {
        self.loader.pending_len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use headsmith_core::{encode_blob, Head};

    fn head(id: &str, tags: &[&str], props: &[&str]) -> Head {
        Head {
            name: Some(format!("&a{id}")),
            tags: tags.iter().map(|s| s.to_string()).collect(),
            properties: props.iter().map(|s| s.to_string()).collect(),
            texture: Some(encode_blob(&format!(
                "http://textures.minecraft.net/texture/{id}"
            ))),
            ..Head::new(id)
        }
    }

    fn session() -> Session {
        let catalog: Catalog = [
            head("oak_a", &["alphabet/oak", "wood"], &["workbench"]),
            head("oak_b", &["alphabet/oak"], &[]),
            head("birch_a", &["alphabet/birch", "wood"], &[]),
            head("barrel", &["storage"], &["workbench"]),
        ]
        .into_iter()
        .collect();
        Session::new(catalog, None, Duration::from_millis(200))
    }

    fn shown(session: &Session) -> Vec<&str> {
        match session.view() {
            HeadsView::Heads(ids) => ids.iter().map(String::as_str).collect(),
            HeadsView::SelectSubcategory => Vec::new(),
        }
    }

    #[test]
    fn starts_with_everything() {
        let session = session();
        assert_eq!(shown(&session).len(), 4);
        assert_eq!(session.counter_text(), "Showing 4 of 4 heads");
        let tags: Vec<_> = session.level_entries().into_iter().map(|e| e.tag).collect();
        assert_eq!(tags, vec!["alphabet", "storage", "wood"]);
    }

    #[test]
    fn search_is_debounced() {
        let mut session = session();
        let start = Instant::now();
        session.input(start, "oa");
        session.input(start + Duration::from_millis(50), "oak");
        assert!(!session.poll(start + Duration::from_millis(200)));
        assert_eq!(shown(&session).len(), 4);
        assert!(session.poll(start + Duration::from_millis(250)));
        assert_eq!(shown(&session), vec!["oak_a", "oak_b"]);
        assert_eq!(session.query(), "oak");
    }

    #[test]
    fn entering_a_category_asks_for_a_child() {
        let mut session = session();
        assert!(session.select_tag("alphabet"));
        assert_eq!(session.view(), &HeadsView::SelectSubcategory);
        assert_eq!(session.counter_text(), "Showing 0 of 4 heads");
        assert!(session.next_page().is_none());

        assert!(session.select_tag("oak"));
        assert_eq!(shown(&session), vec!["oak_a", "oak_b"]);
        assert!(session.is_active("oak"));

        assert!(session.breadcrumb(Some(0)));
        assert_eq!(session.view(), &HeadsView::SelectSubcategory);
        assert!(session.breadcrumb(None));
        assert_eq!(shown(&session).len(), 4);
    }

    #[test]
    fn flat_tags_toggle_and_combine_with_properties() {
        let mut session = session();
        assert!(session.select_tag("wood"));
        assert_eq!(shown(&session), vec!["oak_a", "birch_a"]);
        session.toggle_property("workbench");
        assert_eq!(shown(&session), vec!["oak_a"]);
        assert!(session.select_tag("wood"));
        assert_eq!(shown(&session), vec!["oak_a", "barrel"]);
        assert!(!session.select_tag("missing"));
    }

    #[test]
    fn flat_tags_toggle_inside_a_category() {
        let mut session = session();
        assert!(session.select_tag("alphabet"));
        assert!(session.select_tag("oak"));
        assert!(session.select_tag("wood"));
        assert!(session.filters().tags.contains("wood"));
        assert_eq!(session.filters().tag_path, vec!["alphabet", "oak"]);
        assert_eq!(shown(&session), vec!["oak_a"]);
        assert!(session.is_active("wood"));

        assert!(session.toggle_flat_tag("wood"));
        assert_eq!(shown(&session), vec!["oak_a", "oak_b"]);
        assert!(!session.toggle_flat_tag("oak"));
    }

    #[test]
    fn breadcrumb_rejects_levels_past_the_path() {
        let mut session = session();
        assert!(session.select_tag("alphabet"));
        assert!(session.select_tag("oak"));
        let pass = session.pass();
        assert!(!session.breadcrumb(Some(usize::MAX)));
        assert!(!session.breadcrumb(Some(2)));
        assert_eq!(session.filters().tag_path, vec!["alphabet", "oak"]);
        assert_eq!(session.pass(), pass);
        assert!(session.breadcrumb(Some(1)));
        assert_eq!(shown(&session), vec!["oak_a", "oak_b"]);
    }

    #[test]
    fn clear_resets_query_and_filters() {
        let mut session = session();
        session.input(Instant::now(), "barrel");
        session.flush_search();
        session.toggle_property("workbench");
        session.clear();
        assert_eq!(session.query(), "");
        assert!(session.filters().is_empty());
        assert_eq!(shown(&session).len(), 4);
    }

    #[test]
    fn pages_register_elements_for_the_current_pass() {
        let mut session = session().with_page_size(3);
        let first = session.next_page().unwrap();
        assert_eq!(first.ids, vec!["oak_a", "oak_b", "birch_a"]);
        assert_eq!(first.elements.len(), 3);
        assert!(session.has_more());
        let second = session.next_page().unwrap();
        assert_eq!(second.ids, vec!["barrel"]);
        assert!(session.next_page().is_none());
        assert_eq!(session.pending_elements(), 4);

        assert!(session.notify_visible(first.pass, "oak_a:0").is_some());
        assert!(session.notify_visible(first.pass, "oak_a:0").is_none());

        session.toggle_property("workbench");
        assert_eq!(session.pending_elements(), 0);
        assert!(session.notify_visible(first.pass, "oak_b:0").is_none());
    }
}
