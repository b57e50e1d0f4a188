//! Visibility-driven texture loading.
//!
//! Elements are registered against the current render pass. The first time
//! an element is reported visible it is handed back exactly once for loading;
//! starting a new pass drops everything still pending, and notifications that
//! carry an older pass id are ignored.

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::HeadRenderer;

/// The kind of element waiting for a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    /// Large head render on a catalog card.
    HeadTexture,
    /// Head used as a recipe ingredient.
    HeadIcon,
    /// Head listed in a drop table.
    DropHeadIcon,
    /// Material icon whose URL is already known.
    LazyImage,
}

impl ElementKind {
    /// Display size `(width, height)` in CSS pixels for head renders.
    pub fn display_size(self) -> Option<(u32, u32)> {
        match self {
            ElementKind::HeadTexture => Some((92, 108)),
            ElementKind::HeadIcon => Some((46, 54)),
            ElementKind::DropHeadIcon => Some((28, 32)),
            ElementKind::LazyImage => None,
        }
    }

    /// Text shown in place of an image that failed to load.
    pub fn error_text(self) -> &'static str {
        match self {
            ElementKind::HeadTexture => "Failed to load",
            _ => "?",
        }
    }

    /// Whether a failed load also marks the element as a placeholder.
    pub fn adds_placeholder(self) -> bool {
        self == ElementKind::HeadTexture
    }

    /// CSS class of the element's container.
    pub fn css_class(self) -> &'static str {
        match self {
            ElementKind::HeadTexture => "head-texture-container",
            ElementKind::HeadIcon => "head-icon-container",
            ElementKind::DropHeadIcon => "drop-head-icon-container",
            ElementKind::LazyImage => "lazy-img",
        }
    }
}

/// An element registered for lazy loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LazyElement {
    /// Unique element key within a pass.
    pub key: String,
    /// Element kind.
    pub kind: ElementKind,
    /// Texture blob for heads, icon URL for lazy images; `None` when the
    /// head has no texture.
    pub data: Option<String>,
}

/// Identity of a render pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PassId(u64);

/// Result of loading an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Show `src` at the given size (natural size when `None`).
    Image {
        /// Image source (data URL or remote URL).
        src: String,
        /// Display size.
        size: Option<(u32, u32)>,
    },
    /// Show `text` instead of an image.
    Failed {
        /// Replacement text.
        text: &'static str,
        /// Mark the container as a placeholder.
        placeholder: bool,
    },
    /// Nothing to load.
    Skipped,
}

/// Tracks which elements of the current pass still wait to become visible.
#[derive(Debug, Default)]
pub struct VisibilityLoader {
    pass: u64,
    pending: IndexMap<String, LazyElement>,
}

impl VisibilityLoader {
    /// Create a loader with no active elements.
    pub fn new() -> Self {
        Self::default()
    }

    /// Disconnect the previous pass and start a new one.
    pub fn begin_pass(&mut self) -> PassId {
        self.disconnect();
        self.pass += 1;
        debug!(pass = self.pass, "render pass started");
        PassId(self.pass)
    }

    /// Current pass id.
    pub fn current_pass(&self) -> PassId {
        PassId(self.pass)
    }

    /// Stop observing every pending element.
    pub fn disconnect(&mut self) {
        if !self.pending.is_empty() {
            trace!(dropped = self.pending.len(), "disconnecting pending elements");
        }
        self.pending.clear();
    }

    /// Register an element in the current pass.
    pub fn observe(&mut self, element: LazyElement) {
        self.pending.insert(element.key.clone(), element);
    }

    /// Number of elements still waiting.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Keys of pending elements in registration order.
    pub fn pending_keys(&self) -> impl Iterator<Item = &str> {
        self.pending.keys().map(String::as_str)
    }

    /// Report that `key` became visible during `pass`.
    ///
    /// Returns the element the first time it is reported in the current
    /// pass; repeats and stale passes return `None`.
    pub fn notify_visible(&mut self, pass: PassId, key: &str) -> Option<LazyElement> {
        if pass.0 != self.pass {
            trace!(stale = pass.0, current = self.pass, key, "ignoring stale visibility");
            return None;
        }
        self.pending.shift_remove(key)
    }
}

/// Load the texture for a visible element.
pub async fn load_element(renderer: &mut HeadRenderer, element: &LazyElement) -> LoadOutcome {
    let Some(data) = element.data.as_deref() else {
        return LoadOutcome::Skipped;
    };
    if element.kind == ElementKind::LazyImage {
        return LoadOutcome::Image {
            src: data.to_string(),
            size: None,
        };
    }
    match renderer.cached_isometric_head(data).await {
        Ok(src) => LoadOutcome::Image {
            src,
            size: element.kind.display_size(),
        },
        Err(_) => LoadOutcome::Failed {
            text: element.kind.error_text(),
            placeholder: element.kind.adds_placeholder(),
        },
    }
}
