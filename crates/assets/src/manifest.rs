//! Plugin manifest (`config.yml`) and per-file head counts (`head-count.json`).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Head file loaded when the manifest lists none.
pub const DEFAULT_HEAD_FILE: &str = "heads.yml";
/// Progress denominator used when `head-count.json` is missing or has no total.
pub const DEFAULT_TOTAL_HEADS: usize = 5000;

/// The subset of the plugin's `config.yml` the catalog cares about.
///
/// Unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PluginConfig {
    /// Head definition files, relative to the resources root.
    pub head_files: Option<Vec<String>>,
    /// Head ids that are never loaded.
    pub excluded_heads: Vec<String>,
    /// File tags whose files are skipped (a parent excludes its children).
    pub excluded_tags: Vec<String>,
}

impl PluginConfig {
    /// Parse `config.yml`.
    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        // An empty document means "all defaults".
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text)
    }

    /// Files to load in order, defaulting to [`DEFAULT_HEAD_FILE`].
    pub fn head_files(&self) -> Vec<String> {
        match &self.head_files {
            Some(files) => files.clone(),
            None => vec![DEFAULT_HEAD_FILE.to_string()],
        }
    }

    /// Returns true when `id` is listed in `excluded-heads`.
    pub fn is_head_excluded(&self, id: &str) -> bool {
        self.excluded_heads.iter().any(|h| h == id)
    }

    /// Returns true when a head file is excluded through its file tag.
    pub fn is_file_excluded(&self, path: &str) -> bool {
        let tag = file_tag(path);
        self.excluded_tags.iter().any(|excluded| {
            let excluded = excluded.trim_matches('/');
            !excluded.is_empty()
                && (tag == excluded
                    || tag
                        .strip_prefix(excluded)
                        .is_some_and(|rest| rest.starts_with('/')))
        })
    }
}

/// Tag implied by a head file path: `heads/decor/lamps.yml` -> `decor/lamps`.
pub fn file_tag(path: &str) -> &str {
    let path = path.strip_prefix("heads/").unwrap_or(path);
    path.strip_suffix(".yml").unwrap_or(path)
}

/// Per-file head counts used to estimate load progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadCounts {
    /// Head file -> number of heads in it.
    #[serde(flatten)]
    pub files: BTreeMap<String, usize>,
    /// Total heads across all files.
    #[serde(default)]
    pub total: usize,
}

impl Default for HeadCounts {
    fn default() -> Self {
        Self {
            files: BTreeMap::new(),
            total: DEFAULT_TOTAL_HEADS,
        }
    }
}

impl HeadCounts {
    /// Parse `head-count.json`; a zero or missing total becomes [`DEFAULT_TOTAL_HEADS`].
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        let mut counts: HeadCounts = serde_json::from_str(text)?;
        if counts.total == 0 {
            counts.total = DEFAULT_TOTAL_HEADS;
        }
        Ok(counts)
    }

    /// Build counts from scanned files; `total` is their sum.
    pub fn from_files(files: BTreeMap<String, usize>) -> Self {
        let total = files.values().sum();
        Self { files, total }
    }

    /// Expected heads in `file` (0 when unknown).
    pub fn for_file(&self, file: &str) -> usize {
        self.files.get(file).copied().unwrap_or(0)
    }
}
