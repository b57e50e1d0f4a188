use indexmap::IndexMap;
use serde::Deserialize;
use tracing::{debug, info, warn};

use headsmith_core::{Catalog, Head, Provenance};

use crate::manifest::{HeadCounts, PluginConfig};
use crate::{AssetError, AssetSource};

/// Default manifest path below the resources root.
pub const MANIFEST_PATH: &str = "config.yml";
/// Default head count path below the resources root.
pub const HEAD_COUNT_PATH: &str = "head-count.json";

/// Snapshot of loading progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadProgress {
    /// Estimated heads downloaded so far (from `head-count.json`).
    pub downloaded: usize,
    /// Heads parsed and merged so far.
    pub parsed: usize,
    /// Estimated total.
    pub total: usize,
}

/// A head file that could not be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFailure {
    /// Manifest entry.
    pub file: String,
    /// Human readable reason.
    pub reason: String,
}

/// Outcome of a catalog load.
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Merged catalog.
    pub catalog: Catalog,
    /// Files that were listed but failed to fetch or parse.
    pub failures: Vec<FileFailure>,
    /// Files skipped through `excluded-tags`.
    pub skipped_files: Vec<String>,
    /// Heads skipped through `excluded-heads`.
    pub excluded_heads: usize,
    /// Ids defined more than once; the later definition won.
    pub duplicates: Vec<String>,
    /// Files parsed successfully.
    pub files_loaded: usize,
}

#[derive(Deserialize)]
struct HeadFile {
    #[serde(default)]
    heads: Option<IndexMap<String, Head>>,
}

/// Parse one head file into heads in file order.
///
/// `id` and `source` are filled in; a file without a `heads` mapping yields
/// nothing.
pub fn parse_head_file(file: &str, text: &str) -> Result<Vec<Head>, serde_yaml::Error> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    let parsed: HeadFile = serde_yaml::from_str(text)?;
    let Some(heads) = parsed.heads else {
        warn!(file, "head file has no `heads` section");
        return Ok(Vec::new());
    };
    Ok(heads
        .into_iter()
        .map(|(id, mut head)| {
            head.source = Some(Provenance {
                file: file.to_string(),
                line: find_yaml_line(text, &id),
            });
            head.id = id;
            head
        })
        .collect())
}

/// 1-based line of the first `"  <id>:"` entry, or 1 when absent.
///
/// This is a textual scan, not a YAML position; ids quoted or indented
/// differently fall back to 1.
pub fn find_yaml_line(text: &str, id: &str) -> usize {
    text.lines()
        .position(|line| {
            line.strip_prefix("  ")
                .and_then(|rest| rest.strip_prefix(id))
                .is_some_and(|rest| rest.starts_with(':'))
        })
        .map(|idx| idx + 1)
        .unwrap_or(1)
}

/// Loads the manifest and every listed head file into one [`Catalog`].
pub struct CatalogLoader<'a> {
    source: &'a dyn AssetSource,
    manifest_path: String,
    counts_path: Option<String>,
}

impl<'a> CatalogLoader<'a> {
    /// Loader reading `config.yml` and `head-count.json` from `source`.
    pub fn new(source: &'a dyn AssetSource) -> Self {
        Self {
            source,
            manifest_path: MANIFEST_PATH.to_string(),
            counts_path: Some(HEAD_COUNT_PATH.to_string()),
        }
    }

    /// Override the manifest location.
    pub fn with_manifest(mut self, path: impl Into<String>) -> Self {
        self.manifest_path = path.into();
        self
    }

    /// Override (or disable) the head count location.
    pub fn with_head_counts(mut self, path: Option<String>) -> Self {
        self.counts_path = path;
        self
    }

    async fn head_counts(&self) -> HeadCounts {
        let Some(path) = &self.counts_path else {
            return HeadCounts::default();
        };
        match self.source.fetch_text(path).await {
            Ok(text) => HeadCounts::from_json(&text).unwrap_or_else(|err| {
                warn!(%path, %err, "invalid head counts, using default total");
                HeadCounts::default()
            }),
            Err(err) => {
                debug!(%err, "no head counts available");
                HeadCounts::default()
            }
        }
    }

    /// Fetch and merge every head file, reporting progress after each
    /// download and after each parse.
    ///
    /// Files are processed sequentially in manifest order. A manifest that
    /// cannot be fetched or parsed is fatal; individual head files are not.
    pub async fn load(
        &self,
        mut on_progress: impl FnMut(LoadProgress) + Send,
    ) -> Result<LoadReport, AssetError> {
        let counts = self.head_counts().await;
        let mut progress = LoadProgress {
            downloaded: 0,
            parsed: 0,
            total: counts.total,
        };
        on_progress(progress);

        let manifest_text = self
            .source
            .fetch_text(&self.manifest_path)
            .await
            .map_err(AssetError::Manifest)?;
        let config =
            PluginConfig::from_yaml(&manifest_text).map_err(|source| AssetError::Yaml {
                path: self.manifest_path.clone(),
                source,
            })?;

        let mut report = LoadReport::default();
        for file in config.head_files() {
            if config.is_file_excluded(&file) {
                info!(%file, "skipping excluded head file");
                report.skipped_files.push(file);
                continue;
            }

            let text = match self.source.fetch_text(&file).await {
                Ok(text) => text,
                Err(err) => {
                    warn!(%file, %err, "failed to fetch head file");
                    report.failures.push(FileFailure {
                        file,
                        reason: err.to_string(),
                    });
                    continue;
                }
            };
            progress.downloaded += counts.for_file(&file);
            on_progress(progress);

            let heads = match parse_head_file(&file, &text) {
                Ok(heads) => heads,
                Err(err) => {
                    warn!(%file, %err, "failed to parse head file");
                    report.failures.push(FileFailure {
                        file,
                        reason: err.to_string(),
                    });
                    continue;
                }
            };

            for head in heads {
                if config.is_head_excluded(&head.id) {
                    report.excluded_heads += 1;
                    continue;
                }
                let id = head.id.clone();
                if let Some(previous) = report.catalog.insert(head) {
                    let earlier = previous.source.map(|s| s.file).unwrap_or_default();
                    warn!(%id, %earlier, later = %file, "duplicate head id, later definition wins");
                    report.duplicates.push(id);
                }
                progress.parsed += 1;
            }
            report.files_loaded += 1;
            on_progress(progress);
        }

        info!(
            heads = report.catalog.len(),
            files = report.files_loaded,
            failed = report.failures.len(),
            "catalog loaded"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_numbers_are_best_effort() {
        let text = "heads:\n  alpha:\n    name: A\n  beta:\n    name: B\n";
        assert_eq!(find_yaml_line(text, "alpha"), 2);
        assert_eq!(find_yaml_line(text, "beta"), 4);
        assert_eq!(find_yaml_line(text, "gamma"), 1);
        assert_eq!(find_yaml_line(text, "alp"), 1);
    }

    #[test]
    fn parses_heads_in_file_order() {
        let text = "heads:\n  zulu:\n    name: Z\n  alpha:\n    tags: [storage]\n";
        let heads = parse_head_file("heads.yml", text).unwrap();
        let ids: Vec<_> = heads.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["zulu", "alpha"]);
        let source = heads[1].source.as_ref().unwrap();
        assert_eq!(source.file, "heads.yml");
        assert_eq!(source.line, 4);
    }

    #[test]
    fn missing_heads_section_is_empty() {
        assert!(parse_head_file("a.yml", "other: 1\n").unwrap().is_empty());
        assert!(parse_head_file("a.yml", "").unwrap().is_empty());
        assert!(parse_head_file("a.yml", "heads: [not, a, map]\n").is_err());
    }
}
