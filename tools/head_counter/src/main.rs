use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use clap::Parser;
use headsmith_assets::{parse_head_file, HeadCounts, PluginConfig, HEAD_COUNT_PATH, MANIFEST_PATH};
use tracing::{info, warn};
use walkdir::WalkDir;

#[derive(Parser, Debug)]
#[command(author, version, about = "Head count generator for HeadSmith catalogs", long_about = None)]
struct Args {
    /// Plugin resources directory (the one holding config.yml)
    #[arg(short, long)]
    resources: PathBuf,

    /// Walk this subdirectory for head files instead of reading the
    /// `head-files` list from config.yml
    #[arg(long, value_name = "DIR", num_args = 0..=1, default_missing_value = "heads")]
    scan: Option<String>,

    /// Output path (default: <resources>/head-count.json)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Fail instead of skipping files that do not parse
    #[arg(long)]
    strict: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    run(args)
}

fn run(args: Args) -> Result<()> {
    if !args.resources.is_dir() {
        bail!("Resources path {:?} is not a directory", args.resources);
    }
    let files = match &args.scan {
        Some(dir) => scan_head_files(&args.resources, dir),
        None => listed_head_files(&args.resources)?,
    };
    let counts = count_heads(&args.resources, &files, args.strict)?;
    if counts.files.is_empty() {
        bail!("No head files found under {}", args.resources.display());
    }

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| args.resources.join(HEAD_COUNT_PATH));
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {parent:?}"))?;
        }
    }
    let json = serde_json::to_string_pretty(&counts)?;
    fs::write(&output, json)
        .with_context(|| format!("Failed to write head counts to {}", output.display()))?;

    println!(
        "Counted {} heads in {} files",
        counts.total,
        counts.files.len()
    );
    println!("Head counts written to {}", output.display());
    Ok(())
}

/// Files named by the manifest's `head-files` list, in manifest order.
fn listed_head_files(resources: &Path) -> Result<Vec<String>> {
    let path = resources.join(MANIFEST_PATH);
    let text = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let manifest = PluginConfig::from_yaml(&text)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(manifest.head_files())
}

/// Every `.yml`/`.yaml` file under `resources/heads_dir`, sorted by path.
fn scan_head_files(resources: &Path, heads_dir: &str) -> Vec<String> {
    WalkDir::new(resources.join(heads_dir))
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file() && is_head_file(entry.path()))
        .map(|entry| manifest_name(entry.path(), resources))
        .collect()
}

fn count_heads(resources: &Path, files: &[String], strict: bool) -> Result<HeadCounts> {
    let mut counts = BTreeMap::new();

    for name in files {
        let path = resources.join(name);
        if !path.is_file() {
            warn!(file = %name, "listed head file does not exist, skipping");
            continue;
        }
        let text = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        match parse_head_file(name, &text) {
            Ok(heads) => {
                info!(file = %name, heads = heads.len(), "counted");
                counts.insert(name.clone(), heads.len());
            }
            Err(err) if strict => bail!("Failed to parse {}: {err}", path.display()),
            Err(err) => warn!(file = %name, %err, "skipping unparsable head file"),
        }
    }

    Ok(HeadCounts::from_files(counts))
}

fn is_head_file(path: &Path) -> bool {
    matches!(
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase()),
        Some(ext) if matches!(ext.as_str(), "yml" | "yaml")
    )
}

/// Path as listed in `config.yml`: relative to the resources root, `/`-separated.
fn manifest_name(path: &Path, root: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    let mut name = rel.to_string_lossy().replace('\\', "/");
    if name.starts_with("./") {
        name = name.replacen("./", "", 1);
    }
    if name.starts_with('/') {
        name.remove(0);
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resources() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let heads = dir.path().join("heads/decor");
        fs::create_dir_all(&heads).unwrap();
        fs::write(
            dir.path().join("heads/alphabet.yml"),
            "heads:\n  a:\n    name: A\n  b:\n    name: B\n",
        )
        .unwrap();
        fs::write(heads.join("lamps.yaml"), "heads:\n  lamp:\n    name: Lamp\n").unwrap();
        fs::write(heads.join("unlisted.yml"), "heads:\n  u: {}\n  v: {}\n").unwrap();
        fs::write(heads.join("notes.txt"), "ignored").unwrap();
        fs::write(heads.join("broken.yml"), "heads: [").unwrap();
        fs::write(
            dir.path().join(MANIFEST_PATH),
            "head-files:\n  - heads/alphabet.yml\n  - heads/decor/lamps.yaml\n  - heads/decor/broken.yml\n  - heads/missing.yml\n",
        )
        .unwrap();
        dir
    }

    #[test]
    fn counts_only_files_listed_in_the_manifest() {
        let dir = resources();
        let files = listed_head_files(dir.path()).unwrap();
        assert_eq!(files.len(), 4);

        let counts = count_heads(dir.path(), &files, false).unwrap();
        assert_eq!(counts.total, 3);
        assert_eq!(counts.for_file("heads/alphabet.yml"), 2);
        assert_eq!(counts.for_file("heads/decor/lamps.yaml"), 1);
        assert!(!counts.files.contains_key("heads/decor/unlisted.yml"));
        assert!(!counts.files.contains_key("heads/decor/broken.yml"));
        assert!(!counts.files.contains_key("heads/missing.yml"));

        assert!(count_heads(dir.path(), &files, true).is_err());
    }

    #[test]
    fn scan_walks_every_head_file_by_manifest_path() {
        let dir = resources();
        let files = scan_head_files(dir.path(), "heads");
        assert_eq!(
            files,
            vec![
                "heads/alphabet.yml",
                "heads/decor/broken.yml",
                "heads/decor/lamps.yaml",
                "heads/decor/unlisted.yml",
            ]
        );
        let counts = count_heads(dir.path(), &files, false).unwrap();
        assert_eq!(counts.total, 5);
        assert_eq!(counts.for_file("heads/decor/unlisted.yml"), 2);
    }

    #[test]
    fn missing_manifest_is_an_error_unless_scanning() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("heads")).unwrap();
        fs::write(dir.path().join("heads/x.yml"), "heads:\n  x: {}\n").unwrap();

        let args = |scan: Option<&str>| Args {
            resources: dir.path().to_path_buf(),
            scan: scan.map(str::to_string),
            output: None,
            strict: false,
        };
        assert!(run(args(None)).is_err());
        run(args(Some("heads"))).unwrap();

        let written = fs::read_to_string(dir.path().join(HEAD_COUNT_PATH)).unwrap();
        let counts = HeadCounts::from_json(&written).unwrap();
        assert_eq!(counts.total, 1);
        assert_eq!(counts.for_file("heads/x.yml"), 1);
    }

    #[test]
    fn writes_json_next_to_resources() {
        let dir = resources();
        run(Args {
            resources: dir.path().to_path_buf(),
            scan: None,
            output: None,
            strict: false,
        })
        .unwrap();

        let written = fs::read_to_string(dir.path().join(HEAD_COUNT_PATH)).unwrap();
        let counts = HeadCounts::from_json(&written).unwrap();
        assert_eq!(counts.total, 3);
    }

    #[test]
    fn scan_flag_defaults_to_heads_dir() {
        let args = Args::try_parse_from(["head_counter", "-r", "res", "--scan"]).unwrap();
        assert_eq!(args.scan.as_deref(), Some("heads"));
        let args = Args::try_parse_from(["head_counter", "-r", "res"]).unwrap();
        assert_eq!(args.scan, None);
    }
}
