//! Subcommand implementations.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use headsmith_assets::{AssetSource, CatalogLoader, LoadProgress, LoadReport, TextureIndex};
use headsmith_core::{
    check_catalog, filter_heads, property_counts, strip_color_codes, FilterState, GridItem,
    TagTaxonomy, ToolCategory,
};
use headsmith_render::{load_element, HeadRenderer, LoadOutcome, TextureCache, MAX_RENDER_SIZE};
use serde_json::json;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

use crate::commands::{self, execute_command, parse_command, show_results, CommandOutput};
use crate::config::{CatalogConfig, DEFAULT_CONFIG_PATH};
use crate::session::{Page, Session};
use crate::site;

#[derive(Debug, Parser)]
#[command(name = "headsmith", version, about = "Browse and publish the HeadSmith head catalog")]
pub struct Cli {
    /// Catalog configuration file.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List heads matching a query and filters.
    Search(SearchArgs),
    /// List tags at a drill-down level, plus properties.
    Tags {
        /// Category to drill into.
        #[arg(long)]
        category: Option<String>,
    },
    /// Render a head's isometric texture.
    Render {
        id: String,
        /// Write a PNG here instead of printing a data URL.
        #[arg(long)]
        out: Option<PathBuf>,
        /// Override the configured render size.
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=MAX_RENDER_SIZE as i64))]
        size: Option<u32>,
    },
    /// Write the static catalog page.
    Build {
        #[arg(long, default_value = "site")]
        out: PathBuf,
        /// Render head textures and inline them into the page.
        #[arg(long)]
        textures: bool,
    },
    /// Validate the catalog; exits non-zero when problems are found.
    Check,
    /// Find the head crafted from a grid, row-major. Use `-` for empty
    /// slots and `head:<id>` for heads.
    Craft {
        #[arg(required = true, num_args = 1..=9)]
        slots: Vec<String>,
        /// Treat the single slot as a stonecutter input.
        #[arg(long)]
        stonecutter: bool,
    },
    /// Show what a placed head drops when broken.
    Drops {
        id: String,
        #[arg(long)]
        silk_touch: bool,
        /// Held tool: a category (`pickaxe`) or material (`DIAMOND_PICKAXE`).
        #[arg(long)]
        tool: Option<String>,
    },
    /// Interactive search and filtering on stdin.
    Browse,
    /// Write a catalog configuration with every default spelled out.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Case-insensitive text matched against id, name, tags and lore.
    #[arg(default_value = "")]
    pub query: String,
    /// Flat tag filter; repeat to require several.
    #[arg(long = "tag")]
    pub tags: Vec<String>,
    /// Hierarchical path such as `alphabet/oak`.
    #[arg(long)]
    pub path: Option<String>,
    #[arg(long)]
    pub property: Option<String>,
    /// Only the head whose skin has this texture id (last URL segment).
    #[arg(long)]
    pub texture: Option<String>,
    /// Print JSON instead of text.
    #[arg(long)]
    pub json: bool,
}

pub async fn run(cli: Cli) -> Result<()> {
    if let Command::Init { force } = cli.command {
        return init(&cli.config, force);
    }
    let cfg = CatalogConfig::load_from_path(&cli.config);
    let source = cfg.asset_source()?;

    match cli.command {
        Command::Search(args) => search(&cfg, source, args).await,
        Command::Tags { category } => tags(&cfg, source, category).await,
        Command::Render { id, out, size } => render(&cfg, source, &id, out, size).await,
        Command::Build { out, textures } => build(&cfg, source, &out, textures).await,
        Command::Check => check(&cfg, source).await,
        Command::Craft { slots, stonecutter } => craft(&cfg, source, &slots, stonecutter).await,
        Command::Drops {
            id,
            silk_touch,
            tool,
        } => drops(&cfg, source, &id, silk_touch, tool.as_deref()).await,
        Command::Browse => browse(&cfg, source).await,
        Command::Init { .. } => Ok(()),
    }
}

fn init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists; pass --force to overwrite", path.display());
    }
    CatalogConfig::default().save_to_path(path)?;
    println!("{}", path.display());
    Ok(())
}

async fn load_catalog(cfg: &CatalogConfig, source: &dyn AssetSource) -> Result<LoadReport> {
    let started = Instant::now();
    let report = CatalogLoader::new(source)
        .with_manifest(cfg.manifest.as_str())
        .with_head_counts(cfg.head_counts_path())
        .load(|progress: LoadProgress| {
            debug!(
                downloaded = progress.downloaded,
                parsed = progress.parsed,
                total = progress.total,
                "loading heads"
            );
        })
        .await
        .with_context(|| format!("failed to load catalog from {}", cfg.resources))?;
    info!(
        heads = report.catalog.len(),
        files = report.files_loaded,
        failed = report.failures.len(),
        ms = started.elapsed().as_millis() as u64,
        "catalog loaded"
    );
    Ok(report)
}

async fn texture_index(cfg: &CatalogConfig, source: &dyn AssetSource) -> Option<TextureIndex> {
    if !cfg.textures.enabled {
        return None;
    }
    Some(TextureIndex::load(source, &cfg.texture_locations()).await)
}

fn head_renderer(cfg: &CatalogConfig, source: Arc<dyn AssetSource>) -> HeadRenderer {
    let cache = TextureCache::load(&cfg.cache.path, cfg.cache.capacity);
    HeadRenderer::new(source, cache)
        .with_proxy(cfg.proxy())
        .with_size(cfg.render.size)
}

fn save_cache(cfg: &CatalogConfig, renderer: HeadRenderer) {
    if let Err(err) = renderer.into_cache().save(&cfg.cache.path) {
        warn!(path = %cfg.cache.path.display(), %err, "failed to save texture cache");
    }
}

async fn search(cfg: &CatalogConfig, source: Arc<dyn AssetSource>, args: SearchArgs) -> Result<()> {
    let report = load_catalog(cfg, source.as_ref()).await?;
    let catalog = &report.catalog;

    let mut filters = FilterState::default();
    for tag in &args.tags {
        filters.toggle_tag(tag);
    }
    if let Some(path) = &args.path {
        filters.tag_path = path.split('/').filter(|s| !s.is_empty()).map(str::to_string).collect();
    }
    if let Some(property) = &args.property {
        filters.toggle_property(property);
    }
    let mut ids = filter_heads(catalog, &filters, &args.query);
    if let Some(texture) = &args.texture {
        let owners = catalog.texture_ids();
        let owner = owners.get(texture).map(String::as_str);
        ids.retain(|id| Some(*id) == owner);
    }

    if args.json {
        let entries: Vec<_> = ids
            .iter()
            .filter_map(|id| catalog.get(id))
            .map(|head| {
                json!({
                    "id": head.id,
                    "name": strip_color_codes(head.display_name()),
                    "tags": head.tags,
                    "properties": head.properties,
                    "source": head.source.as_ref().map(|s| format!("{}:{}", s.file, s.line)),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    println!("{}", crate::html::counter_text(ids.len(), catalog.len()));
    for id in ids {
        let name = catalog
            .get(id)
            .map(|h| strip_color_codes(h.display_name()))
            .unwrap_or_default();
        println!("{id}\t{name}");
    }
    Ok(())
}

async fn tags(
    cfg: &CatalogConfig,
    source: Arc<dyn AssetSource>,
    category: Option<String>,
) -> Result<()> {
    let report = load_catalog(cfg, source.as_ref()).await?;
    let taxonomy = TagTaxonomy::build(report.catalog.heads());
    let path: Vec<String> = category.into_iter().collect();
    if let Some(parent) = path.first() {
        if !taxonomy.is_category(parent) {
            bail!("'{parent}' is not a tag category");
        }
    }
    for entry in taxonomy.tags_at_level(&path) {
        let suffix = if entry.has_children { "/" } else { "" };
        println!("{}{suffix}\t{}", entry.tag, entry.count);
    }
    let properties = property_counts(report.catalog.heads());
    if !properties.is_empty() {
        println!();
        println!("Properties:");
        for (property, count) in properties {
            println!("{property}\t{count}");
        }
    }
    Ok(())
}

async fn render(
    cfg: &CatalogConfig,
    source: Arc<dyn AssetSource>,
    id: &str,
    out: Option<PathBuf>,
    size: Option<u32>,
) -> Result<()> {
    let report = load_catalog(cfg, source.as_ref()).await?;
    let head = report
        .catalog
        .get(id)
        .with_context(|| format!("unknown head '{id}'"))?;
    let Some(blob) = head.texture_blob() else {
        bail!("head '{id}' has no texture");
    };

    let mut renderer = head_renderer(cfg, source.clone());
    if let Some(size) = size {
        renderer = renderer.with_size(size);
    }
    match out {
        Some(path) => {
            let image = renderer
                .render(blob)
                .await
                .with_context(|| format!("failed to render '{id}'"))?;
            image
                .save_with_format(&path, image::ImageFormat::Png)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("{}", path.display());
        }
        None => {
            let data_url = renderer
                .cached_isometric_head(blob)
                .await
                .with_context(|| format!("failed to render '{id}'"))?;
            save_cache(cfg, renderer);
            println!("{data_url}");
        }
    }
    Ok(())
}

async fn build(
    cfg: &CatalogConfig,
    source: Arc<dyn AssetSource>,
    out: &Path,
    prerender: bool,
) -> Result<()> {
    let report = load_catalog(cfg, source.as_ref()).await?;
    let catalog = &report.catalog;
    let textures = texture_index(cfg, source.as_ref()).await;

    let (mut page, elements) = site::render_index(catalog, textures.as_ref(), None);
    if prerender && !elements.is_empty() {
        let mut renderer = head_renderer(cfg, source.clone());
        let mut outcomes: HashMap<String, LoadOutcome> = HashMap::with_capacity(elements.len());
        let mut failed = 0;
        for element in &elements {
            let outcome = load_element(&mut renderer, element).await;
            if matches!(outcome, LoadOutcome::Failed { .. }) {
                failed += 1;
            }
            outcomes.insert(element.key.clone(), outcome);
        }
        save_cache(cfg, renderer);
        if failed > 0 {
            warn!(failed, total = elements.len(), "some textures failed to render");
        }
        page = site::render_index(catalog, textures.as_ref(), Some(&outcomes)).0;
    }

    let files = site::write_site(out, &page, catalog)?;
    println!("{}", files.index.display());
    Ok(())
}

async fn check(cfg: &CatalogConfig, source: Arc<dyn AssetSource>) -> Result<()> {
    let report = load_catalog(cfg, source.as_ref()).await?;
    let issues = check_catalog(&report.catalog);

    for failure in &report.failures {
        println!("{}: {}", failure.file, failure.reason);
    }
    for id in &report.duplicates {
        println!("{id}: defined more than once (last definition wins)");
    }
    for issue in &issues {
        println!("{issue}");
    }

    let problems = report.failures.len() + issues.len();
    if problems > 0 {
        bail!(
            "{problems} problem(s) in {} heads",
            report.catalog.len()
        );
    }
    println!("{} heads OK", report.catalog.len());
    Ok(())
}

fn parse_slot(slot: &str) -> Option<GridItem> {
    match slot.trim() {
        "" | "-" | "_" => None,
        s => Some(match s.strip_prefix("head:") {
            Some(id) => GridItem::Head(id.to_string()),
            None => GridItem::Material(s.to_string()),
        }),
    }
}

async fn craft(
    cfg: &CatalogConfig,
    source: Arc<dyn AssetSource>,
    slots: &[String],
    stonecutter: bool,
) -> Result<()> {
    let report = load_catalog(cfg, source.as_ref()).await?;
    let catalog = &report.catalog;

    if stonecutter {
        let [slot] = slots else {
            bail!("the stonecutter takes exactly one item");
        };
        let Some(item) = parse_slot(slot) else {
            bail!("the stonecutter input is empty");
        };
        let matches = catalog.find_stonecutting(&item);
        if matches.is_empty() {
            bail!("no stonecutter recipe accepts {slot}");
        }
        for (head, recipe) in matches {
            println!("{}\t{} x{}", recipe.id(&head.id), head.id, recipe.amount());
        }
        return Ok(());
    }

    if slots.len() != 4 && slots.len() != 9 {
        bail!("a crafting grid has 4 or 9 slots, got {}", slots.len());
    }
    let grid: Vec<Option<GridItem>> = slots.iter().map(|s| parse_slot(s)).collect();
    match catalog.find_crafting(&grid) {
        Some((head, recipe)) => {
            println!("{}\t{} x{}", recipe.id(&head.id), head.id, recipe.amount());
            Ok(())
        }
        None => bail!("no recipe matches this grid"),
    }
}

async fn drops(
    cfg: &CatalogConfig,
    source: Arc<dyn AssetSource>,
    id: &str,
    silk_touch: bool,
    tool: Option<&str>,
) -> Result<()> {
    let report = load_catalog(cfg, source.as_ref()).await?;
    let head = report
        .catalog
        .get(id)
        .with_context(|| format!("unknown head '{id}'"))?;
    let tool = match tool {
        Some(name) => Some(
            ToolCategory::parse(name)
                .or_else(|| ToolCategory::from_material(name))
                .with_context(|| format!("unknown tool '{name}'"))?,
        ),
        None => None,
    };
    for spec in head.drops_for(silk_touch, tool) {
        let item = spec
            .material
            .clone()
            .or_else(|| spec.head.as_ref().map(|h| format!("head:{h}")))
            .unwrap_or_default();
        println!("{}x {item}", spec.count());
    }
    Ok(())
}

async fn browse(cfg: &CatalogConfig, source: Arc<dyn AssetSource>) -> Result<()> {
    let report = load_catalog(cfg, source.as_ref()).await?;
    let textures = texture_index(cfg, source.as_ref()).await;
    let mut renderer = cfg
        .browse
        .load_textures
        .then(|| head_renderer(cfg, source.clone()));
    let mut session = Session::new(report.catalog, textures, cfg.debounce())
        .with_page_size(cfg.browse.page_size);

    for line in commands::help_lines() {
        println!("{line}");
    }
    let mut out = CommandOutput::default();
    show_results(&mut session, &mut out);
    emit(&mut session, renderer.as_mut(), out).await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let deadline = session.search_deadline();
        let wake = tokio::time::Instant::from_std(deadline.unwrap_or_else(Instant::now));
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read stdin")? else {
                    break;
                };
                let out = match parse_command(&line) {
                    Ok(cmd) => execute_command(&mut session, cmd, Instant::now()),
                    Err(err) => CommandOutput {
                        lines: vec![format!("Error: {err}")],
                        ..CommandOutput::default()
                    },
                };
                let quit = out.quit;
                emit(&mut session, renderer.as_mut(), out).await;
                if quit {
                    break;
                }
            }
            _ = tokio::time::sleep_until(wake), if deadline.is_some() => {
                if session.poll(Instant::now()) {
                    let mut out = CommandOutput::default();
                    show_results(&mut session, &mut out);
                    emit(&mut session, renderer.as_mut(), out).await;
                }
            }
        }
    }

    if let Some(renderer) = renderer {
        save_cache(cfg, renderer);
    }
    Ok(())
}

/// Print command output; cards on a printed page count as visible.
async fn emit(session: &mut Session, renderer: Option<&mut HeadRenderer>, out: CommandOutput) {
    for line in &out.lines {
        println!("{line}");
    }
    let (Some(page), Some(renderer)) = (out.page, renderer) else {
        return;
    };
    let (loaded, failed) = load_visible(session, renderer, &page).await;
    if loaded + failed > 0 {
        println!("  textures: {loaded} loaded, {failed} failed");
    }
}

async fn load_visible(
    session: &mut Session,
    renderer: &mut HeadRenderer,
    page: &Page,
) -> (usize, usize) {
    let mut loaded = 0;
    let mut failed = 0;
    for element in &page.elements {
        let Some(element) = session.notify_visible(page.pass, &element.key) else {
            continue;
        };
        match load_element(renderer, &element).await {
            LoadOutcome::Image { .. } => loaded += 1,
            LoadOutcome::Failed { .. } => failed += 1,
            LoadOutcome::Skipped => {}
        }
    }
    (loaded, failed)
}
