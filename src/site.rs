//! Static catalog page output.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use headsmith_assets::TextureIndex;
use headsmith_core::{Catalog, Head, TagTaxonomy};
use headsmith_render::{LazyElement, LoadOutcome};
use serde::Serialize;
use tracing::info;

use crate::html::{self, escape_html, CardContext};

pub const STYLESHEET: &str = r#"body { font-family: sans-serif; background: #1e1e24; color: #ddd; margin: 0 auto; max-width: 1200px; padding: 1rem; }
.tags { display: flex; flex-wrap: wrap; gap: .4rem; margin-bottom: 1rem; }
.tag-pill { background: #333; border-radius: 1rem; padding: .2rem .7rem; }
.tag-pill .count { opacity: .6; margin-left: .3rem; }
.head-card { background: #2a2a33; border-radius: 8px; margin-bottom: 1rem; padding: 1rem; }
.head-header { display: flex; align-items: center; gap: 1rem; }
.head-texture-container { width: 92px; height: 108px; display: flex; align-items: center; justify-content: center; }
.head-texture.placeholder, .placeholder { width: 92px; height: 108px; display: flex; align-items: center; justify-content: center; background: #333; color: #888; font-size: .8rem; }
.head-id { font-family: monospace; opacity: .6; }
.lore p { margin: .1rem 0; color: #aaa; font-style: italic; }
.recipe { margin: .5rem 0; }
.recipe-type { font-weight: bold; margin-bottom: .3rem; }
.recipe-flow { display: flex; align-items: center; gap: 1rem; }
.recipe-arrow { font-size: 1.5rem; }
.crafting-grid { display: grid; grid-template-columns: repeat(3, 52px); gap: 2px; }
.grid-slot { width: 52px; height: 52px; background: #8b8b8b; position: relative; display: flex; align-items: center; justify-content: center; }
.grid-slot.empty { background: #555; }
.amount-badge { position: absolute; right: 2px; bottom: 0; font-size: .7rem; text-shadow: 1px 1px #000; }
.item-icon { width: 32px; height: 32px; image-rendering: pixelated; }
.item-text { font-size: .65rem; text-align: center; }
.head-ref { color: #ffaa00; }
.ingredient { display: flex; align-items: center; gap: .4rem; }
.drop-condition { font-style: italic; opacity: .8; }
.mc-0 { color: #000000; } .mc-1 { color: #0000aa; } .mc-2 { color: #00aa00; } .mc-3 { color: #00aaaa; }
.mc-4 { color: #aa0000; } .mc-5 { color: #aa00aa; } .mc-6 { color: #ffaa00; } .mc-7 { color: #aaaaaa; }
.mc-8 { color: #555555; } .mc-9 { color: #5555ff; } .mc-a { color: #55ff55; } .mc-b { color: #55ffff; }
.mc-c { color: #ff5555; } .mc-d { color: #ff55ff; } .mc-e { color: #ffff55; } .mc-f { color: #ffffff; }
.mc-l { font-weight: bold; } .mc-m { text-decoration: line-through; } .mc-n { text-decoration: underline; } .mc-o { font-style: italic; }
"#;

#[derive(Serialize)]
struct CatalogEntry<'a> {
    id: &'a str,
    #[serde(flatten)]
    head: &'a Head,
}

/// Files written by [`write_site`].
#[derive(Debug, Clone)]
pub struct SiteFiles {
    pub index: PathBuf,
    pub stylesheet: PathBuf,
    pub catalog: PathBuf,
}

/// Full catalog page. Returns the markup and every texture slot on it.
pub fn render_index(
    catalog: &Catalog,
    textures: Option<&TextureIndex>,
    outcomes: Option<&HashMap<String, LoadOutcome>>,
) -> (String, Vec<LazyElement>) {
    let ids: Vec<&str> = catalog.ids().collect();
    let ctx = CardContext {
        catalog,
        textures,
        outcomes,
    };
    let (cards, elements) = html::render_cards(&ids, ctx);

    let taxonomy = TagTaxonomy::build(catalog.heads());
    let mut tags = String::new();
    for entry in taxonomy.tags_at_level(&[]) {
        let _ = write!(
            tags,
            "<span class=\"tag-pill{}\" data-tag=\"{tag}\">{tag}<span class=\"count\">{}</span></span>",
            if entry.has_children { " has-children" } else { "" },
            entry.count,
            tag = escape_html(&entry.tag),
        );
    }

    let mut page = String::from(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>HeadSmith Catalog</title>\n<link rel=\"stylesheet\" href=\"styles.css\">\n</head>\n<body>\n<h1>HeadSmith Catalog</h1>\n",
    );
    let _ = writeln!(page, "<div class=\"tags\">{tags}</div>");
    let _ = writeln!(
        page,
        "<div class=\"counter\">{}</div>",
        html::counter_text(ids.len(), catalog.len())
    );
    let _ = writeln!(page, "<div id=\"heads\">{cards}</div>");
    page.push_str("</body>\n</html>\n");
    (page, elements)
}

/// Write `index.html`, `styles.css` and `catalog.json` into `out_dir`.
pub fn write_site(out_dir: &Path, index_html: &str, catalog: &Catalog) -> Result<SiteFiles> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;

    let files = SiteFiles {
        index: out_dir.join("index.html"),
        stylesheet: out_dir.join("styles.css"),
        catalog: out_dir.join("catalog.json"),
    };
    let entries: Vec<CatalogEntry<'_>> = catalog
        .heads()
        .map(|head| CatalogEntry { id: &head.id, head })
        .collect();
    let json = serde_json::to_string_pretty(&entries)?;

    for (path, contents) in [
        (&files.index, index_html),
        (&files.stylesheet, STYLESHEET),
        (&files.catalog, json.as_str()),
    ] {
        fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))?;
    }
    info!(dir = %out_dir.display(), heads = catalog.len(), "catalog site written");
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Catalog {
        let mut oak = Head::new("oak_a");
        oak.tags = vec!["alphabet/oak".into(), "wood".into()];
        let mut barrel = Head::new("barrel");
        barrel.name = Some("&6Barrel".into());
        [oak, barrel].into_iter().collect()
    }

    #[test]
    fn index_lists_tags_counter_and_cards() {
        let (page, elements) = render_index(&catalog(), None, None);
        assert!(page.contains(
            "<span class=\"tag-pill has-children\" data-tag=\"alphabet\">alphabet<span class=\"count\">1</span></span>"
        ));
        assert!(page.contains("<div class=\"counter\">Showing 2 of 2 heads</div>"));
        assert_eq!(page.matches("class=\"head-card\"").count(), 2);
        assert!(elements.is_empty());
    }

    #[test]
    fn writes_site_files() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = catalog();
        let (page, _) = render_index(&catalog, None, None);
        let files = write_site(&dir.path().join("site"), &page, &catalog).unwrap();

        assert_eq!(fs::read_to_string(&files.index).unwrap(), page);
        assert!(fs::read_to_string(&files.stylesheet).unwrap().contains(".mc-6"));
        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&files.catalog).unwrap()).unwrap();
        assert_eq!(json[0]["id"], "oak_a");
        assert_eq!(json[1]["name"], "&6Barrel");
    }
}
