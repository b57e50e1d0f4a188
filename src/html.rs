//! Catalog card markup.
//!
//! Every texture slot on a card is registered as a [`LazyElement`] keyed
//! `<head id>:<n>` in document order, so the same key can be used to feed
//! load results back into a second rendering pass.

use std::collections::HashMap;
use std::fmt::Write as _;

use headsmith_assets::TextureIndex;
use headsmith_core::{
    color_tokens, strip_color_codes, Catalog, ColorToken, DropRule, Head, ItemSpec, Recipe,
    ShapedRecipe, ShapelessRecipe, StonecutterRecipe,
};
use headsmith_render::{ElementKind, LazyElement, LoadOutcome};

/// Escape text for use in element content and quoted attributes.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Render `&`-coded text as nested `mc-<code>` spans, all closed at the end.
pub fn minecraft_colors(text: &str) -> String {
    let mut out = String::new();
    let mut open = 0;
    for token in color_tokens(text) {
        match token {
            ColorToken::Text(run) => out.push_str(&escape_html(run)),
            ColorToken::Style(code) => {
                let _ = write!(out, "<span class=\"mc-{code}\">");
                open += 1;
            }
        }
    }
    out.push_str(&"</span>".repeat(open));
    out
}

/// `OAK_PLANKS` -> `oak planks`.
pub fn format_material(material: &str) -> String {
    material.to_lowercase().replace('_', " ")
}

/// Head counter line.
pub fn counter_text(shown: usize, total: usize) -> String {
    format!("Showing {shown} of {total} heads")
}

/// Shared inputs for card rendering.
#[derive(Clone, Copy)]
pub struct CardContext<'a> {
    pub catalog: &'a Catalog,
    /// Material icon lookup; `None` renders materials as text.
    pub textures: Option<&'a TextureIndex>,
    /// Load results by element key; missing keys stay lazy.
    pub outcomes: Option<&'a HashMap<String, LoadOutcome>>,
}

/// Markup for one head plus the texture slots it contains.
#[derive(Debug, Clone)]
pub struct RenderedCard {
    pub html: String,
    pub elements: Vec<LazyElement>,
}

struct CardWriter<'a> {
    ctx: CardContext<'a>,
    owner: &'a str,
    html: String,
    elements: Vec<LazyElement>,
}

impl<'a> CardWriter<'a> {
    fn register(&mut self, kind: ElementKind, data: &str) -> (String, Option<&'a LoadOutcome>) {
        let key = format!("{}:{}", self.owner, self.elements.len());
        self.elements.push(LazyElement {
            key: key.clone(),
            kind,
            data: Some(data.to_string()),
        });
        let outcome = self.ctx.outcomes.and_then(|o| o.get(&key));
        (key, outcome)
    }

    fn head_slot(&mut self, kind: ElementKind, blob: &str, class: &str) -> String {
        let (key, outcome) = self.register(kind, blob);
        let css = kind.css_class();
        match outcome {
            Some(LoadOutcome::Image { src, size }) => {
                let style = match size {
                    Some((w, h)) => {
                        format!(" style=\"image-rendering: pixelated; width: {w}px; height: {h}px\"")
                    }
                    None => String::new(),
                };
                format!(
                    "<div class=\"{class}{css}\" data-key=\"{key}\"><img src=\"{}\"{style}></div>",
                    escape_html(src)
                )
            }
            Some(LoadOutcome::Failed { text, placeholder }) => format!(
                "<div class=\"{class}{css}{}\" data-key=\"{key}\">{text}</div>",
                if *placeholder { " placeholder" } else { "" }
            ),
            _ => format!(
                "<div class=\"{class}{css}\" data-key=\"{key}\" data-texture=\"{}\"></div>",
                escape_html(blob)
            ),
        }
    }

    fn material_icon(&mut self, material: &str) -> String {
        let label = escape_html(&format_material(material));
        let url = self.ctx.textures.and_then(|t| t.texture_url(material));
        let Some(url) = url else {
            return format!("<span class=\"item-text\">{label}</span>");
        };
        let (key, outcome) = self.register(ElementKind::LazyImage, &url);
        let alt = escape_html(material);
        let url = escape_html(&url);
        match outcome {
            Some(LoadOutcome::Image { .. }) => format!(
                "<img class=\"item-icon\" src=\"{url}\" alt=\"{alt}\" title=\"{label}\">"
            ),
            _ => format!(
                "<img class=\"item-icon lazy-img\" data-key=\"{key}\" data-src=\"{url}\" alt=\"{alt}\" title=\"{label}\">"
            ),
        }
    }

    fn item_icon(&mut self, spec: &ItemSpec, small: bool) -> String {
        if let Some(head_id) = spec.head.as_deref().filter(|_| spec.material.is_none()) {
            return self.head_icon(head_id, small);
        }
        match spec.material.as_deref() {
            Some(material) => self.material_icon(material),
            None => String::new(),
        }
    }

    fn head_icon(&mut self, head_id: &str, small: bool) -> String {
        let texture = self
            .ctx
            .catalog
            .get(head_id)
            .and_then(|h| h.texture_blob());
        match texture {
            Some(blob) => {
                let kind = if small {
                    ElementKind::DropHeadIcon
                } else {
                    ElementKind::HeadIcon
                };
                self.head_slot(kind, blob, "item-icon ")
            }
            None => format!(
                "<span class=\"item-text head-ref\">{}</span>",
                escape_html(head_id)
            ),
        }
    }

    fn ingredient(&mut self, spec: &ItemSpec, small: bool) -> String {
        let icon = self.item_icon(spec, small);
        let label = match (&spec.material, &spec.head) {
            (None, Some(head_id)) => {
                let name = self
                    .ctx
                    .catalog
                    .get(head_id)
                    .and_then(|h| h.name.as_deref())
                    .unwrap_or(head_id);
                format!(
                    "<span class=\"head-ref\">{}</span>",
                    escape_html(&strip_color_codes(name))
                )
            }
            (material, _) => format!(
                "<span class=\"material\">{}</span>",
                escape_html(&format_material(material.as_deref().unwrap_or("?")))
            ),
        };
        format!(
            "<div class=\"ingredient\"><span class=\"amount\">{}x</span> {icon} {label}</div>",
            spec.count()
        )
    }

    fn output(&mut self, amount: u32) -> String {
        let icon = self.head_icon(self.owner, false);
        let amount = if amount > 1 {
            format!("x{amount}")
        } else {
            String::new()
        };
        format!(
            "<div class=\"recipe-output\"><div class=\"output-icon\">{icon}</div><div class=\"output-amount\">{amount}</div></div>"
        )
    }

    fn shaped(&mut self, recipe: &ShapedRecipe) -> String {
        let mut grid = String::from("<div class=\"crafting-grid\">");
        for row in 0..3 {
            for col in 0..3 {
                let symbol = recipe.symbol_at(row, col);
                if symbol == ' ' {
                    grid.push_str("<div class=\"grid-slot empty\"></div>");
                    continue;
                }
                let (icon, badge) = match recipe.ingredient_for(symbol) {
                    Some(spec) => {
                        let badge = if spec.amount > 1 {
                            format!("<span class=\"amount-badge\">x{}</span>", spec.amount)
                        } else {
                            String::new()
                        };
                        (self.item_icon(spec, false), badge)
                    }
                    None => (String::new(), String::new()),
                };
                let _ = write!(grid, "<div class=\"grid-slot\">{icon}{badge}</div>");
            }
        }
        grid.push_str("</div>");
        grid
    }

    fn shapeless(&mut self, recipe: &ShapelessRecipe) -> String {
        let mut list = String::from("<div class=\"ingredients-list\">");
        for spec in &recipe.ingredients {
            list.push_str(&self.ingredient(spec, false));
        }
        list.push_str("</div>");
        list
    }

    fn stonecutter(&mut self, recipe: &StonecutterRecipe) -> String {
        let fallback = ItemSpec {
            material: None,
            head: None,
            amount: 1,
        };
        self.ingredient(recipe.input.as_ref().unwrap_or(&fallback), false)
    }

    fn recipe(&mut self, recipe: Recipe<'_>) {
        let inputs = match recipe {
            Recipe::Shaped(r) => self.shaped(r),
            Recipe::Shapeless(r) => self.shapeless(r),
            Recipe::Stonecutter(r) => self.stonecutter(r),
        };
        let output = self.output(recipe.amount());
        let _ = write!(
            self.html,
            "<div class=\"recipe\" data-recipe=\"{}\"><div class=\"recipe-type\">{}</div><div class=\"recipe-flow\"><div class=\"recipe-inputs\">{inputs}</div><div class=\"recipe-arrow\">→</div>{output}</div></div>",
            escape_html(&recipe.id(self.owner)),
            recipe.kind().label(),
        );
    }

    fn drop_rule(&mut self, rule: &DropRule) {
        let _ = write!(
            self.html,
            "<div class=\"drop-rule\"><div class=\"drop-condition\">{}</div>",
            escape_html(&rule.describe_condition())
        );
        for spec in &rule.drops {
            let line = self.ingredient(spec, true);
            self.html.push_str(&line);
        }
        self.html.push_str("</div>");
    }

    fn card(mut self, head: &Head) -> RenderedCard {
        self.html.push_str("<div class=\"head-card\"><div class=\"head-header\">");
        let texture = match head.texture_blob() {
            Some(blob) => self.head_slot(ElementKind::HeadTexture, blob, ""),
            None => "<div class=\"head-texture placeholder\">No texture</div>".to_string(),
        };
        self.html.push_str(&texture);

        let title = head
            .source
            .as_ref()
            .map(|s| format!(" title=\"{}:{}\"", escape_html(&s.file), s.line))
            .unwrap_or_default();
        let _ = write!(
            self.html,
            "<div class=\"head-info\"><h2>{}</h2><div class=\"head-id\"{title}>{}</div></div></div>",
            minecraft_colors(head.display_name()),
            escape_html(self.owner),
        );

        if !head.lore.is_empty() {
            self.html.push_str("<div class=\"lore\">");
            for line in &head.lore {
                let _ = write!(self.html, "<p>{}</p>", minecraft_colors(line));
            }
            self.html.push_str("</div>");
        }

        if !head.recipes.is_empty() {
            self.html
                .push_str("<div class=\"recipes-section\"><h3>Recipes</h3>");
            for recipe in head.recipes.iter() {
                self.recipe(recipe);
            }
            self.html.push_str("</div>");
        }

        if !head.drops.is_empty() {
            self.html.push_str("<div class=\"drops-section\"><h3>Drops</h3>");
            for rule in &head.drops.on_break {
                self.drop_rule(rule);
            }
            self.html.push_str("</div>");
        }

        self.html.push_str("</div>");
        RenderedCard {
            html: self.html,
            elements: self.elements,
        }
    }
}

/// Render the card for `head`.
pub fn render_card(head: &Head, ctx: CardContext<'_>) -> RenderedCard {
    CardWriter {
        ctx,
        owner: &head.id,
        html: String::new(),
        elements: Vec::new(),
    }
    .card(head)
}

/// Render cards for `ids` (unknown ids are skipped), or the empty-state message.
pub fn render_cards<'c>(
    ids: &[&str],
    ctx: CardContext<'c>,
) -> (String, Vec<LazyElement>) {
    if ids.is_empty() {
        return ("<p>No heads found</p>".to_string(), Vec::new());
    }
    let mut html = String::new();
    let mut elements = Vec::new();
    for head in ids.iter().filter_map(|id| ctx.catalog.get(id)) {
        let card = render_card(head, ctx);
        html.push_str(&card.html);
        elements.extend(card.elements);
    }
    (html, elements)
}

#[cfg(test)]
mod tests {
    use super::*;
    use headsmith_core::{encode_blob, ShapedRecipe};
    use indexmap::IndexMap;

    fn ctx(catalog: &Catalog) -> CardContext<'_> {
        CardContext {
            catalog,
            textures: None,
            outcomes: None,
        }
    }

    #[test]
    fn colors_open_spans_and_close_at_end() {
        assert_eq!(
            minecraft_colors("&6Gold &lBold"),
            "<span class=\"mc-6\">Gold <span class=\"mc-l\">Bold</span></span>"
        );
        assert_eq!(minecraft_colors("Salt & <b>"), "Salt &amp; &lt;b&gt;");
        assert_eq!(minecraft_colors("&rReset"), "&amp;rReset");
    }

    #[test]
    fn formats_materials_and_counter() {
        assert_eq!(format_material("OAK_PLANKS"), "oak planks");
        assert_eq!(counter_text(3, 10), "Showing 3 of 10 heads");
    }

    #[test]
    fn card_without_texture_shows_placeholder() {
        let mut head = Head::new("plain");
        head.name = Some("&cPlain".into());
        head.lore = vec!["&7line".into()];
        let catalog: Catalog = [head].into_iter().collect();
        let card = render_card(catalog.get("plain").unwrap(), ctx(&catalog));
        assert!(card.html.contains("<div class=\"head-texture placeholder\">No texture</div>"));
        assert!(card.html.contains("<h2><span class=\"mc-c\">Plain</span></h2>"));
        assert!(card.html.contains("<p><span class=\"mc-7\">line</span></p>"));
        assert!(card.elements.is_empty());
    }

    #[test]
    fn shaped_recipe_registers_head_slots_in_order() {
        let mut key = IndexMap::new();
        key.insert("G".to_string(), ItemSpec::head("gem", 1));
        key.insert("S".to_string(), ItemSpec::material("STICK", 2));
        let mut crown = Head::new("crown");
        crown.texture = Some(encode_blob("http://textures.minecraft.net/texture/c"));
        crown.recipes.craft.shaped.push(ShapedRecipe {
            id: None,
            amount: 2,
            pattern: vec!["G G".into(), " S ".into()],
            key,
        });
        let mut gem = Head::new("gem");
        gem.texture = Some(encode_blob("http://textures.minecraft.net/texture/g"));
        let catalog: Catalog = [crown, gem].into_iter().collect();

        let card = render_card(catalog.get("crown").unwrap(), ctx(&catalog));
        let kinds: Vec<_> = card.elements.iter().map(|e| (e.key.as_str(), e.kind)).collect();
        assert_eq!(
            kinds,
            vec![
                ("crown:0", ElementKind::HeadTexture),
                ("crown:1", ElementKind::HeadIcon),
                ("crown:2", ElementKind::HeadIcon),
                ("crown:3", ElementKind::HeadIcon),
            ]
        );
        assert_eq!(card.html.matches("grid-slot empty").count(), 6);
        assert!(card.html.contains("<span class=\"item-text\">stick</span><span class=\"amount-badge\">x2</span>"));
        assert!(card.html.contains("data-recipe=\"crown_shaped\""));
        assert!(card.html.contains("<div class=\"output-amount\">x2</div>"));
    }

    #[test]
    fn outcomes_fill_slots() {
        let mut head = Head::new("lamp");
        head.texture = Some(encode_blob("http://textures.minecraft.net/texture/l"));
        head.drops.on_break.push(DropRule {
            when: IndexMap::from([("silk_touch".to_string(), serde_json::json!(true))]),
            drops: vec![ItemSpec::head("lamp", 1)],
        });
        let catalog: Catalog = [head].into_iter().collect();
        let outcomes = HashMap::from([
            (
                "lamp:0".to_string(),
                LoadOutcome::Image {
                    src: "data:image/png;base64,AA==".into(),
                    size: Some((92, 108)),
                },
            ),
            (
                "lamp:1".to_string(),
                LoadOutcome::Failed {
                    text: "?",
                    placeholder: false,
                },
            ),
        ]);
        let card = render_card(
            catalog.get("lamp").unwrap(),
            CardContext {
                outcomes: Some(&outcomes),
                ..ctx(&catalog)
            },
        );
        assert!(card.html.contains(
            "<img src=\"data:image/png;base64,AA==\" style=\"image-rendering: pixelated; width: 92px; height: 108px\">"
        ));
        assert!(card.html.contains(
            "<div class=\"item-icon drop-head-icon-container\" data-key=\"lamp:1\">?</div>"
        ));
        assert!(card.html.contains("<div class=\"drop-condition\">silk touch = true</div>"));
    }

    #[test]
    fn empty_result_has_message() {
        let catalog = Catalog::new();
        let (html, elements) = render_cards(&[], ctx(&catalog));
        assert_eq!(html, "<p>No heads found</p>");
        assert!(elements.is_empty());
    }
}
