use std::fmt;
use std::time::Instant;

use headsmith_core::strip_color_codes;

use crate::session::{HeadsView, Page, Session};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandError {
    message: String,
}

impl CommandError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CommandError {}

/// One line of input in the interactive browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowseCommand {
    Help,
    /// Free text typed into the search box.
    Search(String),
    Tag(String),
    /// Toggle a flat tag at any level.
    FlatTag(String),
    Breadcrumb(Option<usize>),
    Property(String),
    Clear,
    Tags,
    Properties,
    More,
    Quit,
}

#[derive(Debug, Default)]
pub struct CommandOutput {
    pub lines: Vec<String>,
    /// Cards that became visible and may need textures.
    pub page: Option<Page>,
    pub quit: bool,
}

pub fn parse_command(input: &str) -> Result<BrowseCommand, CommandError> {
    let trimmed = input.trim();
    let Some(rest) = trimmed.strip_prefix(':') else {
        return Ok(BrowseCommand::Search(trimmed.to_string()));
    };

    let mut parts = rest.split_whitespace();
    let cmd = parts
        .next()
        .ok_or_else(|| CommandError::new("Missing command. Try :help"))?
        .to_ascii_lowercase();
    let args: Vec<&str> = parts.collect();

    match cmd.as_str() {
        "help" | "?" => Ok(BrowseCommand::Help),
        "tag" | "t" => match args.as_slice() {
            [tag] => Ok(BrowseCommand::Tag(tag.to_string())),
            _ => Err(CommandError::new("Usage: :tag <name>")),
        },
        "flat" | "f" => match args.as_slice() {
            [tag] => Ok(BrowseCommand::FlatTag(tag.to_string())),
            _ => Err(CommandError::new("Usage: :flat <name>")),
        },
        "up" | "crumb" => match args.as_slice() {
            [] => Ok(BrowseCommand::Breadcrumb(None)),
            [level] => {
                let level = level
                    .parse::<usize>()
                    .map_err(|_| CommandError::new(format!("Invalid breadcrumb level: {level}")))?;
                Ok(BrowseCommand::Breadcrumb(Some(level)))
            }
            _ => Err(CommandError::new("Usage: :up [level]")),
        },
        "prop" | "p" => match args.as_slice() {
            [property] => Ok(BrowseCommand::Property(property.to_string())),
            _ => Err(CommandError::new("Usage: :prop <name>")),
        },
        "clear" => Ok(BrowseCommand::Clear),
        "tags" => Ok(BrowseCommand::Tags),
        "props" => Ok(BrowseCommand::Properties),
        "more" | "m" => Ok(BrowseCommand::More),
        "quit" | "q" | "exit" => Ok(BrowseCommand::Quit),
        _ => Err(CommandError::new(format!(
            "Unknown command: :{cmd}. Try :help"
        ))),
    }
}

pub fn execute_command(session: &mut Session, cmd: BrowseCommand, now: Instant) -> CommandOutput {
    let mut out = CommandOutput::default();
    match cmd {
        BrowseCommand::Help => out.lines.extend(help_lines()),
        BrowseCommand::Search(text) => session.input(now, text),
        BrowseCommand::Tag(tag) => {
            if session.select_tag(&tag) {
                show_results(session, &mut out);
            } else {
                out.lines
                    .push(format!("Error: no tag '{tag}' at this level. Try :tags"));
            }
        }
        BrowseCommand::FlatTag(tag) => {
            if session.toggle_flat_tag(&tag) {
                show_results(session, &mut out);
            } else {
                out.lines.push(format!("Error: no flat tag '{tag}'. Try :tags"));
            }
        }
        BrowseCommand::Breadcrumb(level) => {
            if session.breadcrumb(level) {
                show_results(session, &mut out);
            } else {
                out.lines.push(format!(
                    "Error: breadcrumb level {} is past the current path",
                    level.unwrap_or_default()
                ));
            }
        }
        BrowseCommand::Property(property) => {
            session.toggle_property(&property);
            show_results(session, &mut out);
        }
        BrowseCommand::Clear => {
            session.clear();
            show_results(session, &mut out);
        }
        BrowseCommand::Tags => {
            let path = &session.filters().tag_path;
            if !path.is_empty() {
                out.lines.push(format!("All > {}", path.join(" > ")));
            }
            for entry in session.level_entries() {
                let marker = if session.is_active(&entry.tag) { '*' } else { ' ' };
                let suffix = if entry.has_children { "/" } else { "" };
                out.lines
                    .push(format!("{marker} {}{suffix} ({})", entry.tag, entry.count));
            }
            // The root level already lists flat tags next to the categories.
            if !path.is_empty() {
                let flat = session.flat_entries();
                if !flat.is_empty() {
                    out.lines.push("Tags:".to_string());
                }
                for entry in flat {
                    let marker = if session.is_active(&entry.tag) { '*' } else { ' ' };
                    out.lines.push(format!("{marker} {} ({})", entry.tag, entry.count));
                }
            }
        }
        BrowseCommand::Properties => {
            let selected = session.filters().property.as_deref();
            for (property, count) in session.properties() {
                let marker = if selected == Some(property.as_str()) { '*' } else { ' ' };
                out.lines.push(format!("{marker} {property} ({count})"));
            }
        }
        BrowseCommand::More => {
            if session.has_more() {
                append_page(session, &mut out.lines, &mut out.page);
            } else {
                out.lines.push("No more heads".to_string());
            }
        }
        BrowseCommand::Quit => out.quit = true,
    }
    out
}

/// Counter plus the first page of the current view.
pub fn show_results(session: &mut Session, out: &mut CommandOutput) {
    out.lines.push(session.counter_text());
    if *session.view() == HeadsView::SelectSubcategory {
        out.lines
            .push("Select a subcategory above to view heads".to_string());
    } else if !session.has_more() {
        out.lines.push("No heads found".to_string());
    } else {
        append_page(session, &mut out.lines, &mut out.page);
    }
}

fn append_page(session: &mut Session, lines: &mut Vec<String>, slot: &mut Option<Page>) {
    let Some(page) = session.next_page() else {
        return;
    };
    for id in &page.ids {
        let name = session
            .catalog()
            .get(id)
            .and_then(|h| h.name.as_deref())
            .map(strip_color_codes);
        match name {
            Some(name) if name != *id => lines.push(format!("  {id}  {name}")),
            _ => lines.push(format!("  {id}")),
        }
    }
    if session.has_more() {
        lines.push("  ... :more for the next page".to_string());
    }
    *slot = Some(page);
}

pub fn help_lines() -> Vec<String> {
    vec![
        "Type to search; the query applies after a short pause.".to_string(),
        "Commands:".to_string(),
        "  :help".to_string(),
        "  :tags                 list tags at the current level (* = active, / = category)"
            .to_string(),
        "  :tag <name>           drill into a category, pick a subcategory, or toggle a tag"
            .to_string(),
        "  :flat <name>          toggle a flat tag at any level".to_string(),
        "  :up [level]           breadcrumb; no level returns to all tags".to_string(),
        "  :props                list properties".to_string(),
        "  :prop <name>          toggle a property filter".to_string(),
        "  :clear                reset search and filters".to_string(),
        "  :more                 show the next page".to_string(),
        "  :quit".to_string(),
    ]
}
