//! Minecraft `&`-style formatting codes.
//!
//! Display names and lore lines carry legacy formatting codes such as `&c`
//! (red) or `&l` (bold). Search matching ignores them entirely, while the
//! catalog HTML turns the styled subset into CSS classes.

/// Every code character recognised after `&` (case-insensitive).
pub const FORMAT_CODES: &str = "0123456789abcdefklmnor";

/// Codes that map to a display style (`mc-<code>` classes).
///
/// `&k` (obfuscated) and `&r` (reset) are formatting codes but carry no style.
pub const STYLED_CODES: &str = "0123456789abcdeflonm";

/// Returns true when `c` is a formatting code character.
pub fn is_format_code(c: char) -> bool {
    FORMAT_CODES.contains(c.to_ascii_lowercase())
}

/// Remove every `&<code>` pair from `text`.
///
/// Removal is applied until no pair is left, so a pair that only appears
/// after an inner pair was removed (`"&&cc"`) is stripped too. This keeps the
/// function idempotent.
pub fn strip_color_codes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if is_format_code(c) && out.ends_with('&') {
            out.pop();
            continue;
        }
        out.push(c);
    }
    out
}

/// A piece of formatted text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorToken<'a> {
    /// Literal text.
    Text(&'a str),
    /// A styled code (lowercased), opening a new style span.
    Style(char),
}

impl ColorToken<'_> {
    /// CSS class for a style token.
    pub fn css_class(&self) -> Option<String> {
        match self {
            ColorToken::Style(code) => Some(format!("mc-{code}")),
            ColorToken::Text(_) => None,
        }
    }
}

/// Split `text` into literal runs and style codes.
///
/// Unstyled codes (`&k`, `&r`) and lone ampersands stay in the text.
pub fn color_tokens(text: &str) -> Vec<ColorToken<'_>> {
    let mut tokens = Vec::new();
    let mut run_start = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((idx, c)) = chars.next() {
        if c != '&' {
            continue;
        }
        let Some(&(code_idx, code)) = chars.peek() else {
            break;
        };
        let code = code.to_ascii_lowercase();
        if !STYLED_CODES.contains(code) {
            continue;
        }
        if run_start < idx {
            tokens.push(ColorToken::Text(&text[run_start..idx]));
        }
        tokens.push(ColorToken::Style(code));
        chars.next();
        run_start = code_idx + code.len_utf8();
    }
    if run_start < text.len() {
        tokens.push(ColorToken::Text(&text[run_start..]));
    }
    tokens
}
