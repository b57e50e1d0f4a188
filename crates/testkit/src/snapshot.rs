//! Golden file snapshots.
//!
//! JSON snapshots are written as pretty JSON with sorted object keys; text
//! snapshots (rendered HTML) are compared verbatim. Tests compare against the
//! file on disk; rerun with `HEADSMITH_UPDATE_SNAPSHOTS=1` to rewrite them.

use anyhow::{bail, Context, Result};
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Environment variable that enables snapshot updates.
pub const UPDATE_SNAPSHOTS_ENV: &str = "HEADSMITH_UPDATE_SNAPSHOTS";

/// Compare `value` as canonical JSON against the golden file at `path`.
pub fn assert_json_snapshot<P: AsRef<Path>, T: Serialize>(path: P, value: &T) -> Result<()> {
    let value = serde_json::to_value(value).context("serialize snapshot value")?;
    let mut actual =
        serde_json::to_string_pretty(&sort_keys(value)).context("format snapshot JSON")?;
    actual.push('\n');
    assert_text_snapshot(path, &actual)
}

/// Compare `actual` verbatim against the golden file at `path`.
pub fn assert_text_snapshot<P: AsRef<Path>>(path: P, actual: &str) -> Result<()> {
    let path = path.as_ref();
    if update_requested() {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create snapshot directory {}", parent.display()))?;
        }
        return fs::write(path, actual)
            .with_context(|| format!("write snapshot {}", path.display()));
    }

    let expected = fs::read_to_string(path).with_context(|| {
        format!(
            "snapshot missing at {} (set {UPDATE_SNAPSHOTS_ENV}=1 to create it)",
            path.display()
        )
    })?;
    if let Some((line, want, got)) = first_difference(&expected, actual) {
        bail!(
            "snapshot mismatch at {}:{line}\n  expected: {want}\n    actual: {got}\n(set {UPDATE_SNAPSHOTS_ENV}=1 to update)",
            path.display()
        );
    }
    Ok(())
}

fn update_requested() -> bool {
    std::env::var(UPDATE_SNAPSHOTS_ENV)
        .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

fn first_difference<'a>(expected: &'a str, actual: &'a str) -> Option<(usize, &'a str, &'a str)> {
    let mut want = expected.lines();
    let mut got = actual.lines();
    let mut line = 1;
    loop {
        match (want.next(), got.next()) {
            (None, None) => return None,
            (w, g) if w != g => return Some((line, w.unwrap_or("<eof>"), g.unwrap_or("<eof>"))),
            _ => line += 1,
        }
    }
}

fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, sort_keys(v)))
                    .collect(),
            )
        }
        Value::Array(values) => Value::Array(values.into_iter().map(sort_keys).collect()),
        other => other,
    }
}
