//! Per-row value substitution
//!
//! Builds the concrete text, image path and output filename of one row from
//! the strategy templates.

use crate::adapters::peer::client::normalize_path;
use crate::domain::{BatchRow, RegexStep};
use regex::Regex;
use std::sync::OnceLock;

/// Document name used in filenames when none is known
pub const DEFAULT_DOCUMENT_NAME: &str = "template";

/// Timestamp format for the `{timestamp}` placeholder
pub const TIMESTAMP_FORMAT: &str = "%m%d%H%M";

fn backreference_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$(\d+)|\\(\d+)|\$").expect("back-reference pattern is valid"))
}

fn group_placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\{group\s*(\d+)\}").expect("group placeholder pattern is valid"))
}

fn unsafe_filename_chars() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r#"[\\/:*?"<>|]"#).expect("filename pattern is valid"))
}

/// Row value for `group`, if the row supplies one
pub fn group_value<'a>(row: &'a BatchRow, group: Option<u32>) -> Option<&'a str> {
    group.and_then(|g| row.value(&g.to_string()))
}

/// Text for an `update_text_layer` operation
///
/// The row value for the group replaces the template text; the operation's
/// find/replace steps are then applied to the result.
pub fn substitute_text(
    template_text: &str,
    group: Option<u32>,
    steps: &[RegexStep],
    row: &BatchRow,
) -> String {
    let raw = group_value(row, group).unwrap_or(template_text);
    apply_regex_steps(raw, steps)
}

/// Image path for a `replace_image` operation, with forward slashes
pub fn substitute_image_path(template_path: &str, group: Option<u32>, row: &BatchRow) -> String {
    normalize_path(group_value(row, group).unwrap_or(template_path))
}

/// Rewrites `$N` and `\N` back-references as `${N}`
///
/// Any other `$` is literal and is escaped as `$$`.
pub fn normalize_replacement(replacement: &str) -> String {
    backreference_pattern()
        .replace_all(replacement, |caps: &regex::Captures<'_>| {
            match caps.get(1).or_else(|| caps.get(2)) {
                Some(number) => format!("${{{}}}", number.as_str()),
                None => "$$".to_string(),
            }
        })
        .into_owned()
}

/// Applies find/replace steps in order
///
/// With at least one step, the text is first folded onto a single line.
/// A step whose pattern does not compile is logged and skipped.
pub fn apply_regex_steps(text: &str, steps: &[RegexStep]) -> String {
    if steps.is_empty() {
        return text.to_string();
    }

    let mut current = text.replace('\n', " ").replace('\r', "");
    for (position, step) in steps.iter().enumerate() {
        if step.find.is_empty() {
            continue;
        }
        let pattern = match fancy_regex::Regex::new(&step.find) {
            Ok(pattern) => pattern,
            Err(e) => {
                tracing::warn!(step = position + 1, pattern = %step.find, error = %e, "Skipping invalid find pattern");
                continue;
            }
        };
        let replacement = normalize_replacement(&step.replace);
        match pattern.try_replacen(&current, 0, replacement.as_str()) {
            Ok(replaced) => current = replaced.into_owned(),
            Err(e) => {
                tracing::warn!(step = position + 1, pattern = %step.find, error = %e, "Find/replace step failed");
            }
        }
    }
    current
}

/// Document name without directory or extension
pub fn document_stem(name: &str) -> String {
    let file = name.rsplit(['/', '\\']).next().unwrap_or(name);
    match file.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.to_string(),
        _ => file.to_string(),
    }
}

/// Replaces characters not allowed in file names with `_`
pub fn sanitize_filename(name: &str) -> String {
    unsafe_filename_chars().replace_all(name, "_").into_owned()
}

/// Output filename for one row and one render preset
///
/// An explicit row filename wins; otherwise the preset template is expanded:
/// `{index}` (1-based row index), `{doc}`, `{timestamp}` and `{group N}`.
pub fn render_filename(
    template: &str,
    row: &BatchRow,
    index: usize,
    document_name: &str,
    timestamp: &str,
) -> String {
    if let Some(explicit) = row.output_filename() {
        return sanitize_filename(explicit);
    }

    let expanded = template
        .replace("{index}", &index.to_string())
        .replace("{doc}", document_name)
        .replace("{timestamp}", timestamp);
    let expanded = group_placeholder_pattern()
        .replace_all(&expanded, |caps: &regex::Captures<'_>| {
            caps.get(1)
                .and_then(|g| row.value(g.as_str()))
                .unwrap_or_default()
                .to_string()
        })
        .into_owned();

    sanitize_filename(&expanded)
}
