//! Recovery of JSON record arrays from model output.
//!
//! Models wrap arrays in code fences, append commentary, or stop mid-array when they
//! run out of tokens. Recovery is attempted in a fixed order and stops at the first
//! step that yields records:
//!
//! 1. text that does not start with `[` or `{` (after fence stripping) is prose: empty
//! 2. direct parse
//! 3. the greedy `[{ ... }]` substring
//! 4. truncation after the last complete top-level object, closed with `]`
//! 5. empty

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

/// Extract a list of JSON objects from raw model output. Never fails.
pub fn extract_records(raw: &str) -> Vec<Value> {
    let text = strip_code_fences(raw);

    if !(text.starts_with('[') || text.starts_with('{')) {
        tracing::debug!(
            preview = %preview(text),
            "model output is not JSON, skipping extraction"
        );
        return Vec::new();
    }

    if let Some(records) = parse_records(text) {
        return records;
    }

    if let Some(records) = bracket_scoped(text).and_then(parse_records) {
        tracing::debug!("recovered records from bracket-scoped substring");
        return records;
    }

    if let Some(records) = repair_truncated(text) {
        tracing::warn!(count = records.len(), "recovered records from truncated output");
        return records;
    }

    tracing::warn!(preview = %preview(text), "failed to extract records from model output");
    Vec::new()
}

/// Remove markdown code fences (```json ... ```) and surrounding whitespace.
pub fn strip_code_fences(raw: &str) -> &str {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix("```") {
        // Drop the info string (e.g. "json") on the opening fence line.
        text = match rest.find('\n') {
            Some(newline) if !rest[..newline].contains(&['[', '{'][..]) => &rest[newline + 1..],
            _ => rest.trim_start_matches(|c: char| c.is_ascii_alphabetic()),
        };
    }
    if let Some(rest) = text.trim_end().strip_suffix("```") {
        text = rest;
    }
    text.trim()
}

fn parse_records(text: &str) -> Option<Vec<Value>> {
    let value: Value = serde_json::from_str(text).ok()?;
    into_records(value)
}

/// Normalize a parsed value into a list of objects.
///
/// Arrays keep their object elements. An object without a `title` that wraps an
/// array of objects (`{"results": [...]}`) yields that array. Any other object is a
/// single record, nested arrays included.
fn into_records(value: Value) -> Option<Vec<Value>> {
    match value {
        Value::Array(items) => Some(items.into_iter().filter(Value::is_object).collect()),
        Value::Object(map) if map.contains_key("title") => Some(vec![Value::Object(map)]),
        Value::Object(map) => {
            let wrapped = map.values().find_map(|v| match v {
                Value::Array(items) if !items.is_empty() && items.iter().all(Value::is_object) => {
                    Some(items.clone())
                }
                _ => None,
            });
            Some(wrapped.unwrap_or_else(|| vec![Value::Object(map)]))
        }
        _ => None,
    }
}

fn bracket_scoped(text: &str) -> Option<&str> {
    static ARRAY_OF_OBJECTS: OnceLock<Regex> = OnceLock::new();
    let re = ARRAY_OF_OBJECTS
        .get_or_init(|| Regex::new(r"(?s)\[\s*\{.*\}\s*\]").expect("valid regex"));
    re.find(text).map(|m| m.as_str())
}

/// Cut the first array after its last complete element object and close it.
fn repair_truncated(text: &str) -> Option<Vec<Value>> {
    let start = text.find('[')?;
    let array = &text[start..];

    for end in object_boundaries(array).into_iter().rev() {
        let candidate = format!("{}]", &array[..=end]);
        if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(&candidate) {
            let records: Vec<Value> = items.into_iter().filter(Value::is_object).collect();
            if !records.is_empty() {
                return Some(records);
            }
        }
    }
    None
}

/// Byte offsets of every `}` that closes a direct element of the array starting at 0.
/// String contents (including escaped quotes) are skipped.
fn object_boundaries(array: &str) -> Vec<usize> {
    let mut boundaries = Vec::new();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, b) in array.bytes().enumerate() {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'[' | b'{' => depth += 1,
            b']' | b'}' => {
                depth = depth.saturating_sub(1);
                if b == b'}' && depth == 1 {
                    boundaries.push(i);
                }
                if depth == 0 {
                    break;
                }
            }
            _ => {}
        }
    }
    boundaries
}

fn preview(text: &str) -> String {
    text.chars().take(120).collect()
}
