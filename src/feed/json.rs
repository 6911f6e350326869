//! Normalizer for the JSON feed API shape
//! `{"responseData": {"feed": {"entries": [...]}}}`.
//!
//! Every per-entry field is optional. A field that is missing or has the
//! wrong JSON type is treated as absent; it never aborts the entry or the feed.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::date::{parse_published, DateFormat};
use crate::entry::{Entry, MediaContent};

/// The response did not have the `responseData.feed.entries` structure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unexpected feed shape: `{path}` is {problem}")]
pub struct ShapeMismatch {
    pub path: &'static str,
    pub problem: &'static str,
}

impl ShapeMismatch {
    fn missing(path: &'static str) -> Self {
        Self {
            path,
            problem: "missing",
        }
    }

    fn not(path: &'static str, problem: &'static str) -> Self {
        Self { path, problem }
    }
}

/// Errors from decoding a raw JSON feed body.
#[derive(Debug, Error)]
pub enum JsonFeedError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Shape(#[from] ShapeMismatch),
}

pub fn parse_json_feed(bytes: &[u8], date_format: &DateFormat) -> Result<Vec<Entry>, JsonFeedError> {
    let value: Value = serde_json::from_slice(bytes)?;
    Ok(normalize(&value, date_format)?)
}

/// Converts a parsed JSON feed response into entries, in source order.
pub fn normalize(root: &Value, date_format: &DateFormat) -> Result<Vec<Entry>, ShapeMismatch> {
    let entries = locate_entries(root)?;

    let mut out = Vec::with_capacity(entries.len());
    for (index, value) in entries.iter().enumerate() {
        match value.as_object() {
            Some(map) => out.push(normalize_entry(map, date_format)),
            None => {
                tracing::warn!(index = index, "Skipping feed entry that is not a JSON object");
            }
        }
    }
    Ok(out)
}

fn locate_entries(root: &Value) -> Result<&Vec<Value>, ShapeMismatch> {
    let root = root
        .as_object()
        .ok_or(ShapeMismatch::not("$", "not an object"))?;
    let response_data = root
        .get("responseData")
        .ok_or(ShapeMismatch::missing("responseData"))?
        .as_object()
        .ok_or(ShapeMismatch::not("responseData", "not an object"))?;
    let feed = response_data
        .get("feed")
        .ok_or(ShapeMismatch::missing("responseData.feed"))?
        .as_object()
        .ok_or(ShapeMismatch::not("responseData.feed", "not an object"))?;
    feed.get("entries")
        .ok_or(ShapeMismatch::missing("responseData.feed.entries"))?
        .as_array()
        .ok_or(ShapeMismatch::not("responseData.feed.entries", "not an array"))
}

fn normalize_entry(map: &Map<String, Value>, date_format: &DateFormat) -> Entry {
    let raw_date = string_field(map, "publishedDate").unwrap_or_default();
    let published = parse_published(&raw_date, date_format);

    Entry::builder(string_field(map, "title").unwrap_or_default())
        .link(string_field(map, "link").unwrap_or_default())
        .author(string_field(map, "author"))
        .html_content(string_field(map, "content"))
        .content_snippet(string_field(map, "contentSnippet"))
        .categories(string_list(map.get("categories")))
        .media(media_contents(map.get("mediaGroups")))
        .dates(raw_date, published)
        .build()
}

fn string_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Strings of a JSON array; non-string members are dropped.
fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Flattens `mediaGroups[].contents[]`, group order first, then content order.
fn media_contents(value: Option<&Value>) -> Vec<MediaContent> {
    let Some(groups) = value.and_then(Value::as_array) else {
        return Vec::new();
    };

    groups
        .iter()
        .filter_map(|group| group.get("contents").and_then(Value::as_array))
        .flatten()
        .filter_map(MediaContent::from_value)
        .collect()
}
