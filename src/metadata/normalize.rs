//! Metadata normalization.
//!
//! Reconciles metadata mappings that use differing key vocabularies into the
//! canonical schema described by [`KEY_LIST`](super::KEY_LIST). The engine is
//! a pure function of its inputs: it never mutates the mapping it is given
//! and always returns a fresh one.
//!
//! # Rules
//!
//! - Canonical keys are copied verbatim and are never overwritten by keymap
//!   renames (first write wins).
//! - Keymap targets other than `notes` are only set if not already present.
//! - Keymap targets of `notes` accumulate, joined by [`LINE_SEPARATOR`].
//! - Unmapped foreign keys land in `extras`; null and empty-text values are
//!   dropped.
//! - Free-text `tags` are split into a sequence (see [`parse_tags`]).
//! - A present `download_url` replaces `resources` with a single resource.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::{json, Map, Value};
use tracing::warn;

use super::model::{is_canonical_key, value_to_text, Package, RawMetadata};
use crate::error::DatapkgError;

/// A foreign-key to canonical-key rename table.
pub type KeyMap = BTreeMap<String, String>;

/// The platform line separator used to join accumulated notes.
#[cfg(windows)]
pub const LINE_SEPARATOR: &str = "\r\n";
/// The platform line separator used to join accumulated notes.
#[cfg(not(windows))]
pub const LINE_SEPARATOR: &str = "\n";

static QUOTED_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"["']\s*([^"]*?)\s*["']"#).expect("quoted tag pattern is valid")
});

static TAG_SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[,\s]+").expect("tag separator pattern is valid"));

/// Normalizes `metadata` into the canonical key vocabulary.
///
/// The returned mapping contains every canonical key that could be
/// determined plus an `extras` mapping absorbing all other non-empty values.
pub fn normalize_metadata(metadata: &RawMetadata, keymap: &KeyMap) -> RawMetadata {
    let mut normalized: RawMetadata = metadata
        .iter()
        .filter(|(key, _)| is_canonical_key(key) && key.as_str() != "extras")
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    let mut extras = repair_extras(metadata.get("extras"));

    if !normalized.contains_key("name") {
        if let Some(id) = normalized.get("id").cloned() {
            normalized.insert("name".into(), id);
        }
    }

    for (key, value) in metadata {
        if is_canonical_key(key) {
            continue;
        }

        match keymap.get(key) {
            Some(target) if target == "notes" => {
                let mut notes = normalized.get("notes").map(value_to_text).unwrap_or_default();
                notes.push_str(LINE_SEPARATOR);
                notes.push_str(&value_to_text(value));
                normalized.insert("notes".into(), Value::String(notes));
            }
            Some(target) if is_canonical_key(target) => {
                if !normalized.contains_key(target.as_str()) {
                    normalized.insert(target.clone(), value.clone());
                }
            }
            Some(target) => {
                if !extras.contains_key(target.as_str()) {
                    extras.insert(target.clone(), value.clone());
                }
            }
            None => {
                if !is_empty_value(value) {
                    extras.insert(key.clone(), value.clone());
                }
            }
        }
    }

    if let Some(Value::String(notes)) = normalized.get_mut("notes") {
        if let Some(trimmed) = notes.strip_prefix(LINE_SEPARATOR) {
            *notes = trimmed.to_string();
        }
    }

    if let Some(Value::String(tags)) = normalized.get("tags") {
        let parsed = parse_tags(tags);
        normalized.insert("tags".into(), json!(parsed));
    }

    // Not a merge: any resources already present are dropped.
    let download_url = normalized
        .get("download_url")
        .map(value_to_text)
        .filter(|url| !url.is_empty());
    if let Some(url) = download_url {
        normalized.insert("resources".into(), json!([{ "url": url }]));
    }

    normalized.insert("extras".into(), Value::Object(extras));
    normalized
}

/// Normalizes `metadata` and converts the result into a typed [`Package`].
pub fn normalize(metadata: &RawMetadata, keymap: &KeyMap) -> Result<Package, DatapkgError> {
    Package::from_metadata(normalize_metadata(metadata, keymap))
}

/// Parses a free-text tag list into individual tags.
///
/// Bracketed text such as `['a b', 'c']` is a stringified list: each quoted
/// substring becomes one tag. Escaped quotes and nested brackets are not
/// understood. Anything else is split on runs of commas and whitespace.
pub fn parse_tags(text: &str) -> Vec<String> {
    let trimmed = text.trim();
    if trimmed.starts_with('[') && trimmed.ends_with(']') {
        QUOTED_TAG
            .captures_iter(trimmed)
            .map(|caps| caps[1].to_string())
            .collect()
    } else {
        TAG_SEPARATORS
            .split(trimmed)
            .filter(|tag| !tag.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Recovers the `extras` mapping from whatever shape it arrived in.
///
/// String-only media render an empty mapping as the text `{}`; such text (or
/// any other JSON object text) is parsed back into a real mapping.
pub fn repair_extras(extras: Option<&Value>) -> Map<String, Value> {
    match extras {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(map)) => map.clone(),
        Some(Value::String(text)) if text.trim().is_empty() => Map::new(),
        Some(Value::String(text)) => match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(map)) => map,
            _ => {
                warn!(extras = %text, "discarding extras that are not a mapping");
                Map::new()
            }
        },
        Some(other) => {
            warn!(extras = %other, "discarding extras that are not a mapping");
            Map::new()
        }
    }
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}
