//! Reserved-word sanitization for interface descriptions
//!
//! Tool arguments are derived from schema property names. Clients bind those
//! names as identifiers, so a property literally called `from` or `class`
//! breaks them. This module rewrites every colliding property name by
//! appending an underscore.
//!
//! The transform is pure: the input tree is never touched and the output
//! shares nothing with it. Every schema whose properties were renamed gets a
//! [`RENAMED_PROPERTIES`] map next to `properties`, from new name to wire
//! name, so callers can restore exactly the names that were rewritten.
//!
//! # Example
//!
//! ```rust
//! use specmcp::models::InterfaceDescription;
//! use specmcp::services::schema_sanitizer::sanitize;
//! use serde_json::json;
//!
//! let raw = InterfaceDescription::new(json!({
//!     "openapi": "3.1.0",
//!     "paths": {},
//!     "components": {"schemas": {"Transfer": {"properties": {"from": {"type": "string"}}}}}
//! }));
//! let clean = sanitize(&raw);
//! assert!(clean.document().pointer("/components/schemas/Transfer/properties/from_").is_some());
//! ```

use crate::models::{InterfaceDescription, SanitizedDescription};
use serde_json::{Map, Value};

/// Colliding property names and their replacements
pub const RESERVED_WORDS: &[(&str, &str)] = &[
    ("from", "from_"),
    ("in", "in_"),
    ("and", "and_"),
    ("or", "or_"),
    ("not", "not_"),
    ("is", "is_"),
    ("global", "global_"),
    ("import", "import_"),
    ("class", "class_"),
    ("as", "as_"),
    ("return", "return_"),
    ("async", "async_"),
    ("await", "await_"),
];

/// Schema key recording `{sanitized name: wire name}` for renamed properties
pub const RENAMED_PROPERTIES: &str = "x-renamed-properties";

/// Replacement for a reserved property name, if it collides
pub fn replacement_for(name: &str) -> Option<&'static str> {
    RESERVED_WORDS
        .iter()
        .find(|(reserved, _)| *reserved == name)
        .map(|(_, replacement)| *replacement)
}

pub fn sanitize(description: &InterfaceDescription) -> SanitizedDescription {
    SanitizedDescription::from_sanitized(sanitize_value(description.document()))
}

/// Recursively rewrites schema property maps, returning a new tree
pub fn sanitize_value(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(sanitize_object(map)),
        Value::Array(items) => Value::Array(items.iter().map(sanitize_value).collect()),
        other => other.clone(),
    }
}

fn sanitize_object(map: &Map<String, Value>) -> Map<String, Value> {
    let renames_properties = matches!(map.get("properties"), Some(Value::Object(_)));

    let mut out = Map::with_capacity(map.len());
    let mut renamed = Map::new();
    for (key, value) in map {
        let rewritten = match (key.as_str(), value) {
            ("properties", Value::Object(properties)) => {
                let (properties, renames) = rename_properties(properties);
                renamed = renames;
                Value::Object(properties)
            }
            ("required", Value::Array(names)) if renames_properties => {
                Value::Array(names.iter().map(rename_required).collect())
            }
            _ => sanitize_value(value),
        };
        out.insert(key.clone(), rewritten);
    }
    if !renamed.is_empty() {
        out.insert(RENAMED_PROPERTIES.to_string(), Value::Object(renamed));
    }
    out
}

/// Returns the rewritten map and the `{replacement: reserved}` renames
fn rename_properties(properties: &Map<String, Value>) -> (Map<String, Value>, Map<String, Value>) {
    let mut out = Map::with_capacity(properties.len());
    let mut renamed = Map::new();

    for (name, schema) in properties {
        if replacement_for(name).is_none() {
            out.insert(name.clone(), sanitize_value(schema));
        }
    }

    // Renamed keys are inserted last so a renamed property overwrites an
    // existing sibling of the same name.
    for (name, schema) in properties {
        if let Some(replacement) = replacement_for(name) {
            tracing::info!(
                "Patching keyword '{}' to '{}' in schema properties",
                name,
                replacement
            );
            out.insert(replacement.to_string(), sanitize_value(schema));
            renamed.insert(replacement.to_string(), Value::String(name.clone()));
        }
    }

    (out, renamed)
}

fn rename_required(name: &Value) -> Value {
    match name.as_str().and_then(replacement_for) {
        Some(replacement) => Value::String(replacement.to_string()),
        None => name.clone(),
    }
}
