use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Raw interface description as returned by the upstream API.
///
/// Immutable once produced; a reload fetches a fresh one rather than
/// mutating the previous document.
#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceDescription {
    document: Value,
}

impl InterfaceDescription {
    pub fn new(document: Value) -> Self {
        Self { document }
    }

    pub fn document(&self) -> &Value {
        &self.document
    }

    /// Format-version marker (`openapi` field), if present
    pub fn format_version(&self) -> Option<&Value> {
        self.document.get("openapi")
    }

    /// Number of entries in the `paths` map, zero when absent
    pub fn endpoint_count(&self) -> usize {
        endpoint_count(&self.document)
    }
}

/// Interface description whose schema property names no longer collide
/// with reserved words. Only [`crate::services::schema_sanitizer`] creates these.
#[derive(Debug, Clone, PartialEq)]
pub struct SanitizedDescription {
    document: Value,
}

impl SanitizedDescription {
    pub(crate) fn from_sanitized(document: Value) -> Self {
        Self { document }
    }

    pub fn document(&self) -> &Value {
        &self.document
    }

    pub fn endpoint_count(&self) -> usize {
        endpoint_count(&self.document)
    }

    pub fn title(&self) -> Option<&str> {
        self.document
            .pointer("/info/title")
            .and_then(Value::as_str)
    }
}

fn endpoint_count(document: &Value) -> usize {
    document
        .get("paths")
        .and_then(Value::as_object)
        .map(|paths| paths.len())
        .unwrap_or(0)
}

/// Opaque upstream release identifier. Compared for equality only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionToken(String);

impl VersionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Extracts a token from a version document.
    ///
    /// Looks at `version`, then `commit`, then `date`. Non-string values are
    /// stringified so numeric versions still compare consistently.
    pub fn from_document(document: &Value) -> Option<Self> {
        ["version", "commit", "date"]
            .iter()
            .filter_map(|field| document.get(*field))
            .find_map(|value| match value {
                Value::Null => None,
                Value::String(s) if s.is_empty() => None,
                Value::String(s) => Some(Self(s.clone())),
                other => Some(Self(other.to_string())),
            })
    }
}

impl fmt::Display for VersionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VersionToken {
    fn from(token: &str) -> Self {
        Self::new(token)
    }
}
