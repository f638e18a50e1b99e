//! Indexed-field specification and value normalization
//!
//! Besides the JSON payload, a configurable subset of event fields can be
//! persisted as separate name/value rows so deployments can search without
//! deserializing JSON. Values are normalized before storage so equal text
//! always produces equal rows.

use unicode_normalization::UnicodeNormalization;

use quill_core::{AuditError, Result};

/// One entry of the indexed-fields configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedField {
    /// Event field to read
    pub field: String,
    /// Column value the row is stored under
    pub alias: String,
}

/// Parse a delimited `field[:alias]` list
///
/// Entries with neither one nor two components, or with blank components,
/// are malformed. An empty specification yields an empty list.
pub fn parse_indexed_fields(spec: &str, separator: char) -> Result<Vec<IndexedField>> {
    let mut entries = Vec::new();
    for raw in spec.split(separator) {
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }
        let mut parts = raw.split(':');
        let field = parts.next().map(str::trim).unwrap_or_default();
        let alias = parts.next().map(str::trim);
        if field.is_empty() || parts.next().is_some() || alias.is_some_and(str::is_empty) {
            return Err(AuditError::configuration(format!(
                "malformed indexed-field entry `{raw}` (expected `field` or `field:alias`)"
            )));
        }
        entries.push(IndexedField {
            field: field.to_string(),
            alias: alias.unwrap_or(field).to_string(),
        });
    }
    Ok(entries)
}

/// Normalizes indexed values for deterministic search
///
/// Always composes to NFC; case folding and truncation are configurable.
/// Truncation counts characters after normalization, so it never splits a
/// character.
#[derive(Debug, Clone, Default)]
pub struct ValueNormalizer {
    pub to_lowercase: bool,
    pub max_length: Option<usize>,
}

impl ValueNormalizer {
    pub fn normalize(&self, value: &str) -> String {
        let mut normalized: String = value.nfc().collect();
        if self.to_lowercase {
            normalized = normalized.to_lowercase();
        }
        if let Some(max) = self.max_length {
            if normalized.chars().count() > max {
                normalized = normalized.chars().take(max).collect();
            }
        }
        normalized
    }
}
