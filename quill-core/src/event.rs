//! Audit events
//!
//! An [`Event`] is a collection of uniquely-named [`Field`]s describing one
//! audited action. Fields move in and copy out, so no caller ever holds an
//! alias into the event's internal state.

use std::collections::BTreeMap;

use zeroize::Zeroizing;

use crate::error::{AuditError, Result};
use crate::field::{Field, resolve_charset};

/// Serialized record format version, owned by this implementation
pub const RECORD_FORMAT_VERSION: &str = "1.0";

/// A named collection of [`Field`]s
///
/// Field names are case-sensitive and unique; setting an existing name
/// replaces the previous field. Iteration order (and therefore JSON
/// rendering order) is lexicographic by name.
#[derive(Debug, Clone, Default)]
pub struct Event {
    fields: BTreeMap<String, Field>,
}

impl Event {
    /// Create an empty event
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an event pre-populated with fields
    pub fn with_fields(fields: impl IntoIterator<Item = Field>) -> Self {
        let mut event = Self::new();
        for field in fields {
            event.set_field(field);
        }
        event
    }

    /// Store a field, replacing any previous field of the same name
    ///
    /// Takes ownership of the field (the caller keeps no alias). A replaced
    /// field has its bytes zeroed when it is dropped. Returns the name the
    /// field was stored under.
    pub fn set_field(&mut self, field: Field) -> String {
        let name = field.name().to_string();
        self.fields.insert(name.clone(), field);
        name
    }

    /// Whether a field of this name is present
    pub fn contains_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Remove a field
    ///
    /// Returns `true` iff a field was removed. The removed field's bytes
    /// are zeroed on drop.
    pub fn unset_field(&mut self, name: &str) -> bool {
        self.fields.remove(name).is_some()
    }

    /// Copy a field out of the event
    ///
    /// The returned field is an independent copy, never a reference into
    /// the event.
    pub fn get_field(&self, name: &str) -> Result<Field> {
        self.fields
            .get(name)
            .cloned()
            .ok_or_else(|| AuditError::FieldNotFound(name.to_string()))
    }

    /// Names of all fields, in lexicographic order
    pub fn field_names(&self) -> Vec<String> {
        self.fields.keys().cloned().collect()
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the event has no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Wipe every field's bytes, then drop all fields
    ///
    /// Explicit end-of-life operation for events carrying confidential
    /// content.
    pub fn clear(&mut self) {
        for field in self.fields.values_mut() {
            field.clear();
        }
        self.fields.clear();
    }

    /// Serialize to `{"version":"1.0","fields":{name:value,...}}`
    ///
    /// Field values are decoded with the caller-named text charset and
    /// embedded as JSON-escaped strings. Decoded scratch buffers are wiped
    /// before this returns; the returned string is the caller's to manage.
    pub fn to_json(&self, charset: &str) -> Result<String> {
        // Fail on a bad charset before any content is decoded
        resolve_charset(charset)?;

        let mut out = String::with_capacity(32 + self.fields.len() * 32);
        out.push_str("{\"version\":\"");
        out.push_str(RECORD_FORMAT_VERSION);
        out.push_str("\",\"fields\":{");
        for (i, field) in self.fields.values().enumerate() {
            if i > 0 {
                out.push(',');
            }
            let name_json = serde_json::to_string(field.name())
                .map_err(|e| AuditError::unknown_with("failed to render field name", e))?;
            let text = Zeroizing::new(field.char_value(charset)?);
            let value_json = Zeroizing::new(
                serde_json::to_string(text.as_str())
                    .map_err(|e| AuditError::unknown_with("failed to render field value", e))?,
            );
            out.push_str(&name_json);
            out.push(':');
            out.push_str(&value_json);
        }
        out.push_str("}}");
        Ok(out)
    }
}
