//! Library configuration
//!
//! Configuration arrives as a flat string-to-string map (how it is loaded —
//! env, file, database — is the embedding application's business). Well-known
//! keys are parsed into [`CommonProperties`] once; everything else stays
//! reachable through [`CommonProperties::get`] for per-processor keys.

use std::collections::HashMap;

/// Well-known configuration keys
pub mod keys {
    /// Registry name of the audit implementation
    pub const AUDIT_CLASS: &str = "audit.class";
    /// Comma-separated, ordered list of processor registry names
    pub const PROCESSORS: &str = "audit.processors";
    /// Stream used when the caller does not name one
    pub const DEFAULT_AUDIT_STREAM: &str = "audit.defaultAuditStream";
    /// Text charset for rendering field values ("UTF-8", ...)
    pub const ENCODING: &str = "audit.encoding";
    /// Whether an empty processor chain is a configuration error
    pub const FAIL_ON_MISSING_PROCESSORS: &str = "audit.failOnMissingProcessors";

    /// Well-known field name overrides
    pub const FIELD_EVENT_TYPE: &str = "audit.fieldName.eventType";
    pub const FIELD_EVENT_GROUP: &str = "audit.fieldName.eventGroupType";
    pub const FIELD_ACTOR: &str = "audit.fieldName.actor";
    pub const FIELD_SUBJECT: &str = "audit.fieldName.subject";
    pub const FIELD_OBJECT: &str = "audit.fieldName.object";
    pub const FIELD_CONTENT_BEFORE: &str = "audit.fieldName.contentBeforeOperation";
    pub const FIELD_CONTENT_AFTER: &str = "audit.fieldName.contentAfterOperation";
    pub const FIELD_RESULT: &str = "audit.fieldName.result";
    pub const FIELD_RESULT_SUMMARY: &str = "audit.fieldName.resultSummary";
    pub const FIELD_EVENT_SUMMARY: &str = "audit.fieldName.eventSummary";
}

/// Names of the well-known event fields
///
/// Overridable so deployments can match an existing schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldNames {
    pub event_type: String,
    pub event_group: String,
    pub actor: String,
    pub subject: String,
    pub object: String,
    pub content_before: String,
    pub content_after: String,
    pub result: String,
    pub result_summary: String,
    pub event_summary: String,
}

impl Default for FieldNames {
    fn default() -> Self {
        Self {
            event_type: "eventType".into(),
            event_group: "eventGroupType".into(),
            actor: "actor".into(),
            subject: "subject".into(),
            object: "object".into(),
            content_before: "contentBeforeOperation".into(),
            content_after: "contentAfterOperation".into(),
            result: "result".into(),
            result_summary: "resultSummary".into(),
            event_summary: "eventSummary".into(),
        }
    }
}

impl FieldNames {
    /// Build from a flat map, using defaults for absent keys
    pub fn from_map(map: &HashMap<String, String>) -> Self {
        let defaults = Self::default();
        let pick = |key: &str, default: String| -> String {
            map.get(key)
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .unwrap_or(default)
        };
        Self {
            event_type: pick(keys::FIELD_EVENT_TYPE, defaults.event_type),
            event_group: pick(keys::FIELD_EVENT_GROUP, defaults.event_group),
            actor: pick(keys::FIELD_ACTOR, defaults.actor),
            subject: pick(keys::FIELD_SUBJECT, defaults.subject),
            object: pick(keys::FIELD_OBJECT, defaults.object),
            content_before: pick(keys::FIELD_CONTENT_BEFORE, defaults.content_before),
            content_after: pick(keys::FIELD_CONTENT_AFTER, defaults.content_after),
            result: pick(keys::FIELD_RESULT, defaults.result),
            result_summary: pick(keys::FIELD_RESULT_SUMMARY, defaults.result_summary),
            event_summary: pick(keys::FIELD_EVENT_SUMMARY, defaults.event_summary),
        }
    }
}

/// Common configuration shared by the engine and all processors
///
/// Built once from a flat string map; handed to components as a clone, so a
/// component can never observe or cause mutation of another component's
/// configuration.
#[derive(Debug, Clone)]
pub struct CommonProperties {
    /// Registry name of the audit implementation
    pub audit_class: String,
    /// Stream used when the caller does not name one
    pub default_audit_stream: Option<String>,
    /// Text charset for rendering field values
    pub encoding: String,
    /// Whether an empty processor chain is a configuration error
    pub fail_on_missing_processors: bool,
    /// Comma-separated, ordered list of processor registry names
    pub processors: Option<String>,
    /// Well-known field names
    pub field_names: FieldNames,
    /// The full flat map, for per-processor keys
    extra: HashMap<String, String>,
}

impl Default for CommonProperties {
    fn default() -> Self {
        Self {
            audit_class: "sync".into(),
            default_audit_stream: None,
            encoding: "UTF-8".into(),
            fail_on_missing_processors: true,
            processors: None,
            field_names: FieldNames::default(),
            extra: HashMap::new(),
        }
    }
}

impl CommonProperties {
    /// Build from a flat string map
    ///
    /// Absent keys fall back to defaults; unparsable booleans fall back too.
    pub fn from_map(map: &HashMap<String, String>) -> Self {
        let defaults = Self::default();
        Self {
            audit_class: map
                .get(keys::AUDIT_CLASS)
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .unwrap_or(defaults.audit_class),
            default_audit_stream: map
                .get(keys::DEFAULT_AUDIT_STREAM)
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            encoding: map
                .get(keys::ENCODING)
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .unwrap_or(defaults.encoding),
            fail_on_missing_processors: map
                .get(keys::FAIL_ON_MISSING_PROCESSORS)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.fail_on_missing_processors),
            processors: map.get(keys::PROCESSORS).map(|s| s.to_string()),
            field_names: FieldNames::from_map(map),
            extra: map.clone(),
        }
    }

    /// Look up any key from the underlying flat map
    pub fn get(&self, key: &str) -> Option<&str> {
        self.extra.get(key).map(String::as_str)
    }

    /// Look up a key, falling back to a default
    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    /// Look up and parse a key, `None` when absent, error message when present
    /// but unparsable
    pub fn get_parsed<T: std::str::FromStr>(
        &self,
        key: &str,
    ) -> std::result::Result<Option<T>, String> {
        match self.get(key) {
            None => Ok(None),
            Some(raw) => raw
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| format!("invalid value `{raw}` for key `{key}`")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let props = CommonProperties::default();
        assert_eq!(props.audit_class, "sync");
        assert_eq!(props.encoding, "UTF-8");
        assert!(props.fail_on_missing_processors);
        assert!(props.default_audit_stream.is_none());
        assert!(props.processors.is_none());
        assert_eq!(props.field_names.actor, "actor");
    }

    #[test]
    fn test_from_map_overrides() {
        let props = CommonProperties::from_map(&map(&[
            (keys::PROCESSORS, "eventid,db"),
            (keys::DEFAULT_AUDIT_STREAM, "tenant-7"),
            (keys::ENCODING, "ISO-8859-1"),
            (keys::FAIL_ON_MISSING_PROCESSORS, "false"),
            (keys::FIELD_ACTOR, "who"),
        ]));
        assert_eq!(props.processors.as_deref(), Some("eventid,db"));
        assert_eq!(props.default_audit_stream.as_deref(), Some("tenant-7"));
        assert_eq!(props.encoding, "ISO-8859-1");
        assert!(!props.fail_on_missing_processors);
        assert_eq!(props.field_names.actor, "who");
        assert_eq!(props.field_names.subject, "subject");
    }

    #[test]
    fn test_blank_values_fall_back() {
        let props = CommonProperties::from_map(&map(&[
            (keys::DEFAULT_AUDIT_STREAM, "   "),
            (keys::ENCODING, ""),
            (keys::FAIL_ON_MISSING_PROCESSORS, "not-a-bool"),
        ]));
        assert!(props.default_audit_stream.is_none());
        assert_eq!(props.encoding, "UTF-8");
        assert!(props.fail_on_missing_processors);
    }

    #[test]
    fn test_extra_keys_reachable() {
        let props = CommonProperties::from_map(&map(&[("audit.processor.db.maxLength", "200")]));
        assert_eq!(props.get("audit.processor.db.maxLength"), Some("200"));
        assert_eq!(props.get_or("nope", "fallback"), "fallback");
        assert_eq!(
            props.get_parsed::<usize>("audit.processor.db.maxLength"),
            Ok(Some(200))
        );
        assert_eq!(props.get_parsed::<usize>("nope"), Ok(None));
    }

    #[test]
    fn test_get_parsed_rejects_garbage() {
        let props = CommonProperties::from_map(&map(&[("k", "abc")]));
        assert!(props.get_parsed::<usize>("k").is_err());
    }

    #[test]
    fn test_clone_is_independent() {
        let mut a = CommonProperties::default();
        let b = a.clone();
        a.encoding = "ISO-8859-1".into();
        assert_eq!(b.encoding, "UTF-8");
    }
}
