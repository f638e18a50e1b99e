//! SQL persistence processor
//!
//! Persists the event as one JSON row, plus optional name/value rows for the
//! configured indexed fields, in a single transaction. Requires an event-ID
//! field to already be present (stamped upstream, e.g. by the core event-ID
//! processor); the same ID links the event row and its indexed rows.

use zeroize::Zeroize;
use zeroize::Zeroizing;

use quill_core::processor::validate_audit_stream;
use quill_core::{
    AuditError, CommonProperties, Event, ProcessingObjects, Processor, Result, Reversible,
};

use crate::connection::{
    AuditConnection, ConnectionProvider, DataSourceProvider, ManagedPoolProvider,
    RegistryConnectionProvider,
};
use crate::index::{IndexedField, ValueNormalizer, parse_indexed_fields};
use crate::keys;

/// Default name of the event-ID field this processor requires
pub const DEFAULT_EVENT_ID_FIELD: &str = "eventId";

/// Default statement for the event row: id, stream, JSON payload
pub const DEFAULT_INSERT_EVENT_SQL: &str =
    "INSERT INTO audit_events (event_id, audit_stream, event_json) VALUES (?, ?, ?)";

/// Default statement for one indexed-field row: id, stream, name, value
pub const DEFAULT_INSERT_FIELD_SQL: &str =
    "INSERT INTO audit_event_fields (event_id, audit_stream, field_name, field_value) VALUES (?, ?, ?, ?)";

/// Persists events to a relational store through a pluggable connection
/// strategy
pub struct DbAuditProcessor {
    provider: Box<dyn ConnectionProvider>,
    properties: CommonProperties,
    event_id_field: String,
    insert_event_sql: String,
    insert_field_sql: String,
    indexed_fields: Vec<IndexedField>,
    normalizer: ValueNormalizer,
}

impl DbAuditProcessor {
    /// Registry name: data source from the processing objects
    pub const NAME_DATA_SOURCE: &'static str = "db.dataSource";
    /// Registry name: data source from the process-global registry
    pub const NAME_REGISTRY: &'static str = "db.registry";
    /// Registry name: library-managed pool from connection properties
    pub const NAME_MANAGED: &'static str = "db.managed";

    /// Create a processor with an explicit connection strategy
    pub fn with_provider(provider: Box<dyn ConnectionProvider>) -> Self {
        Self {
            provider,
            properties: CommonProperties::default(),
            event_id_field: DEFAULT_EVENT_ID_FIELD.into(),
            insert_event_sql: DEFAULT_INSERT_EVENT_SQL.into(),
            insert_field_sql: DEFAULT_INSERT_FIELD_SQL.into(),
            indexed_fields: Vec::new(),
            normalizer: ValueNormalizer::default(),
        }
    }

    /// Constructor for the registry, processing-objects strategy
    pub fn boxed_data_source() -> Box<dyn Processor> {
        Box::new(Self::with_provider(Box::new(DataSourceProvider::new())))
    }

    /// Constructor for the registry, data-source-registry strategy
    pub fn boxed_registry() -> Box<dyn Processor> {
        Box::new(Self::with_provider(Box::new(
            RegistryConnectionProvider::new(),
        )))
    }

    /// Constructor for the registry, managed-pool strategy
    pub fn boxed_managed() -> Box<dyn Processor> {
        Box::new(Self::with_provider(Box::new(ManagedPoolProvider::new())))
    }

    /// Collect the configured indexed fields present on the event
    ///
    /// Absent fields are skipped; present values are normalized. Row layout
    /// matches the indexed-field insert statement.
    fn indexed_rows(&self, event: &Event, event_id: &str, audit_stream: &str) -> Result<Vec<Vec<String>>> {
        let mut rows = Vec::new();
        for entry in &self.indexed_fields {
            if !event.contains_field(&entry.field) {
                tracing::debug!(field = %entry.field, "indexed field absent on event, skipping");
                continue;
            }
            let field = event.get_field(&entry.field)?;
            let raw = Zeroizing::new(field.char_value(&self.properties.encoding)?);
            let value = self.normalizer.normalize(&raw);
            rows.push(vec![
                event_id.to_string(),
                audit_stream.to_string(),
                entry.alias.clone(),
                value,
            ]);
        }
        Ok(rows)
    }

    fn write_rows(
        &self,
        conn: &mut dyn AuditConnection,
        event_id: &str,
        audit_stream: &str,
        json: &str,
        rows: &[Vec<String>],
    ) -> Result<()> {
        conn.execute(&self.insert_event_sql, &[event_id, audit_stream, json])
            .map_err(|e| AuditError::processing_with("failed to insert audit event row", e))?;
        if !rows.is_empty() {
            conn.execute_batch(&self.insert_field_sql, rows)
                .map_err(|e| AuditError::processing_with("failed to insert indexed field rows", e))?;
        }
        Ok(())
    }

    /// Run the insert-commit sequence, rolling back on any failure
    ///
    /// A rollback failure is reported alongside, and never masks, the
    /// primary failure.
    fn persist(
        &self,
        conn: &mut dyn AuditConnection,
        event_id: &str,
        audit_stream: &str,
        json: &str,
        rows: &[Vec<String>],
    ) -> Result<()> {
        conn.begin()
            .map_err(|e| AuditError::processing_with("failed to open audit transaction", e))?;

        let outcome = self
            .write_rows(conn, event_id, audit_stream, json, rows)
            .and_then(|()| {
                conn.commit().map_err(|e| {
                    AuditError::processing_with("failed to commit audit transaction", e)
                })
            });

        match outcome {
            Ok(()) => Ok(()),
            Err(primary) => match conn.rollback() {
                Ok(()) => Err(primary),
                Err(rollback_err) => Err(AuditError::Processing {
                    message: format!(
                        "audit transaction failed and rollback also failed: {rollback_err}"
                    ),
                    source: Some(Box::new(primary)),
                }),
            },
        }
    }
}

impl Processor for DbAuditProcessor {
    fn init(&mut self, properties: &CommonProperties) -> Result<()> {
        self.provider.init(properties)?;

        self.event_id_field = properties
            .get_or(keys::EVENT_ID_FIELD_NAME, DEFAULT_EVENT_ID_FIELD)
            .trim()
            .to_string();
        if self.event_id_field.is_empty() {
            return Err(AuditError::configuration(format!(
                "`{}` must not be blank",
                keys::EVENT_ID_FIELD_NAME
            )));
        }

        self.insert_event_sql = properties
            .get_or(keys::INSERT_EVENT_SQL, DEFAULT_INSERT_EVENT_SQL)
            .to_string();
        self.insert_field_sql = properties
            .get_or(keys::INSERT_FIELD_SQL, DEFAULT_INSERT_FIELD_SQL)
            .to_string();

        let separator_raw = properties.get_or(keys::INDEXED_FIELD_SEPARATOR, ",");
        let mut separator_chars = separator_raw.chars();
        let separator = match (separator_chars.next(), separator_chars.next()) {
            (Some(c), None) => c,
            _ => {
                return Err(AuditError::configuration(format!(
                    "`{}` must be a single character, got `{separator_raw}`",
                    keys::INDEXED_FIELD_SEPARATOR
                )));
            }
        };

        self.indexed_fields = match properties.get(keys::INDEXED_FIELDS) {
            Some(spec) => parse_indexed_fields(spec, separator)?,
            None => Vec::new(),
        };

        self.normalizer = ValueNormalizer {
            to_lowercase: properties
                .get_parsed::<bool>(keys::INDEXED_FIELDS_TO_LOWER)
                .map_err(|message| AuditError::configuration(message))?
                .unwrap_or(false),
            max_length: properties
                .get_parsed::<usize>(keys::INDEXED_FIELD_MAX_LENGTH)
                .map_err(|message| AuditError::configuration(message))?,
        };

        self.properties = properties.clone();
        Ok(())
    }

    fn process(
        &self,
        event: Event,
        audit_stream: &str,
        processing_objects: &ProcessingObjects,
    ) -> Result<Event> {
        validate_audit_stream(audit_stream)?;

        if !event.contains_field(&self.event_id_field) {
            return Err(AuditError::configuration(format!(
                "event is missing the required `{}` field (is an event-ID processor configured upstream?)",
                self.event_id_field
            )));
        }
        let event_id = event
            .get_field(&self.event_id_field)?
            .char_value(&self.properties.encoding)?;

        let json = Zeroizing::new(event.to_json(&self.properties.encoding)?);
        let mut rows = self.indexed_rows(&event, &event_id, audit_stream)?;

        let mut conn = self.provider.connection(&self.properties, processing_objects)?;
        let result = self.persist(&mut *conn, &event_id, audit_stream, &json, &rows);

        // Indexed values may be confidential; wipe the scratch rows on
        // every path before surfacing the outcome
        for row in rows.iter_mut() {
            for cell in row.iter_mut() {
                cell.zeroize();
            }
        }
        result?;

        tracing::debug!(
            audit_stream,
            event_id = %event_id,
            indexed = self.indexed_fields.len(),
            "audit event persisted"
        );
        Ok(event)
    }

    fn as_reversible(&self) -> Option<&dyn Reversible> {
        Some(self)
    }
}

impl Reversible for DbAuditProcessor {
    /// Persistence is not undone; reverting is deliberately a no-op
    fn revert(&self, event: Event) -> Result<Event> {
        Ok(event)
    }
}
