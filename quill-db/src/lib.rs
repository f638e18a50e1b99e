//! Quill DB — SQL persistence for the Quill audit chain
//!
//! Provides the [`DbAuditProcessor`] pipeline stage (event row + indexed
//! field rows in one transaction) and the pluggable connection strategies it
//! acquires connections through. Drivers are not part of this crate: the
//! embedding application supplies them behind the [`AuditConnection`]
//! capability.

pub mod connection;
pub mod index;
pub mod processor;

// Re-exports
pub use connection::{
    AuditConnection, BoxError, ConnectionPool, ConnectionProvider, Connector, DataSource,
    DataSourceProvider, ManagedPool, ManagedPoolProvider, RegistryConnectionProvider,
    register_connector, register_data_source, unregister_data_source,
};
pub use index::{IndexedField, ValueNormalizer};
pub use processor::DbAuditProcessor;

/// Configuration keys for the persistence processor
pub mod keys {
    /// Name of the event field carrying the event identifier
    pub const EVENT_ID_FIELD_NAME: &str = "audit.processor.db.eventIdFieldName";
    /// Statement for the event row (id, stream, JSON payload)
    pub const INSERT_EVENT_SQL: &str = "audit.processor.db.insertEventSql";
    /// Statement for one indexed-field row (id, stream, name, value)
    pub const INSERT_FIELD_SQL: &str = "audit.processor.db.insertFieldSql";
    /// Delimited `field[:alias]` list of fields to index
    pub const INDEXED_FIELDS: &str = "audit.processor.db.indexedFields";
    /// Single-character delimiter for the indexed-field list
    pub const INDEXED_FIELD_SEPARATOR: &str = "audit.processor.db.indexedFieldSeparator";
    /// Cap on indexed value length, in characters
    pub const INDEXED_FIELD_MAX_LENGTH: &str = "audit.processor.db.indexedFieldMaxLength";
    /// Whether indexed values are lowercased before storage
    pub const INDEXED_FIELDS_TO_LOWER: &str = "audit.processor.db.indexedFieldsToLower";
    /// Name of the data source (processing-objects and registry strategies)
    pub const DATA_SOURCE_NAME: &str = "audit.processor.db.dataSourceName";
    /// Name of the registered connector (managed-pool strategy)
    pub const CONNECTOR_NAME: &str = "audit.processor.db.connectorName";
    /// Cap on idle connections kept by the managed pool
    pub const POOL_MAX_IDLE: &str = "audit.processor.db.pool.maxIdle";
}

/// Register the persistence processor under its strategy names
///
/// Call once at application startup, before audit configuration referring
/// to the `db.*` processors is resolved.
pub fn register() {
    quill_core::register_processor(
        DbAuditProcessor::NAME_DATA_SOURCE,
        DbAuditProcessor::boxed_data_source,
    );
    quill_core::register_processor(
        DbAuditProcessor::NAME_REGISTRY,
        DbAuditProcessor::boxed_registry,
    );
    quill_core::register_processor(
        DbAuditProcessor::NAME_MANAGED,
        DbAuditProcessor::boxed_managed,
    );
}
