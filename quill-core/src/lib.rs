//! Quill core — pluggable audit-event library
//!
//! Applications build an [`Event`] of named [`Field`]s and push it through a
//! configured chain of [`Processor`]s (ID stamping, persistence, ...). The
//! chain is synchronous and fail-fast; thread safety comes from ownership
//! and copy-in/copy-out, not locking. Field content is treated as
//! confidential: buffers are copied across every API boundary and zeroed on
//! clear and drop.

pub mod builder;
pub mod engine;
pub mod error;
pub mod event;
pub mod event_id;
pub mod extended;
pub mod field;
pub mod processing;
pub mod processor;
pub mod properties;
pub mod registry;

// Re-exports
pub use builder::EventBuilder;
pub use engine::{Audit, SyncAudit};
pub use error::{AuditError, AuditErrorKind, Result};
pub use event::{Event, RECORD_FORMAT_VERSION};
pub use event_id::EventIdProcessor;
pub use extended::ExtendedEvent;
pub use field::{Encoding, Field};
pub use processing::ProcessingObjects;
pub use processor::{Processor, Reversible};
pub use properties::{CommonProperties, FieldNames};
pub use registry::{AuditFactory, register_audit, register_processor};
