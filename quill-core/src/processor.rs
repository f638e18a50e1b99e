//! Processor contract
//!
//! A processor is one stage of the audit chain: it receives the event, may
//! mutate it, and hands it on. Processors are resolved from configuration by
//! registry name (see [`crate::registry`]) and initialized once before the
//! chain is published.

use crate::error::{AuditError, Result};
use crate::event::Event;
use crate::processing::ProcessingObjects;
use crate::properties::CommonProperties;

/// A pipeline stage that inspects or mutates an [`Event`]
///
/// Implementations must be thread-safe: once the chain is published,
/// `process` may be called from any number of threads concurrently.
pub trait Processor: Send + Sync {
    /// Configure this instance before it joins a chain
    fn init(&mut self, properties: &CommonProperties) -> Result<()>;

    /// Handle one event
    ///
    /// The returned event (possibly modified, possibly the input unchanged)
    /// becomes the input of the next processor in the chain.
    fn process(
        &self,
        event: Event,
        audit_stream: &str,
        processing_objects: &ProcessingObjects,
    ) -> Result<Event>;

    /// Release resources held by this instance
    ///
    /// Called when the owning engine is torn down. Default: nothing to do.
    fn clean_up(&mut self) {}

    /// This processor's undo capability, if it has one
    fn as_reversible(&self) -> Option<&dyn Reversible> {
        None
    }
}

/// Capability to undo a processor's own prior modification to an event
///
/// Used for compensating actions driven by the caller; the engine never
/// reverts automatically on failure.
pub trait Reversible {
    /// Undo this processor's modification
    fn revert(&self, event: Event) -> Result<Event>;
}

/// Validate a caller-supplied audit stream name
pub fn validate_audit_stream(audit_stream: &str) -> Result<()> {
    if audit_stream.trim().is_empty() {
        return Err(AuditError::invalid_argument(
            "auditStream",
            "must not be blank",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AuditErrorKind;

    #[test]
    fn test_validate_audit_stream() {
        assert!(validate_audit_stream("payments").is_ok());
        assert_eq!(
            validate_audit_stream("").unwrap_err().kind(),
            AuditErrorKind::InvalidArgument
        );
        assert_eq!(
            validate_audit_stream("   ").unwrap_err().kind(),
            AuditErrorKind::InvalidArgument
        );
    }
}
