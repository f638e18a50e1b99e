//! Synchronous audit engine
//!
//! [`SyncAudit`] resolves the configured processor chain and feeds events
//! through it, in order, on the caller's thread. There is no queueing and no
//! error recovery: the first processor failure aborts the rest of the chain.

use std::sync::{Arc, PoisonError, RwLock};

use crate::error::{AuditError, Result};
use crate::event::Event;
use crate::processing::ProcessingObjects;
use crate::processor::{Processor, validate_audit_stream};
use crate::properties::CommonProperties;
use crate::registry;

/// An audit implementation, resolvable from configuration by registry name
pub trait Audit: Send + Sync {
    /// Resolve configuration and build the processor chain
    fn init(&mut self, properties: &CommonProperties) -> Result<()>;

    /// Audit an event on the configured default stream
    ///
    /// Fails with a configuration error when no default stream is
    /// configured. A fresh, empty set of processing objects is used.
    fn audit(&self, event: Event) -> Result<Event>;

    /// Audit an event on an explicit stream
    fn audit_stream(&self, event: Event, audit_stream: &str) -> Result<Event>;

    /// Audit an event on an explicit stream with caller-supplied objects
    fn audit_with(
        &self,
        event: Event,
        audit_stream: &str,
        processing_objects: &ProcessingObjects,
    ) -> Result<Event>;

    /// Tear down the processor chain, releasing processor resources
    fn clean_up(&mut self);
}

type Chain = Arc<Vec<Box<dyn Processor>>>;

/// Synchronous, in-process audit engine
///
/// Thread safety: the processor chain is an immutable list behind an
/// atomically swapped reference. `audit*` calls clone the reference and run
/// on a consistent snapshot, so a concurrent re-`init` never tears a chain
/// mid-flight. The processors themselves must uphold their own thread-safety
/// contract.
pub struct SyncAudit {
    properties: CommonProperties,
    processors: RwLock<Chain>,
}

impl SyncAudit {
    /// Registry name of this implementation
    pub const NAME: &'static str = "sync";

    /// Create an engine with default properties and an empty chain
    pub fn new() -> Self {
        Self {
            properties: CommonProperties::default(),
            processors: RwLock::new(Arc::new(Vec::new())),
        }
    }

    /// Constructor for the audit registry
    pub fn boxed() -> Box<dyn Audit> {
        Box::new(Self::new())
    }

    /// Split a processor list specification into usable names
    ///
    /// A missing value, an empty string, and a list that trims down to
    /// nothing all produce the same result: no names.
    fn processor_names(spec: Option<&str>) -> Vec<&str> {
        spec.map(|s| {
            s.split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .collect()
        })
        .unwrap_or_default()
    }

    fn snapshot(&self) -> Chain {
        Arc::clone(
            &self
                .processors
                .read()
                .unwrap_or_else(PoisonError::into_inner),
        )
    }

    fn run(&self, mut event: Event, audit_stream: &str, objects: &ProcessingObjects) -> Result<Event> {
        let chain = self.snapshot();

        if chain.is_empty() {
            if self.properties.fail_on_missing_processors {
                return Err(AuditError::configuration(
                    "no audit processors are configured",
                ));
            }
            tracing::warn!(audit_stream, "no audit processors configured, event passed through unchanged");
            return Ok(event);
        }

        for processor in chain.iter() {
            event = processor.process(event, audit_stream, objects)?;
        }
        Ok(event)
    }
}

impl Default for SyncAudit {
    fn default() -> Self {
        Self::new()
    }
}

impl Audit for SyncAudit {
    fn init(&mut self, properties: &CommonProperties) -> Result<()> {
        let names = Self::processor_names(properties.processors.as_deref());

        let mut chain: Vec<Box<dyn Processor>> = Vec::with_capacity(names.len());
        for name in &names {
            chain.push(registry::processor_instance(name, properties)?);
        }

        tracing::info!(
            processors = chain.len(),
            default_stream = properties.default_audit_stream.as_deref().unwrap_or("<none>"),
            "audit chain initialized"
        );

        self.properties = properties.clone();
        *self
            .processors
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Arc::new(chain);
        Ok(())
    }

    fn audit(&self, event: Event) -> Result<Event> {
        let stream = self
            .properties
            .default_audit_stream
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| {
                AuditError::configuration(
                    "no audit stream given and no default audit stream configured",
                )
            })?
            .to_string();
        self.run(event, &stream, &ProcessingObjects::new())
    }

    fn audit_stream(&self, event: Event, audit_stream: &str) -> Result<Event> {
        validate_audit_stream(audit_stream)?;
        self.run(event, audit_stream, &ProcessingObjects::new())
    }

    fn audit_with(
        &self,
        event: Event,
        audit_stream: &str,
        processing_objects: &ProcessingObjects,
    ) -> Result<Event> {
        validate_audit_stream(audit_stream)?;
        self.run(event, audit_stream, processing_objects)
    }

    fn clean_up(&mut self) {
        let chain = {
            let mut guard = self
                .processors
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            std::mem::replace(&mut *guard, Arc::new(Vec::new()))
        };
        // In-flight snapshots keep the old chain alive; the last holder
        // drops it. Clean-up only runs when this engine held the last one.
        if let Ok(mut chain) = Arc::try_unwrap(chain) {
            for processor in chain.iter_mut() {
                processor.clean_up();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AuditErrorKind;
    use crate::field::Field;
    use crate::properties::keys;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn props(pairs: &[(&str, &str)]) -> CommonProperties {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        CommonProperties::from_map(&map)
    }

    /// Appends its instance counter to the event, so tests can see chain
    /// order and instance identity
    struct TaggingProcessor {
        tag: usize,
    }

    static NEXT_TAG: AtomicUsize = AtomicUsize::new(0);

    impl TaggingProcessor {
        fn boxed() -> Box<dyn Processor> {
            Box::new(Self {
                tag: NEXT_TAG.fetch_add(1, Ordering::SeqCst),
            })
        }
    }

    impl Processor for TaggingProcessor {
        fn init(&mut self, _properties: &CommonProperties) -> Result<()> {
            Ok(())
        }

        fn process(
            &self,
            mut event: Event,
            audit_stream: &str,
            _objects: &ProcessingObjects,
        ) -> Result<Event> {
            validate_audit_stream(audit_stream)?;
            let name = format!("tag_{}", self.tag);
            event.set_field(Field::new(name, audit_stream.as_bytes())?);
            Ok(event)
        }
    }

    fn register_tagging() {
        registry::register_processor("tagging", TaggingProcessor::boxed);
    }

    #[test]
    fn test_processor_names_unified_empty_handling() {
        assert!(SyncAudit::processor_names(None).is_empty());
        assert!(SyncAudit::processor_names(Some("")).is_empty());
        assert!(SyncAudit::processor_names(Some("  ,  , ")).is_empty());
        assert_eq!(
            SyncAudit::processor_names(Some(" a , b,c ")),
            vec!["a", "b", "c"]
        );
    }

    #[test]
    fn test_empty_chain_passes_event_through_when_permitted() {
        let mut audit = SyncAudit::new();
        audit
            .init(&props(&[
                (keys::DEFAULT_AUDIT_STREAM, "default"),
                (keys::FAIL_ON_MISSING_PROCESSORS, "false"),
            ]))
            .unwrap();

        let mut event = Event::new();
        event.set_field(Field::new("k", b"v").unwrap());
        let out = audit.audit(event).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out.get_field("k").unwrap().value(), b"v");
    }

    #[test]
    fn test_empty_chain_fails_when_strict() {
        let mut audit = SyncAudit::new();
        audit
            .init(&props(&[(keys::DEFAULT_AUDIT_STREAM, "default")]))
            .unwrap();

        let err = audit.audit(Event::new()).unwrap_err();
        assert_eq!(err.kind(), AuditErrorKind::Configuration);
    }

    #[test]
    fn test_missing_stream_is_configuration_error() {
        let mut audit = SyncAudit::new();
        audit
            .init(&props(&[(keys::FAIL_ON_MISSING_PROCESSORS, "false")]))
            .unwrap();
        let err = audit.audit(Event::new()).unwrap_err();
        assert_eq!(err.kind(), AuditErrorKind::Configuration);
    }

    #[test]
    fn test_blank_stream_is_invalid_argument() {
        let mut audit = SyncAudit::new();
        audit
            .init(&props(&[(keys::FAIL_ON_MISSING_PROCESSORS, "false")]))
            .unwrap();
        let err = audit.audit_stream(Event::new(), "  ").unwrap_err();
        assert_eq!(err.kind(), AuditErrorKind::InvalidArgument);
    }

    #[test]
    fn test_unknown_processor_fails_init() {
        let mut audit = SyncAudit::new();
        let err = audit
            .init(&props(&[(keys::PROCESSORS, "no-such-processor")]))
            .unwrap_err();
        assert_eq!(err.kind(), AuditErrorKind::Initialization);
    }

    #[test]
    fn test_duplicate_processor_entries_get_distinct_instances() {
        register_tagging();
        let mut audit = SyncAudit::new();
        audit
            .init(&props(&[
                (keys::PROCESSORS, "tagging, tagging"),
                (keys::DEFAULT_AUDIT_STREAM, "orders"),
            ]))
            .unwrap();

        let out = audit.audit(Event::new()).unwrap();
        // Two distinct instances → two distinct tag fields
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_chain_runs_in_order_and_sees_stream() {
        register_tagging();
        let mut audit = SyncAudit::new();
        audit
            .init(&props(&[(keys::PROCESSORS, "tagging")]))
            .unwrap();

        let out = audit.audit_stream(Event::new(), "payments").unwrap();
        let names = out.field_names();
        assert_eq!(names.len(), 1);
        assert_eq!(out.get_field(&names[0]).unwrap().value(), b"payments");
    }

    #[test]
    fn test_clean_up_empties_chain() {
        register_tagging();
        let mut audit = SyncAudit::new();
        audit
            .init(&props(&[
                (keys::PROCESSORS, "tagging"),
                (keys::FAIL_ON_MISSING_PROCESSORS, "false"),
                (keys::DEFAULT_AUDIT_STREAM, "s"),
            ]))
            .unwrap();
        audit.clean_up();
        // Chain is empty now; lenient mode passes the event through
        let out = audit.audit(Event::new()).unwrap();
        assert!(out.is_empty());
    }
}
