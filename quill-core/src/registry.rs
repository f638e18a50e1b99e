//! Processor and audit registries
//!
//! The original "configure components by class name" extensibility goal,
//! without reflection: each registry is an explicit map from a configuration
//! name to a constructor function, populated at startup. Built-in components
//! are pre-registered; embedding applications add their own with
//! [`register_processor`] / [`register_audit`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock, PoisonError, RwLock};

use crate::engine::{Audit, SyncAudit};
use crate::error::{AuditError, Result};
use crate::event_id::EventIdProcessor;
use crate::processor::Processor;
use crate::properties::CommonProperties;

/// Constructor function for a processor
pub type ProcessorCtor = fn() -> Box<dyn Processor>;
/// Constructor function for an audit implementation
pub type AuditCtor = fn() -> Box<dyn Audit>;

static PROCESSORS: OnceLock<RwLock<HashMap<String, ProcessorCtor>>> = OnceLock::new();
static AUDITS: OnceLock<RwLock<HashMap<String, AuditCtor>>> = OnceLock::new();

fn processor_map() -> &'static RwLock<HashMap<String, ProcessorCtor>> {
    PROCESSORS.get_or_init(|| {
        let mut map: HashMap<String, ProcessorCtor> = HashMap::new();
        map.insert(EventIdProcessor::NAME.to_string(), EventIdProcessor::boxed);
        RwLock::new(map)
    })
}

fn audit_map() -> &'static RwLock<HashMap<String, AuditCtor>> {
    AUDITS.get_or_init(|| {
        let mut map: HashMap<String, AuditCtor> = HashMap::new();
        map.insert(SyncAudit::NAME.to_string(), SyncAudit::boxed);
        RwLock::new(map)
    })
}

/// Register a processor constructor under a configuration name
///
/// Re-registering a name replaces the previous constructor.
pub fn register_processor(name: impl Into<String>, ctor: ProcessorCtor) {
    processor_map()
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(name.into(), ctor);
}

/// Register an audit implementation constructor under a configuration name
pub fn register_audit(name: impl Into<String>, ctor: AuditCtor) {
    audit_map()
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(name.into(), ctor);
}

/// Construct and initialize a fresh processor instance by registry name
///
/// Every call produces a new instance; configured chains never share
/// processor state by accident.
pub fn processor_instance(name: &str, properties: &CommonProperties) -> Result<Box<dyn Processor>> {
    let ctor = processor_map()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(name)
        .copied()
        .ok_or_else(|| {
            AuditError::initialization(format!("no processor registered under `{name}`"))
        })?;

    let mut processor = ctor();
    processor.init(properties).map_err(|e| {
        AuditError::initialization_with(format!("processor `{name}` failed to initialize"), e)
    })?;
    Ok(processor)
}

/// Construct and initialize a fresh audit implementation by registry name
pub fn audit_instance(name: &str, properties: &CommonProperties) -> Result<Box<dyn Audit>> {
    let ctor = audit_map()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(name)
        .copied()
        .ok_or_else(|| {
            AuditError::initialization(format!("no audit implementation registered under `{name}`"))
        })?;

    let mut audit = ctor();
    audit.init(properties).map_err(|e| {
        AuditError::initialization_with(
            format!("audit implementation `{name}` failed to initialize"),
            e,
        )
    })?;
    Ok(audit)
}

static SINGLETON: Mutex<Option<Arc<dyn Audit>>> = Mutex::new(None);

/// Entry point for obtaining audit engines from configuration
///
/// `instance` builds a fresh engine per call; `singleton` lazily builds one
/// shared engine per process (first caller's properties win) with an
/// explicit [`AuditFactory::reset`] for tests and reconfiguration.
pub struct AuditFactory;

impl AuditFactory {
    /// A fresh, initialized audit engine per the configured implementation
    pub fn instance(properties: &CommonProperties) -> Result<Box<dyn Audit>> {
        audit_instance(&properties.audit_class, properties)
    }

    /// The shared process-wide audit engine, created on first use
    pub fn singleton(properties: &CommonProperties) -> Result<Arc<dyn Audit>> {
        let mut cell = SINGLETON.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(audit) = cell.as_ref() {
            return Ok(Arc::clone(audit));
        }
        let audit: Arc<dyn Audit> = Arc::from(Self::instance(properties)?);
        *cell = Some(Arc::clone(&audit));
        tracing::info!(
            audit_class = %properties.audit_class,
            "audit singleton created"
        );
        Ok(audit)
    }

    /// Drop the cached singleton; the next [`AuditFactory::singleton`] call
    /// creates a fresh one
    pub fn reset() {
        *SINGLETON.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AuditErrorKind;
    use crate::properties::keys;
    use std::collections::HashMap;

    fn props(pairs: &[(&str, &str)]) -> CommonProperties {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        CommonProperties::from_map(&map)
    }

    #[test]
    fn test_builtin_processor_resolves() {
        let processor = processor_instance("eventid", &CommonProperties::default());
        assert!(processor.is_ok());
    }

    #[test]
    fn test_unknown_names_fail_with_initialization() {
        assert_eq!(
            processor_instance("ghost", &CommonProperties::default())
                .err()
                .unwrap()
                .kind(),
            AuditErrorKind::Initialization
        );
        assert_eq!(
            audit_instance("ghost", &CommonProperties::default())
                .err()
                .unwrap()
                .kind(),
            AuditErrorKind::Initialization
        );
    }

    #[test]
    fn test_failed_init_is_wrapped() {
        use std::error::Error;
        // Invalid event-ID length makes the processor's init fail
        let err = processor_instance(
            "eventid",
            &props(&[("audit.processor.eventId.length", "-1")]),
        )
        .err()
        .unwrap();
        assert_eq!(err.kind(), AuditErrorKind::Initialization);
        assert!(err.source().is_some());
    }

    #[test]
    fn test_factory_builds_distinct_instances() {
        let properties = props(&[(keys::FAIL_ON_MISSING_PROCESSORS, "false")]);
        let a = AuditFactory::instance(&properties).unwrap();
        let b = AuditFactory::instance(&properties).unwrap();
        // Both are live, independent engines
        assert!(a.audit_stream(crate::Event::new(), "s").is_ok());
        assert!(b.audit_stream(crate::Event::new(), "s").is_ok());
    }

    #[test]
    fn test_singleton_lifecycle() {
        let properties = props(&[(keys::FAIL_ON_MISSING_PROCESSORS, "false")]);

        AuditFactory::reset();
        let first = AuditFactory::singleton(&properties).unwrap();
        let second = AuditFactory::singleton(&properties).unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        AuditFactory::reset();
        let third = AuditFactory::singleton(&properties).unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
        AuditFactory::reset();
    }
}
