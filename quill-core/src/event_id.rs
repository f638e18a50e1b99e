//! Event-ID processor
//!
//! Stamps a random ASCII identifier onto the event so downstream processors
//! (persistence, indexing) can correlate rows for the same event. Runs at
//! most once per event in a given chain: a second run is a processing error,
//! not a silent overwrite.

use rand::Rng;
use rand::distributions::Alphanumeric;

use crate::error::{AuditError, Result};
use crate::event::Event;
use crate::field::Field;
use crate::processing::ProcessingObjects;
use crate::processor::{Processor, Reversible, validate_audit_stream};
use crate::properties::CommonProperties;

/// Configuration keys for [`EventIdProcessor`]
pub mod keys {
    /// Name of the field the identifier is stored under
    pub const FIELD_NAME: &str = "audit.processor.eventId.fieldName";
    /// Identifier length in characters
    pub const LENGTH: &str = "audit.processor.eventId.length";
}

/// Default name of the event-ID field
pub const DEFAULT_FIELD_NAME: &str = "eventId";
/// Default identifier length
pub const DEFAULT_LENGTH: usize = 32;

/// Adds a random alphanumeric identifier field to the event
#[derive(Debug, Clone)]
pub struct EventIdProcessor {
    field_name: String,
    length: usize,
}

impl EventIdProcessor {
    /// Registry name of this processor
    pub const NAME: &'static str = "eventid";

    pub fn new() -> Self {
        Self {
            field_name: DEFAULT_FIELD_NAME.into(),
            length: DEFAULT_LENGTH,
        }
    }

    /// Constructor for the processor registry
    pub fn boxed() -> Box<dyn Processor> {
        Box::new(Self::new())
    }

    /// The configured event-ID field name
    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    fn generate_id(&self) -> String {
        rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(self.length)
            .map(char::from)
            .collect()
    }
}

impl Default for EventIdProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl Processor for EventIdProcessor {
    fn init(&mut self, properties: &CommonProperties) -> Result<()> {
        if let Some(name) = properties.get(keys::FIELD_NAME) {
            if name.trim().is_empty() {
                return Err(AuditError::configuration(format!(
                    "`{}` must not be blank",
                    keys::FIELD_NAME
                )));
            }
            self.field_name = name.trim().to_string();
        }
        match properties.get_parsed::<usize>(keys::LENGTH) {
            Ok(None) => {}
            Ok(Some(0)) => {
                return Err(AuditError::configuration(format!(
                    "`{}` must be greater than zero",
                    keys::LENGTH
                )));
            }
            Ok(Some(length)) => self.length = length,
            Err(message) => return Err(AuditError::configuration(message)),
        }
        Ok(())
    }

    fn process(
        &self,
        mut event: Event,
        audit_stream: &str,
        _processing_objects: &ProcessingObjects,
    ) -> Result<Event> {
        validate_audit_stream(audit_stream)?;

        if event.contains_field(&self.field_name) {
            return Err(AuditError::processing(format!(
                "event already carries an `{}` field",
                self.field_name
            )));
        }

        let id = self.generate_id();
        event.set_field(Field::new(self.field_name.clone(), id.as_bytes())?);
        tracing::debug!(audit_stream, event_id = %id, "stamped event identifier");
        Ok(event)
    }

    fn as_reversible(&self) -> Option<&dyn Reversible> {
        Some(self)
    }
}

impl Reversible for EventIdProcessor {
    /// Remove the identifier field; absence is a no-op, not a failure
    fn revert(&self, mut event: Event) -> Result<Event> {
        event.unset_field(&self.field_name);
        Ok(event)
    }
}
