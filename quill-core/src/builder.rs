//! Event builder
//!
//! Convenience accumulator for assembling an [`Event`] field by field, with
//! the same well-known setters as [`ExtendedEvent`](crate::ExtendedEvent).
//! Setters chain; the accumulated event is observable between calls.

use crate::error::Result;
use crate::event::Event;
use crate::field::{Encoding, Field};
use crate::properties::{CommonProperties, FieldNames};

/// Accumulates fields into an [`Event`]
#[derive(Debug, Clone, Default)]
pub struct EventBuilder {
    event: Event,
    names: FieldNames,
}

impl EventBuilder {
    /// Create a builder, resolving well-known field names from configuration
    pub fn new(properties: &CommonProperties) -> Self {
        Self {
            event: Event::new(),
            names: properties.field_names.clone(),
        }
    }

    /// Create a builder with explicit field names
    pub fn with_names(names: FieldNames) -> Self {
        Self {
            event: Event::new(),
            names,
        }
    }

    /// Set a field by raw name and bytes
    pub fn set_field(&mut self, name: &str, value: &[u8]) -> Result<&mut Self> {
        let field = Field::new(name, value)?;
        self.event.set_field(field);
        Ok(self)
    }

    /// Set a field by raw name, bytes, and encoding tag
    pub fn set_field_encoded(
        &mut self,
        name: &str,
        value: &[u8],
        encoding: Encoding,
    ) -> Result<&mut Self> {
        let field = Field::with_encoding(name, value, encoding)?;
        self.event.set_field(field);
        Ok(self)
    }

    /// Set a field from text (UTF-8 bytes)
    pub fn set_chars(&mut self, name: &str, value: &str) -> Result<&mut Self> {
        self.set_field(name, value.as_bytes())
    }

    // ==================== Well-known setters ====================

    pub fn set_event_type(&mut self, value: &[u8]) -> Result<&mut Self> {
        let name = self.names.event_type.clone();
        self.set_field(&name, value)
    }

    pub fn set_event_group(&mut self, value: &[u8]) -> Result<&mut Self> {
        let name = self.names.event_group.clone();
        self.set_field(&name, value)
    }

    pub fn set_actor(&mut self, value: &[u8]) -> Result<&mut Self> {
        let name = self.names.actor.clone();
        self.set_field(&name, value)
    }

    pub fn set_subject(&mut self, value: &[u8]) -> Result<&mut Self> {
        let name = self.names.subject.clone();
        self.set_field(&name, value)
    }

    pub fn set_object(&mut self, value: &[u8]) -> Result<&mut Self> {
        let name = self.names.object.clone();
        self.set_field(&name, value)
    }

    pub fn set_content_before(&mut self, value: &[u8]) -> Result<&mut Self> {
        let name = self.names.content_before.clone();
        self.set_field(&name, value)
    }

    pub fn set_content_after(&mut self, value: &[u8]) -> Result<&mut Self> {
        let name = self.names.content_after.clone();
        self.set_field(&name, value)
    }

    pub fn set_result(&mut self, value: &[u8]) -> Result<&mut Self> {
        let name = self.names.result.clone();
        self.set_field(&name, value)
    }

    pub fn set_result_summary(&mut self, value: &[u8]) -> Result<&mut Self> {
        let name = self.names.result_summary.clone();
        self.set_field(&name, value)
    }

    pub fn set_event_summary(&mut self, value: &[u8]) -> Result<&mut Self> {
        let name = self.names.event_summary.clone();
        self.set_field(&name, value)
    }

    /// The accumulated event so far
    ///
    /// Always the same underlying event, reflecting the latest state.
    pub fn event(&self) -> &Event {
        &self.event
    }

    /// Finish, taking ownership of the accumulated event
    pub fn into_event(self) -> Event {
        self.event
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_accumulates() {
        let props = CommonProperties::default();
        let mut builder = EventBuilder::new(&props);
        builder
            .set_actor(b"alice")
            .unwrap()
            .set_subject(b"invoice-99")
            .unwrap()
            .set_chars("note", "paid in full")
            .unwrap();

        let event = builder.into_event();
        assert_eq!(event.len(), 3);
        assert_eq!(event.get_field("actor").unwrap().value(), b"alice");
        assert_eq!(event.get_field("note").unwrap().value(), b"paid in full");
    }

    #[test]
    fn test_event_reflects_latest_state() {
        let props = CommonProperties::default();
        let mut builder = EventBuilder::new(&props);
        builder.set_actor(b"alice").unwrap();
        assert_eq!(builder.event().len(), 1);
        builder.set_actor(b"bob").unwrap();
        assert_eq!(builder.event().len(), 1);
        assert_eq!(builder.event().get_field("actor").unwrap().value(), b"bob");
    }

    #[test]
    fn test_blank_name_rejected() {
        let props = CommonProperties::default();
        let mut builder = EventBuilder::new(&props);
        assert!(builder.set_field("  ", b"x").is_err());
    }

    #[test]
    fn test_encoded_field() {
        let props = CommonProperties::default();
        let mut builder = EventBuilder::new(&props);
        builder
            .set_field_encoded("blob", b"aGk=", Encoding::Base64)
            .unwrap();
        assert_eq!(
            builder.event().get_field("blob").unwrap().encoding(),
            Encoding::Base64
        );
    }
}
