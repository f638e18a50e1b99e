//! Well-known-field event decorator
//!
//! [`ExtendedEvent`] wraps a plain [`Event`] and adds named accessors for the
//! well-known audit fields (actor, subject, object, ...). The target field
//! names come from configuration, so deployments can match an existing
//! schema. This is sugar over the generic field operations — composition, no
//! separate event type.

use crate::error::Result;
use crate::event::Event;
use crate::field::Field;
use crate::properties::{CommonProperties, FieldNames};

/// An [`Event`] plus named accessors for the well-known audit fields
#[derive(Debug, Clone, Default)]
pub struct ExtendedEvent {
    event: Event,
    names: FieldNames,
}

impl ExtendedEvent {
    /// Wrap an event, resolving field names from configuration
    pub fn new(event: Event, properties: &CommonProperties) -> Self {
        Self {
            event,
            names: properties.field_names.clone(),
        }
    }

    /// Wrap an event with explicit field names
    pub fn with_names(event: Event, names: FieldNames) -> Self {
        Self { event, names }
    }

    /// The wrapped event
    pub fn event(&self) -> &Event {
        &self.event
    }

    /// The wrapped event, mutably
    pub fn event_mut(&mut self) -> &mut Event {
        &mut self.event
    }

    /// Unwrap into the plain event
    pub fn into_inner(self) -> Event {
        self.event
    }

    fn set(&mut self, name: &str, value: &[u8]) -> Result<String> {
        let field = Field::new(name, value)?;
        Ok(self.event.set_field(field))
    }

    // ==================== Well-known accessors ====================

    pub fn set_event_type(&mut self, value: &[u8]) -> Result<String> {
        let name = self.names.event_type.clone();
        self.set(&name, value)
    }

    pub fn event_type(&self) -> Result<Field> {
        self.event.get_field(&self.names.event_type)
    }

    pub fn set_event_group(&mut self, value: &[u8]) -> Result<String> {
        let name = self.names.event_group.clone();
        self.set(&name, value)
    }

    pub fn event_group(&self) -> Result<Field> {
        self.event.get_field(&self.names.event_group)
    }

    pub fn set_actor(&mut self, value: &[u8]) -> Result<String> {
        let name = self.names.actor.clone();
        self.set(&name, value)
    }

    pub fn actor(&self) -> Result<Field> {
        self.event.get_field(&self.names.actor)
    }

    pub fn set_subject(&mut self, value: &[u8]) -> Result<String> {
        let name = self.names.subject.clone();
        self.set(&name, value)
    }

    pub fn subject(&self) -> Result<Field> {
        self.event.get_field(&self.names.subject)
    }

    pub fn set_object(&mut self, value: &[u8]) -> Result<String> {
        let name = self.names.object.clone();
        self.set(&name, value)
    }

    pub fn object(&self) -> Result<Field> {
        self.event.get_field(&self.names.object)
    }

    pub fn set_content_before(&mut self, value: &[u8]) -> Result<String> {
        let name = self.names.content_before.clone();
        self.set(&name, value)
    }

    pub fn content_before(&self) -> Result<Field> {
        self.event.get_field(&self.names.content_before)
    }

    pub fn set_content_after(&mut self, value: &[u8]) -> Result<String> {
        let name = self.names.content_after.clone();
        self.set(&name, value)
    }

    pub fn content_after(&self) -> Result<Field> {
        self.event.get_field(&self.names.content_after)
    }

    pub fn set_result(&mut self, value: &[u8]) -> Result<String> {
        let name = self.names.result.clone();
        self.set(&name, value)
    }

    pub fn result(&self) -> Result<Field> {
        self.event.get_field(&self.names.result)
    }

    pub fn set_result_summary(&mut self, value: &[u8]) -> Result<String> {
        let name = self.names.result_summary.clone();
        self.set(&name, value)
    }

    pub fn result_summary(&self) -> Result<Field> {
        self.event.get_field(&self.names.result_summary)
    }

    pub fn set_event_summary(&mut self, value: &[u8]) -> Result<String> {
        let name = self.names.event_summary.clone();
        self.set(&name, value)
    }

    pub fn event_summary(&self) -> Result<Field> {
        self.event.get_field(&self.names.event_summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_accessors_use_default_names() {
        let props = CommonProperties::default();
        let mut extended = ExtendedEvent::new(Event::new(), &props);
        extended.set_actor(b"alice").unwrap();
        extended.set_result(b"ok").unwrap();

        assert_eq!(extended.actor().unwrap().value(), b"alice");
        let event = extended.into_inner();
        assert!(event.contains_field("actor"));
        assert!(event.contains_field("result"));
    }

    #[test]
    fn test_accessors_respect_name_overrides() {
        let map: HashMap<String, String> = [(
            crate::properties::keys::FIELD_ACTOR.to_string(),
            "who".to_string(),
        )]
        .into_iter()
        .collect();
        let props = CommonProperties::from_map(&map);

        let mut extended = ExtendedEvent::new(Event::new(), &props);
        extended.set_actor(b"alice").unwrap();

        assert_eq!(extended.actor().unwrap().value(), b"alice");
        assert!(extended.event().contains_field("who"));
        assert!(!extended.event().contains_field("actor"));
    }

    #[test]
    fn test_missing_well_known_field() {
        let props = CommonProperties::default();
        let extended = ExtendedEvent::new(Event::new(), &props);
        assert!(extended.subject().is_err());
    }
}
