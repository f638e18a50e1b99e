//! End-to-end chain: event-ID stamping followed by SQL persistence

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use quill_core::{Audit, AuditFactory, CommonProperties, EventBuilder, ProcessingObjects};
use quill_db::{AuditConnection, BoxError, ConnectionPool, DataSource};

#[derive(Clone, Default)]
struct MemoryDb {
    rows: Arc<Mutex<Vec<(String, Vec<String>)>>>,
}

struct MemoryConnection {
    rows: Arc<Mutex<Vec<(String, Vec<String>)>>>,
    staged: Vec<(String, Vec<String>)>,
}

impl AuditConnection for MemoryConnection {
    fn execute(&mut self, sql: &str, params: &[&str]) -> Result<u64, BoxError> {
        self.staged
            .push((sql.to_string(), params.iter().map(|p| p.to_string()).collect()));
        Ok(1)
    }

    fn begin(&mut self) -> Result<(), BoxError> {
        self.staged.clear();
        Ok(())
    }

    fn commit(&mut self) -> Result<(), BoxError> {
        self.rows.lock().unwrap().append(&mut self.staged);
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), BoxError> {
        self.staged.clear();
        Ok(())
    }
}

impl ConnectionPool for MemoryDb {
    fn connection(&self) -> Result<Box<dyn AuditConnection>, BoxError> {
        Ok(Box::new(MemoryConnection {
            rows: Arc::clone(&self.rows),
            staged: Vec::new(),
        }))
    }
}

#[test]
fn test_stamp_then_persist() {
    quill_db::register();

    let map: HashMap<String, String> = [
        ("audit.processors", "eventid, db.dataSource"),
        ("audit.defaultAuditStream", "orders"),
        ("audit.processor.eventId.length", "20"),
        ("audit.processor.db.indexedFields", "actor"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    let properties = CommonProperties::from_map(&map);

    let audit = AuditFactory::instance(&properties).expect("chain should initialize");

    let mut builder = EventBuilder::new(&properties);
    builder.set_actor(b"alice").unwrap();

    let db = MemoryDb::default();
    let mut objects = ProcessingObjects::new();
    objects.insert_value(
        "auditDataSource",
        DataSource(Arc::new(db.clone()) as Arc<dyn ConnectionPool>),
    );

    let audited = audit
        .audit_with(builder.into_event(), "orders", &objects)
        .expect("chain should run");

    // The engine returned the event with the stamped ID intact
    let id = String::from_utf8(audited.get_field("eventId").unwrap().value()).unwrap();
    assert_eq!(id.len(), 20);

    // One event row and one indexed row were committed, linked by the ID
    let rows = db.rows.lock().unwrap();
    assert_eq!(rows.len(), 2);
    let (event_sql, event_params) = &rows[0];
    assert!(event_sql.contains("audit_events"));
    assert_eq!(event_params[0], id);
    assert_eq!(event_params[1], "orders");
    assert!(event_params[2].contains(r#""actor":"alice""#));

    let (field_sql, field_params) = &rows[1];
    assert!(field_sql.contains("audit_event_fields"));
    assert_eq!(field_params, &vec![
        id.clone(),
        "orders".to_string(),
        "actor".to_string(),
        "alice".to_string(),
    ]);
}
