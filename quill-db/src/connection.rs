//! Connection capabilities and acquisition strategies
//!
//! The persistence processor never talks to a driver directly; it is written
//! against the [`AuditConnection`] capability, and acquisition is delegated
//! to a [`ConnectionProvider`] strategy. Three strategies ship with the
//! library:
//!
//! - [`DataSourceProvider`] — a caller-supplied [`DataSource`] handle looked
//!   up by name in the per-call processing objects
//! - [`RegistryConnectionProvider`] — a process-global named data-source
//!   registry, populated once at application startup
//! - [`ManagedPoolProvider`] — a library-managed pool built from a
//!   registered [`Connector`] plus explicit connection properties
//!
//! Actual drivers live in the embedding application.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock, PoisonError, RwLock};

use quill_core::{AuditError, CommonProperties, ProcessingObjects, Result};

use crate::keys;

/// Driver-level error carried across the capability boundary
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A live, transactional connection to a relational store
pub trait AuditConnection: Send {
    /// Execute one parameterized statement, returning the affected row count
    fn execute(&mut self, sql: &str, params: &[&str]) -> std::result::Result<u64, BoxError>;

    /// Execute one statement for every parameter row
    ///
    /// Drivers with real batch support should override this; the default
    /// executes row by row.
    fn execute_batch(
        &mut self,
        sql: &str,
        rows: &[Vec<String>],
    ) -> std::result::Result<u64, BoxError> {
        let mut affected = 0;
        for row in rows {
            let params: Vec<&str> = row.iter().map(String::as_str).collect();
            affected += self.execute(sql, &params)?;
        }
        Ok(affected)
    }

    /// Open a transaction
    fn begin(&mut self) -> std::result::Result<(), BoxError>;

    /// Commit the open transaction
    fn commit(&mut self) -> std::result::Result<(), BoxError>;

    /// Roll the open transaction back
    fn rollback(&mut self) -> std::result::Result<(), BoxError>;
}

/// A source of [`AuditConnection`]s (typically a pool)
pub trait ConnectionPool: Send + Sync {
    fn connection(&self) -> std::result::Result<Box<dyn AuditConnection>, BoxError>;
}

/// Concrete handle callers place into [`ProcessingObjects`]
///
/// The processing-objects map stores `Any` values, and a bare trait object
/// cannot be downcast back out of it; this newtype is the well-known
/// concrete type both sides agree on.
pub struct DataSource(pub Arc<dyn ConnectionPool>);

/// Opens a raw connection from explicit connection properties
///
/// The analog of registering a driver: the embedding application registers
/// one [`Connector`] per driver it links, under a name configuration can
/// refer to.
pub trait Connector: Send + Sync {
    fn connect(
        &self,
        properties: &CommonProperties,
    ) -> std::result::Result<Box<dyn AuditConnection>, BoxError>;
}

/// Acquisition strategy used by the persistence processor
pub trait ConnectionProvider: Send + Sync {
    /// Resolve strategy configuration once, before the chain is published
    fn init(&mut self, _properties: &CommonProperties) -> Result<()> {
        Ok(())
    }

    /// Acquire a connection for one audit call
    fn connection(
        &self,
        properties: &CommonProperties,
        processing_objects: &ProcessingObjects,
    ) -> Result<Box<dyn AuditConnection>>;
}

/// Default name under which a [`DataSource`] is looked up
pub const DEFAULT_DATA_SOURCE_NAME: &str = "auditDataSource";

// ==================== Strategy: processing objects ====================

/// Looks up a caller-supplied [`DataSource`] in the processing objects
#[derive(Debug)]
pub struct DataSourceProvider {
    object_name: String,
}

impl DataSourceProvider {
    pub fn new() -> Self {
        Self {
            object_name: DEFAULT_DATA_SOURCE_NAME.into(),
        }
    }
}

impl Default for DataSourceProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionProvider for DataSourceProvider {
    fn init(&mut self, properties: &CommonProperties) -> Result<()> {
        self.object_name = properties
            .get_or(keys::DATA_SOURCE_NAME, DEFAULT_DATA_SOURCE_NAME)
            .trim()
            .to_string();
        if self.object_name.is_empty() {
            return Err(AuditError::configuration(format!(
                "`{}` must not be blank",
                keys::DATA_SOURCE_NAME
            )));
        }
        Ok(())
    }

    fn connection(
        &self,
        _properties: &CommonProperties,
        processing_objects: &ProcessingObjects,
    ) -> Result<Box<dyn AuditConnection>> {
        let source = processing_objects
            .get_as::<DataSource>(&self.object_name)
            .ok_or_else(|| {
                AuditError::configuration(format!(
                    "no data source shared under `{}` in the processing objects",
                    self.object_name
                ))
            })?;
        source
            .0
            .connection()
            .map_err(|e| AuditError::processing_with("failed to acquire connection", e))
    }
}

// ==================== Strategy: data-source registry ====================

static DATA_SOURCES: OnceLock<RwLock<HashMap<String, Arc<dyn ConnectionPool>>>> = OnceLock::new();

fn data_source_map() -> &'static RwLock<HashMap<String, Arc<dyn ConnectionPool>>> {
    DATA_SOURCES.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Register a named data source for [`RegistryConnectionProvider`]
///
/// Re-registering a name replaces the previous source.
pub fn register_data_source(name: impl Into<String>, pool: Arc<dyn ConnectionPool>) {
    data_source_map()
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(name.into(), pool);
}

/// Remove a named data source; `true` iff one was registered
pub fn unregister_data_source(name: &str) -> bool {
    data_source_map()
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .remove(name)
        .is_some()
}

/// Resolves a data source from the process-global registry by name
#[derive(Debug)]
pub struct RegistryConnectionProvider {
    source_name: String,
}

impl RegistryConnectionProvider {
    pub fn new() -> Self {
        Self {
            source_name: DEFAULT_DATA_SOURCE_NAME.into(),
        }
    }
}

impl Default for RegistryConnectionProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionProvider for RegistryConnectionProvider {
    fn init(&mut self, properties: &CommonProperties) -> Result<()> {
        self.source_name = properties
            .get_or(keys::DATA_SOURCE_NAME, DEFAULT_DATA_SOURCE_NAME)
            .trim()
            .to_string();
        if self.source_name.is_empty() {
            return Err(AuditError::configuration(format!(
                "`{}` must not be blank",
                keys::DATA_SOURCE_NAME
            )));
        }
        Ok(())
    }

    fn connection(
        &self,
        _properties: &CommonProperties,
        _processing_objects: &ProcessingObjects,
    ) -> Result<Box<dyn AuditConnection>> {
        let pool = data_source_map()
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&self.source_name)
            .cloned()
            .ok_or_else(|| {
                AuditError::configuration(format!(
                    "no data source registered under `{}`",
                    self.source_name
                ))
            })?;
        pool.connection()
            .map_err(|e| AuditError::processing_with("failed to acquire connection", e))
    }
}

// ==================== Strategy: managed pool ====================

static CONNECTORS: OnceLock<RwLock<HashMap<String, Arc<dyn Connector>>>> = OnceLock::new();

fn connector_map() -> &'static RwLock<HashMap<String, Arc<dyn Connector>>> {
    CONNECTORS.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Register a named [`Connector`] for [`ManagedPoolProvider`]
pub fn register_connector(name: impl Into<String>, connector: Arc<dyn Connector>) {
    connector_map()
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(name.into(), connector);
}

/// Default cap on idle connections kept by a managed pool
pub const DEFAULT_POOL_MAX_IDLE: usize = 8;

struct ManagedPoolInner {
    connector: Arc<dyn Connector>,
    properties: CommonProperties,
    idle: Mutex<Vec<Box<dyn AuditConnection>>>,
    max_idle: usize,
}

/// A small library-managed connection pool
///
/// Checked-out connections return to the pool on drop, up to `max_idle`
/// kept connections; beyond that they are simply dropped.
pub struct ManagedPool {
    inner: Arc<ManagedPoolInner>,
}

impl ManagedPool {
    pub fn new(connector: Arc<dyn Connector>, properties: CommonProperties, max_idle: usize) -> Self {
        Self {
            inner: Arc::new(ManagedPoolInner {
                connector,
                properties,
                idle: Mutex::new(Vec::new()),
                max_idle,
            }),
        }
    }

    /// Number of idle connections currently held
    pub fn idle_count(&self) -> usize {
        self.inner
            .idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

struct PooledConnection {
    conn: Option<Box<dyn AuditConnection>>,
    pool: Arc<ManagedPoolInner>,
}

impl PooledConnection {
    fn conn(&mut self) -> &mut Box<dyn AuditConnection> {
        // Present until drop by construction
        self.conn.as_mut().expect("connection already returned")
    }
}

impl AuditConnection for PooledConnection {
    fn execute(&mut self, sql: &str, params: &[&str]) -> std::result::Result<u64, BoxError> {
        self.conn().execute(sql, params)
    }

    fn execute_batch(
        &mut self,
        sql: &str,
        rows: &[Vec<String>],
    ) -> std::result::Result<u64, BoxError> {
        self.conn().execute_batch(sql, rows)
    }

    fn begin(&mut self) -> std::result::Result<(), BoxError> {
        self.conn().begin()
    }

    fn commit(&mut self) -> std::result::Result<(), BoxError> {
        self.conn().commit()
    }

    fn rollback(&mut self) -> std::result::Result<(), BoxError> {
        self.conn().rollback()
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            let mut idle = self
                .pool
                .idle
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if idle.len() < self.pool.max_idle {
                idle.push(conn);
            }
        }
    }
}

impl ConnectionPool for ManagedPool {
    fn connection(&self) -> std::result::Result<Box<dyn AuditConnection>, BoxError> {
        let recycled = self
            .inner
            .idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop();
        let conn = match recycled {
            Some(conn) => conn,
            None => self.inner.connector.connect(&self.inner.properties)?,
        };
        Ok(Box::new(PooledConnection {
            conn: Some(conn),
            pool: Arc::clone(&self.inner),
        }))
    }
}

/// Builds and owns a [`ManagedPool`] from explicit connection properties
#[derive(Default)]
pub struct ManagedPoolProvider {
    pool: Option<ManagedPool>,
}

impl ManagedPoolProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConnectionProvider for ManagedPoolProvider {
    fn init(&mut self, properties: &CommonProperties) -> Result<()> {
        let connector_name = properties.get(keys::CONNECTOR_NAME).ok_or_else(|| {
            AuditError::configuration(format!(
                "`{}` is required for the managed-pool connection strategy",
                keys::CONNECTOR_NAME
            ))
        })?;
        let connector = connector_map()
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(connector_name.trim())
            .cloned()
            .ok_or_else(|| {
                AuditError::configuration(format!(
                    "no connector registered under `{connector_name}`"
                ))
            })?;
        let max_idle = properties
            .get_parsed::<usize>(keys::POOL_MAX_IDLE)
            .map_err(|message| AuditError::configuration(message))?
            .unwrap_or(DEFAULT_POOL_MAX_IDLE);

        self.pool = Some(ManagedPool::new(connector, properties.clone(), max_idle));
        Ok(())
    }

    fn connection(
        &self,
        _properties: &CommonProperties,
        _processing_objects: &ProcessingObjects,
    ) -> Result<Box<dyn AuditConnection>> {
        let pool = self.pool.as_ref().ok_or_else(|| {
            AuditError::initialization("managed-pool provider used before init")
        })?;
        pool.connection()
            .map_err(|e| AuditError::processing_with("failed to acquire connection", e))
    }
}
