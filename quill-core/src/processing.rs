//! Caller-supplied processing objects
//!
//! Processors sometimes need live collaborators that cannot come from string
//! configuration — a connection pool handle, a metrics sink. Callers hand
//! them over by name at audit time. Unlike everything else in this library,
//! these are shared by reference on purpose: no defensive copies, and the
//! caller and processors jointly own safe use.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Named, caller-owned objects made available to processors at call time
#[derive(Clone, Default)]
pub struct ProcessingObjects {
    objects: HashMap<String, Arc<dyn Any + Send + Sync>>,
}

impl ProcessingObjects {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Share an object under a name, replacing any previous entry
    pub fn insert<T: Any + Send + Sync>(&mut self, name: impl Into<String>, object: Arc<T>) {
        self.objects.insert(name.into(), object);
    }

    /// Wrap a value in an `Arc` and share it under a name
    pub fn insert_value<T: Any + Send + Sync>(&mut self, name: impl Into<String>, value: T) {
        self.objects.insert(name.into(), Arc::new(value));
    }

    /// The shared object under this name, if any
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Any + Send + Sync>> {
        self.objects.get(name)
    }

    /// The shared object under this name, downcast to a concrete type
    ///
    /// `None` when the name is absent or the object is of a different type.
    pub fn get_as<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
        self.objects
            .get(name)
            .and_then(|object| Arc::clone(object).downcast::<T>().ok())
    }

    /// Whether an object is shared under this name
    pub fn contains(&self, name: &str) -> bool {
        self.objects.contains_key(name)
    }

    /// Stop sharing an object
    ///
    /// Returns `true` iff an entry was removed.
    pub fn remove(&mut self, name: &str) -> bool {
        self.objects.remove(name).is_some()
    }

    /// Names of all shared objects
    pub fn names(&self) -> Vec<String> {
        self.objects.keys().cloned().collect()
    }

    /// Number of shared objects
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl fmt::Debug for ProcessingObjects {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessingObjects")
            .field("names", &self.names())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_get_as() {
        let mut objects = ProcessingObjects::new();
        objects.insert_value("answer", 42usize);

        let shared: Arc<usize> = objects.get_as("answer").unwrap();
        assert_eq!(*shared, 42);
    }

    #[test]
    fn test_objects_are_shared_not_copied() {
        let pool = Arc::new(String::from("pretend-pool"));
        let mut objects = ProcessingObjects::new();
        objects.insert("pool", Arc::clone(&pool));

        let fetched = objects.get_as::<String>("pool").unwrap();
        assert!(Arc::ptr_eq(&pool, &fetched));
    }

    #[test]
    fn test_wrong_type_downcast_is_none() {
        let mut objects = ProcessingObjects::new();
        objects.insert_value("answer", 42usize);
        assert!(objects.get_as::<String>("answer").is_none());
    }

    #[test]
    fn test_remove_and_contains() {
        let mut objects = ProcessingObjects::new();
        objects.insert_value("x", 1u8);
        assert!(objects.contains("x"));
        assert!(objects.remove("x"));
        assert!(!objects.remove("x"));
        assert!(objects.is_empty());
    }
}
