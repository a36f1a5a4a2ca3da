//! Record storage used by handlers.
//!
//! Routing never touches storage. [`Repository`] is the narrow interface the
//! handlers of an application call, and [`MemoryRepository`] is a thread-safe
//! in-process implementation for demos and tests.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde_json::{Map, Value};
use tracing::debug;

/// One stored record: a JSON object.
pub type Record = Map<String, Value>;

/// CRUD access to one named collection of records.
///
/// Returned records always carry their `id`.
pub trait Repository: Send + Sync {
    fn find(&self, id: u64) -> Option<Record>;
    fn all(&self) -> Vec<Record>;
    /// Stores `data` and returns the new record's id.
    fn create(&self, data: Record) -> u64;
    /// Merges `data` into an existing record. `false` if there is none.
    fn update(&self, id: u64, data: Record) -> bool;
    /// `false` if there was nothing to delete.
    fn delete(&self, id: u64) -> bool;
}

#[derive(Debug, Default)]
struct Rows {
    next_id: u64,
    records: BTreeMap<u64, Record>,
}

/// A collection kept in memory, ordered by id.
#[derive(Debug)]
pub struct MemoryRepository {
    collection: String,
    rows: Mutex<Rows>,
}

impl MemoryRepository {
    pub fn new(collection: impl Into<String>) -> Self {
        Self { collection: collection.into(), rows: Mutex::default() }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    fn rows(&self) -> MutexGuard<'_, Rows> {
        // A panicking handler cannot leave `Rows` half-updated.
        self.rows.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn with_id(id: u64, mut record: Record) -> Record {
    record.insert("id".to_owned(), Value::from(id));
    record
}

impl Repository for MemoryRepository {
    fn find(&self, id: u64) -> Option<Record> {
        self.rows().records.get(&id).cloned()
    }

    fn all(&self) -> Vec<Record> {
        self.rows().records.values().cloned().collect()
    }

    fn create(&self, data: Record) -> u64 {
        let mut rows = self.rows();
        rows.next_id += 1;
        let id = rows.next_id;
        rows.records.insert(id, with_id(id, data));
        debug!(collection = %self.collection, id, "record created");
        id
    }

    fn update(&self, id: u64, data: Record) -> bool {
        let mut rows = self.rows();
        let Some(record) = rows.records.get_mut(&id) else {
            return false;
        };
        record.extend(data);
        record.insert("id".to_owned(), Value::from(id));
        debug!(collection = %self.collection, id, "record updated");
        true
    }

    fn delete(&self, id: u64) -> bool {
        let removed = self.rows().records.remove(&id).is_some();
        if removed {
            debug!(collection = %self.collection, id, "record deleted");
        }
        removed
    }
}
