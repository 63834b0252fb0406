//! Table metadata and the compare-and-swap store seam.
//!
//! The core never performs I/O; it hands finished metadata to an opaque
//! store that maintains the current-metadata pointer. Stores must implement
//! `commit` as a compare-and-swap against the base the caller read, so two
//! concurrent commits over one base resolve to exactly one success.

use std::sync::Arc;
use std::sync::Mutex;

use floe_core::schema::Schema;

use crate::error::{Error, Result};

/// The slice of table metadata the schema core owns: the current schema and
/// the highest column id ever assigned. Ids of deleted columns stay burned.
#[derive(Debug, Clone)]
pub struct TableMetadata {
    version: u64,
    schema: Arc<Schema>,
    last_column_id: i32,
}

impl TableMetadata {
    pub fn new(schema: Arc<Schema>, last_column_id: i32) -> Self {
        Self {
            version: 0,
            schema,
            last_column_id,
        }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn last_column_id(&self) -> i32 {
        self.last_column_id
    }

    /// The successor metadata carrying an evolved schema.
    pub fn update_schema(&self, schema: Schema, last_column_id: i32) -> TableMetadata {
        TableMetadata {
            version: self.version + 1,
            schema: Arc::new(schema),
            last_column_id,
        }
    }
}

/// An opaque metadata store holding the current-metadata pointer.
pub trait MetadataStore {
    fn current(&self) -> TableMetadata;

    /// Swap the pointer from `base` to `update`. Fails with
    /// [`Error::CommitConflict`] when the pointer no longer matches `base`.
    fn commit(&self, base: &TableMetadata, update: TableMetadata) -> Result<()>;
}

/// In-memory store; versions stand in for the pointer identity.
#[derive(Debug)]
pub struct MemoryStore {
    current: Mutex<TableMetadata>,
}

impl MemoryStore {
    pub fn new(metadata: TableMetadata) -> Self {
        Self {
            current: Mutex::new(metadata),
        }
    }
}

impl MetadataStore for MemoryStore {
    fn current(&self) -> TableMetadata {
        self.current.lock().expect("metadata lock poisoned").clone()
    }

    fn commit(&self, base: &TableMetadata, update: TableMetadata) -> Result<()> {
        let mut current = self.current.lock().expect("metadata lock poisoned");
        if current.version() != base.version() {
            return Err(Error::CommitConflict(format!(
                "Base version {} is no longer current (now {})",
                base.version(),
                current.version()
            )));
        }
        *current = update;
        Ok(())
    }
}
