//! Persistence of scanned file records.
//!
//! The pipeline talks to storage only through [`MetadataStore`]. Two
//! implementations live here:
//!
//! - [`MemoryStore`]: records in process memory, used for tests and as the
//!   working set of the on-disk store
//! - [`FileStore`]: a versioned rkyv snapshot on disk, written atomically on
//!   [`MetadataStore::flush`]

use std::collections::HashMap;

use crate::error::{DeckError, Result};
use crate::hashing::is_valid_digest;
use crate::record::{FileRecord, NewRecord, RecordId};

mod file;

pub use file::{FileStore, STORE_VERSION, StoreSnapshot, StoredRecord};
pub(crate) use file::temp_path;

#[cfg(test)]
mod tests;

/// The storage interface consumed by the scanner, resolver and replacer.
///
/// Query results come back in no particular order; callers that need a
/// stable choice must make it themselves.
pub trait MetadataStore {
    /// Deletes every record.
    fn clear(&mut self) -> Result<()>;

    /// Persists a new record under a freshly assigned id and returns it.
    ///
    /// Fails with [`DeckError::Hash`] if the content hash is not a SHA-256
    /// hex digest.
    fn create(&mut self, record: NewRecord) -> Result<FileRecord>;

    /// Returns every stored record.
    fn find_all(&self) -> Result<Vec<FileRecord>>;

    /// Looks up a record by id.
    fn find_by_id(&self, id: RecordId) -> Result<Option<FileRecord>>;

    /// Returns every record whose content hash equals `hash`.
    fn find_by_hash(&self, hash: &str) -> Result<Vec<FileRecord>>;

    /// Points `id` at the canonical record `mother_id`.
    ///
    /// Both ids must exist.
    fn update_mother(&mut self, id: RecordId, mother_id: RecordId) -> Result<()>;

    /// Makes all prior mutations durable.
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// In-memory record store with id and hash indexes.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    next_id: u64,
    records: Vec<FileRecord>,
    by_id: HashMap<RecordId, usize>,
    by_hash: HashMap<String, Vec<usize>>,
}

impl MemoryStore {
    /// Creates an empty store whose first id will be `#1`.
    pub fn new() -> Self {
        Self::from_parts(1, Vec::new())
    }

    /// Rebuilds a store from persisted parts, recomputing the indexes.
    pub(crate) fn from_parts(next_id: u64, records: Vec<FileRecord>) -> Self {
        let mut store = Self {
            next_id,
            records: Vec::with_capacity(records.len()),
            by_id: HashMap::new(),
            by_hash: HashMap::new(),
        };
        for record in records {
            store.insert(record);
        }
        store
    }

    /// Splits the store back into what gets persisted.
    pub(crate) fn to_parts(&self) -> (u64, Vec<FileRecord>) {
        (self.next_id, self.records.clone())
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` when no records are stored.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn insert(&mut self, record: FileRecord) {
        let idx = self.records.len();
        self.next_id = self.next_id.max(record.id.0 + 1);
        self.by_id.insert(record.id, idx);
        self.by_hash
            .entry(record.content_hash.clone())
            .or_default()
            .push(idx);
        self.records.push(record);
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataStore for MemoryStore {
    fn clear(&mut self) -> Result<()> {
        // next_id survives: ids are never reused within one store.
        self.records.clear();
        self.by_id.clear();
        self.by_hash.clear();
        Ok(())
    }

    fn create(&mut self, record: NewRecord) -> Result<FileRecord> {
        if !is_valid_digest(&record.content_hash) {
            return Err(DeckError::Hash {
                path: record.file_path,
                message: format!(
                    "expected 64 lower-case hex characters, got {:?}",
                    record.content_hash
                ),
            });
        }

        let id = RecordId(self.next_id);
        let stored = FileRecord::from_new(id, record)?;
        self.insert(stored.clone());
        Ok(stored)
    }

    fn find_all(&self) -> Result<Vec<FileRecord>> {
        Ok(self.records.clone())
    }

    fn find_by_id(&self, id: RecordId) -> Result<Option<FileRecord>> {
        Ok(self.by_id.get(&id).map(|&idx| self.records[idx].clone()))
    }

    fn find_by_hash(&self, hash: &str) -> Result<Vec<FileRecord>> {
        Ok(self
            .by_hash
            .get(hash)
            .map(|indexes| {
                indexes
                    .iter()
                    .map(|&idx| self.records[idx].clone())
                    .collect()
            })
            .unwrap_or_default())
    }

    fn update_mother(&mut self, id: RecordId, mother_id: RecordId) -> Result<()> {
        if !self.by_id.contains_key(&mother_id) {
            return Err(DeckError::RecordNotFound { id: mother_id });
        }
        let idx = *self
            .by_id
            .get(&id)
            .ok_or(DeckError::RecordNotFound { id })?;
        self.records[idx].mother_id = mother_id;
        Ok(())
    }
}
