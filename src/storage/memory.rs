/// In-memory storage backends
///
/// Used by the command-line tool, where nothing outlives the process, and by
/// tests.
use crate::bio::sequence::SequenceRecord;
use crate::storage::registry::{FileRecord, UploadStatus};
use crate::storage::traits::{FileRegistry, RecordStore};
use crate::{Result, SeqscopeError};
use chrono::Utc;
use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Default)]
pub struct InMemoryFileRegistry {
    files: DashMap<String, FileRecord>,
}

impl InMemoryFileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl FileRegistry for InMemoryFileRegistry {
    fn find_file(&self, file_id: &str) -> Option<FileRecord> {
        self.files.get(file_id).map(|entry| entry.clone())
    }

    fn register(&self, record: FileRecord) -> Result<()> {
        self.files.insert(record.file_id.clone(), record);
        Ok(())
    }

    fn update_status(&self, file_id: &str, status: UploadStatus) -> Result<()> {
        let mut entry = self
            .files
            .get_mut(file_id)
            .ok_or_else(|| SeqscopeError::NotFound(file_id.to_string()))?;
        entry.status = status;
        entry.updated_at = Utc::now();
        Ok(())
    }
}

/// Record store keeping every file's records in insertion order
#[derive(Default)]
pub struct InMemoryRecordStore {
    records: DashMap<String, Vec<SequenceRecord>>,
    batch_inserts: AtomicUsize,
    single_inserts: AtomicUsize,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Number of `insert_batch` calls served
    pub fn batch_inserts(&self) -> usize {
        self.batch_inserts.load(Ordering::Relaxed)
    }

    /// Number of `insert_record` calls served
    pub fn single_inserts(&self) -> usize {
        self.single_inserts.load(Ordering::Relaxed)
    }
}

impl RecordStore for InMemoryRecordStore {
    fn load_records(&self, file_id: &str) -> Result<Vec<SequenceRecord>> {
        Ok(self
            .records
            .get(file_id)
            .map(|entry| entry.clone())
            .unwrap_or_default())
    }

    fn insert_record(&self, file_id: &str, record: &SequenceRecord) -> Result<()> {
        self.single_inserts.fetch_add(1, Ordering::Relaxed);
        self.records
            .entry(file_id.to_string())
            .or_default()
            .push(record.clone());
        Ok(())
    }

    fn insert_batch(&self, file_id: &str, records: &[SequenceRecord]) -> Result<()> {
        self.batch_inserts.fetch_add(1, Ordering::Relaxed);
        self.records
            .entry(file_id.to_string())
            .or_default()
            .extend_from_slice(records);
        Ok(())
    }

    fn delete_records(&self, file_id: &str) -> Result<()> {
        self.records.remove(file_id);
        Ok(())
    }

    fn has_records(&self, file_id: &str) -> Result<bool> {
        Ok(self
            .records
            .get(file_id)
            .map(|entry| !entry.is_empty())
            .unwrap_or(false))
    }
}
