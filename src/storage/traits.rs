/// Storage collaborator traits
///
/// The analysis and comparison services only talk to storage through these,
/// so any backend (database, files, memory) can be plugged in.
use crate::bio::sequence::SequenceRecord;
use crate::storage::registry::{FileRecord, UploadStatus};
use crate::Result;
use tracing::{debug, info};

/// Lookup and bookkeeping for uploaded files
pub trait FileRegistry: Send + Sync {
    /// Find a registered file by id
    fn find_file(&self, file_id: &str) -> Option<FileRecord>;

    /// Register or replace a file entry
    fn register(&self, record: FileRecord) -> Result<()>;

    /// Move a file to a new upload status
    fn update_status(&self, file_id: &str, status: UploadStatus) -> Result<()>;
}

/// How `save_records` splits its input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchPolicy {
    pub batch_size: usize,
    /// Records longer than this are inserted on their own
    pub single_insert_threshold: usize,
}

impl Default for BatchPolicy {
    fn default() -> Self {
        Self {
            batch_size: 500,
            single_insert_threshold: 100_000,
        }
    }
}

/// Persistence of parsed records, per file
pub trait RecordStore: Send + Sync {
    /// All records of a file in the order they were saved
    fn load_records(&self, file_id: &str) -> Result<Vec<SequenceRecord>>;

    /// Insert one record
    fn insert_record(&self, file_id: &str, record: &SequenceRecord) -> Result<()>;

    /// Insert several records at once
    fn insert_batch(&self, file_id: &str, records: &[SequenceRecord]) -> Result<()>;

    /// Drop everything stored for a file
    fn delete_records(&self, file_id: &str) -> Result<()>;

    /// Check whether any records are stored for a file
    fn has_records(&self, file_id: &str) -> Result<bool> {
        Ok(!self.load_records(file_id)?.is_empty())
    }

    /// Save records in batches; oversized records bypass batching.
    ///
    /// Stored order always matches input order: a pending batch is flushed
    /// before an oversized record is inserted.
    fn save_records(&self, file_id: &str, records: &[SequenceRecord], policy: &BatchPolicy) -> Result<usize> {
        let batch_size = policy.batch_size.max(1);
        let mut saved = 0;
        let mut next_report = 1000;

        for chunk in records.chunks(batch_size) {
            let mut pending = 0;
            for (i, record) in chunk.iter().enumerate() {
                if record.len() > policy.single_insert_threshold {
                    if pending < i {
                        self.insert_batch(file_id, &chunk[pending..i])?;
                        saved += i - pending;
                    }
                    self.insert_record(file_id, record)?;
                    saved += 1;
                    pending = i + 1;
                }
            }

            if pending < chunk.len() {
                self.insert_batch(file_id, &chunk[pending..])?;
                saved += chunk.len() - pending;
            }

            if saved >= next_report {
                info!("Saved {} / {} sequences", saved, records.len());
                next_report = (saved / 1000 + 1) * 1000;
            }
        }

        debug!("Saved {} sequences for file {}", saved, file_id);
        Ok(saved)
    }
}
