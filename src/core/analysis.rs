//! Per-file analysis pipeline
//!
//! Parses a registered file, persists its records through the record store
//! and reduces them into a `FileAggregate`. Aggregates are memoized per file
//! id; a file counts as analyzed once its aggregate is in the memo, even when
//! it holds no valid records.
//!
//! Work on one file is serialized by a per-file lock, so concurrent callers
//! never parse or persist the same file twice.

use crate::bio::fasta::read_records;
use crate::bio::sequence::SequenceRecord;
use crate::bio::stats::{FileAggregate, StatsAccumulator};
use crate::config::Config;
use crate::storage::{BatchPolicy, FileRecord, FileRegistry, RecordStore};
use crate::{Result, SeqscopeError};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

pub struct AnalysisService {
    registry: Arc<dyn FileRegistry>,
    store: Arc<dyn RecordStore>,
    policy: BatchPolicy,
    aggregates: DashMap<String, Arc<FileAggregate>>,
    file_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl AnalysisService {
    pub fn new(registry: Arc<dyn FileRegistry>, store: Arc<dyn RecordStore>, policy: BatchPolicy) -> Self {
        Self {
            registry,
            store,
            policy,
            aggregates: DashMap::new(),
            file_locks: DashMap::new(),
        }
    }

    pub fn from_config(registry: Arc<dyn FileRegistry>, store: Arc<dyn RecordStore>, config: &Config) -> Self {
        Self::new(registry, store, config.storage.batch_policy())
    }

    pub fn registry(&self) -> &Arc<dyn FileRegistry> {
        &self.registry
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    /// Look up a file and require that its upload completed
    pub fn require_completed(&self, file_id: &str) -> Result<FileRecord> {
        let record = self
            .registry
            .find_file(file_id)
            .ok_or_else(|| SeqscopeError::NotFound(file_id.to_string()))?;

        if !record.is_completed() {
            return Err(SeqscopeError::NotReady(format!(
                "{} (status: {})",
                file_id, record.status
            )));
        }

        Ok(record)
    }

    fn file_lock(&self, file_id: &str) -> Arc<Mutex<()>> {
        // Clone out so the map shard is not held while the lock is
        Arc::clone(self.file_locks.entry(file_id.to_string()).or_default().value())
    }

    /// Parse, persist and aggregate a completed file.
    ///
    /// Records are streamed in batches of the configured size; any records
    /// previously stored for the file are replaced. If parsing fails midway
    /// the partial records are removed again.
    pub fn analyze_file(&self, file_id: &str) -> Result<Arc<FileAggregate>> {
        let lock = self.file_lock(file_id);
        let _guard = lock.lock();
        self.analyze_locked(file_id)
    }

    /// Statistics for a file, analyzing it only if nothing is known yet
    pub fn statistics(&self, file_id: &str) -> Result<Arc<FileAggregate>> {
        if let Some(aggregate) = self.cached_statistics(file_id) {
            debug!("Statistics for {} served from memo", file_id);
            return Ok(aggregate);
        }

        let lock = self.file_lock(file_id);
        let _guard = lock.lock();
        self.ensure_analyzed(file_id)
    }

    pub fn cached_statistics(&self, file_id: &str) -> Option<Arc<FileAggregate>> {
        self.aggregates.get(file_id).map(|entry| Arc::clone(entry.value()))
    }

    /// Aggregate and stored records of a completed file, analyzing it first
    /// if needed. Both come from the same analysis.
    pub fn load(&self, file_id: &str) -> Result<(Arc<FileAggregate>, Vec<SequenceRecord>)> {
        let lock = self.file_lock(file_id);
        let _guard = lock.lock();
        let aggregate = self.ensure_analyzed(file_id)?;
        let records = self.store.load_records(file_id)?;
        Ok((aggregate, records))
    }

    /// Stored records of a completed file, analyzing it first if needed
    pub fn records(&self, file_id: &str) -> Result<Vec<SequenceRecord>> {
        self.load(file_id).map(|(_, records)| records)
    }

    /// Caller holds the file lock
    fn ensure_analyzed(&self, file_id: &str) -> Result<Arc<FileAggregate>> {
        if let Some(aggregate) = self.cached_statistics(file_id) {
            return Ok(aggregate);
        }

        self.require_completed(file_id)?;
        let records = self.store.load_records(file_id)?;
        if records.is_empty() {
            return self.analyze_locked(file_id);
        }

        debug!("Aggregating {} stored records for {}", records.len(), file_id);
        let aggregate = Arc::new(FileAggregate::from_records(file_id, &records));
        self.aggregates.insert(file_id.to_string(), Arc::clone(&aggregate));
        Ok(aggregate)
    }

    /// Caller holds the file lock
    fn analyze_locked(&self, file_id: &str) -> Result<Arc<FileAggregate>> {
        let file = self.require_completed(file_id)?;

        if file.path.as_os_str().is_empty() {
            return Err(SeqscopeError::MissingArtifact(format!("{}: no stored path", file_id)));
        }
        if !file.path.exists() {
            return Err(SeqscopeError::MissingArtifact(format!(
                "{}: {} does not exist",
                file_id,
                file.path.display()
            )));
        }

        info!("Analyzing {} ({})", file.original_name, file.formatted_size());
        let start = Instant::now();

        if self.store.has_records(file_id)? {
            warn!("Replacing stored records for {}", file_id);
            self.store.delete_records(file_id)?;
        }
        self.aggregates.remove(file_id);

        let (acc, saved) = match self.stream_into_store(&file, file_id) {
            Ok(done) => done,
            Err(e) => {
                error!("Analysis of {} failed, discarding partial records: {}", file_id, e);
                if let Err(cleanup) = self.store.delete_records(file_id) {
                    error!("Failed to discard partial records for {}: {}", file_id, cleanup);
                }
                return Err(e);
            }
        };

        let aggregate = Arc::new(acc.finish(file_id));
        info!(
            "Analyzed {}: {} sequences ({} valid), {} saved in {:.2?}",
            file_id,
            aggregate.total_sequences,
            aggregate.valid_sequences,
            saved,
            start.elapsed()
        );

        self.aggregates.insert(file_id.to_string(), Arc::clone(&aggregate));
        Ok(aggregate)
    }

    fn stream_into_store(&self, file: &FileRecord, file_id: &str) -> Result<(StatsAccumulator, usize)> {
        let batch_size = self.policy.batch_size.max(1);
        let mut acc = StatsAccumulator::default();
        let mut batch: Vec<SequenceRecord> = Vec::with_capacity(batch_size);
        let mut saved = 0;

        for record in read_records(&file.path)? {
            let record = record?;
            acc.push(&record);
            batch.push(record);
            if batch.len() >= batch_size {
                saved += self.store.save_records(file_id, &batch, &self.policy)?;
                batch.clear();
            }
        }
        if !batch.is_empty() {
            saved += self.store.save_records(file_id, &batch, &self.policy)?;
        }

        Ok((acc, saved))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{InMemoryFileRegistry, InMemoryRecordStore, UploadStatus};
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        registry: Arc<InMemoryFileRegistry>,
        store: Arc<InMemoryRecordStore>,
        service: AnalysisService,
        path: PathBuf,
    }

    fn fixture(contents: &str, policy: BatchPolicy) -> Fixture {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("input.fasta");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(contents.as_bytes())
            .unwrap();

        let registry = Arc::new(InMemoryFileRegistry::new());
        let store = InMemoryRecordStore::shared();
        let service = AnalysisService::new(registry.clone(), store.clone(), policy);

        Fixture { _dir: dir, registry, store, service, path }
    }

    fn register(f: &Fixture, id: &str, status: UploadStatus) {
        let size = std::fs::metadata(&f.path).map(|m| m.len()).unwrap_or(0);
        f.registry
            .register(FileRecord::new(id, "input.fasta", f.path.clone(), size).with_status(status))
            .unwrap();
    }

    #[test]
    fn test_analyze_file() {
        let f = fixture(">s1 first\nATCG\n>s2\nGGCC\n", BatchPolicy::default());
        register(&f, "f1", UploadStatus::Completed);

        let agg = f.service.analyze_file("f1").unwrap();
        assert_eq!(agg.total_sequences, 2);
        assert_eq!(agg.average_gc_content, 75.0);
        assert_eq!(f.store.load_records("f1").unwrap().len(), 2);
        assert!(f.service.cached_statistics("f1").is_some());
    }

    #[test]
    fn test_analyze_streams_in_batches() {
        let contents: String = (0..7).map(|i| format!(">s{}\nACGT\n", i)).collect();
        let f = fixture(&contents, BatchPolicy { batch_size: 3, single_insert_threshold: 100 });
        register(&f, "f1", UploadStatus::Completed);

        f.service.analyze_file("f1").unwrap();
        assert_eq!(f.store.batch_inserts(), 3);
        let ids: Vec<String> = f.store.load_records("f1").unwrap().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["s0", "s1", "s2", "s3", "s4", "s5", "s6"]);
    }

    #[test]
    fn test_reanalysis_replaces_records() {
        let f = fixture(">s1\nATCG\n", BatchPolicy::default());
        register(&f, "f1", UploadStatus::Completed);

        f.service.analyze_file("f1").unwrap();
        f.service.analyze_file("f1").unwrap();
        assert_eq!(f.store.load_records("f1").unwrap().len(), 1);
    }

    #[test]
    fn test_preconditions() {
        let f = fixture(">s1\nATCG\n", BatchPolicy::default());

        assert!(matches!(f.service.analyze_file("missing"), Err(SeqscopeError::NotFound(_))));

        register(&f, "uploading", UploadStatus::Uploading);
        match f.service.analyze_file("uploading") {
            Err(SeqscopeError::NotReady(msg)) => assert!(msg.contains("UPLOADING")),
            other => panic!("Expected NotReady, got {:?}", other),
        }

        f.registry
            .register(
                FileRecord::new("gone", "gone.fasta", f.path.with_file_name("gone.fasta"), 0)
                    .with_status(UploadStatus::Completed),
            )
            .unwrap();
        assert!(matches!(
            f.service.analyze_file("gone"),
            Err(SeqscopeError::MissingArtifact(_))
        ));

        f.registry
            .register(FileRecord::new("nopath", "x.fasta", PathBuf::new(), 0).with_status(UploadStatus::Completed))
            .unwrap();
        assert!(matches!(
            f.service.analyze_file("nopath"),
            Err(SeqscopeError::MissingArtifact(_))
        ));
    }

    #[test]
    fn test_statistics_uses_stored_records() {
        let f = fixture(">s1\nATCG\n", BatchPolicy::default());
        register(&f, "f1", UploadStatus::Completed);
        f.store
            .insert_batch(
                "f1",
                &[
                    SequenceRecord::new("a", b"GGGG".to_vec()),
                    SequenceRecord::new("b", b"AAAA".to_vec()),
                ],
            )
            .unwrap();

        let agg = f.service.statistics("f1").unwrap();
        // Stored records win over the file on disk
        assert_eq!(agg.total_sequences, 2);
        assert_eq!(agg.average_gc_content, 50.0);

        let again = f.service.statistics("f1").unwrap();
        assert!(Arc::ptr_eq(&agg, &again));
    }

    #[test]
    fn test_statistics_analyzes_when_unknown() {
        let f = fixture(">s1\nGGCC\n", BatchPolicy::default());
        register(&f, "f1", UploadStatus::Completed);

        let agg = f.service.statistics("f1").unwrap();
        assert_eq!(agg.total_sequences, 1);
        assert_eq!(agg.average_gc_content, 100.0);
        assert!(f.store.has_records("f1").unwrap());
    }

    #[test]
    fn test_concurrent_statistics_analyze_once() {
        let contents: String = (0..2000).map(|i| format!(">s{}\nACGTAC\n", i)).collect();
        let f = fixture(&contents, BatchPolicy { batch_size: 50, single_insert_threshold: 100 });
        register(&f, "f1", UploadStatus::Completed);

        let aggregates: Vec<Arc<FileAggregate>> = std::thread::scope(|scope| {
            let workers: Vec<_> = (0..8)
                .map(|i| {
                    let service = &f.service;
                    scope.spawn(move || {
                        if i % 2 == 0 {
                            service.statistics("f1").unwrap()
                        } else {
                            service.load("f1").unwrap().0
                        }
                    })
                })
                .collect();
            workers.into_iter().map(|w| w.join().unwrap()).collect()
        });

        assert!(aggregates.iter().all(|a| Arc::ptr_eq(a, &aggregates[0])));
        assert_eq!(aggregates[0].total_sequences, 2000);
        assert_eq!(f.store.load_records("f1").unwrap().len(), 2000);
        assert_eq!(f.store.batch_inserts(), 40);
    }

    #[test]
    fn test_failed_stream_leaves_no_records() {
        use flate2::write::GzEncoder;
        use flate2::Compression;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.fasta.gz");
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        for i in 0..5000 {
            let seq: String = (0..40).map(|j| b"ACGT"[(i * 7 + j * 3) % 4] as char).collect();
            writeln!(encoder, ">s{} sample\n{}", i, seq).unwrap();
        }
        let bytes = encoder.finish().unwrap();
        std::fs::write(&path, &bytes[..bytes.len() / 2]).unwrap();

        let registry = Arc::new(InMemoryFileRegistry::new());
        let store = InMemoryRecordStore::shared();
        let service = AnalysisService::new(
            registry.clone(),
            store.clone(),
            BatchPolicy { batch_size: 10, single_insert_threshold: 100 },
        );
        registry
            .register(FileRecord::new("gz", "broken.fasta.gz", path, 0).with_status(UploadStatus::Completed))
            .unwrap();

        assert!(matches!(service.analyze_file("gz"), Err(SeqscopeError::Io(_))));
        assert!(!store.has_records("gz").unwrap());
        assert!(service.cached_statistics("gz").is_none());
        assert!(service.statistics("gz").is_err());
        assert!(!store.has_records("gz").unwrap());
    }

    #[test]
    fn test_file_without_valid_records_is_analyzed_once() {
        let f = fixture(">s1\nXXXX\n>s2\n\n", BatchPolicy::default());
        register(&f, "f1", UploadStatus::Completed);

        let first = f.service.statistics("f1").unwrap();
        assert_eq!(first.total_sequences, 0);
        assert!(f.service.records("f1").unwrap().is_empty());
        assert!(f.service.records("f1").unwrap().is_empty());

        let again = f.service.statistics("f1").unwrap();
        assert!(Arc::ptr_eq(&first, &again));
        let (loaded, records) = f.service.load("f1").unwrap();
        assert!(Arc::ptr_eq(&first, &loaded));
        assert!(records.is_empty());
    }
}
