//! Comparison runs wired to the registry and record store.
//!
//! `ComparisonRunner` is the blocking work behind a cache miss;
//! `ComparisonService` is the entry point callers use.

use crate::bio::sequence::SequenceRecord;
use crate::compare::cache::{CacheStats, ComparisonBackend, ComparisonHandle, ComparisonOutcome, ComparisonRequest};
use crate::compare::engine::{ComparedFile, ComparisonEngine};
use crate::compare::result::{ComparisonResult, ReferenceFileSummary};
use crate::compare::{ComparisonCache, ComparisonStatus};
use crate::config::Config;
use crate::core::analysis::AnalysisService;
use crate::storage::FileRegistry;
use crate::Result;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

pub struct ComparisonRunner {
    analysis: Arc<AnalysisService>,
    engine: ComparisonEngine,
}

impl ComparisonRunner {
    pub fn new(analysis: Arc<AnalysisService>, engine: ComparisonEngine) -> Self {
        Self { analysis, engine }
    }

    fn file_name(&self, file_id: &str) -> String {
        self.analysis
            .registry()
            .find_file(file_id)
            .map(|f| f.original_name)
            .unwrap_or_else(|| file_id.to_string())
    }
}

impl ComparisonBackend for ComparisonRunner {
    fn run(&self, request: &ComparisonRequest) -> Result<ComparisonResult> {
        let start = Instant::now();

        // Fail before any parsing if a single file is not usable
        self.analysis.require_completed(&request.reference_id)?;
        for id in &request.comparison_ids {
            self.analysis.require_completed(id)?;
        }

        let (reference_stats, reference_records) = self.analysis.load(&request.reference_id)?;

        let mut compared: Vec<(String, String, Vec<SequenceRecord>)> =
            Vec::with_capacity(request.comparison_ids.len());
        for id in &request.comparison_ids {
            let (_, records) = self.analysis.load(id)?;
            debug!("Loaded {} records for {}", records.len(), id);
            compared.push((id.clone(), self.file_name(id), records));
        }

        let files: Vec<ComparedFile<'_>> = compared
            .iter()
            .map(|(file_id, file_name, records)| ComparedFile {
                file_id,
                file_name,
                records,
            })
            .collect();

        let sequence_comparisons = self.engine.compare(&reference_records, &files);
        let summary = self.engine.summarize(&sequence_comparisons);

        info!(
            "Compared {} reference sequences against {} files ({} pairs) in {:.2?}",
            summary.total_reference_sequences,
            files.len(),
            summary.total_comparisons,
            start.elapsed()
        );

        Ok(ComparisonResult {
            reference_file: ReferenceFileSummary {
                file_id: request.reference_id.clone(),
                file_name: self.file_name(&request.reference_id),
                total_sequences: reference_records.len(),
                statistics: (*reference_stats).clone(),
                sequences: reference_records.iter().map(SequenceRecord::summary).collect(),
            },
            comparison_file_ids: request.comparison_ids.clone(),
            sequence_comparisons,
            summary,
        })
    }
}

/// Cached, deduplicated comparisons between registered files
#[derive(Clone)]
pub struct ComparisonService {
    cache: ComparisonCache,
}

impl ComparisonService {
    pub fn new(analysis: Arc<AnalysisService>, config: &Config) -> Self {
        let runner = ComparisonRunner::new(analysis, ComparisonEngine::new(config.comparison.parallel));
        Self::with_backend(Arc::new(runner))
    }

    pub fn with_backend(backend: Arc<dyn ComparisonBackend>) -> Self {
        Self {
            cache: ComparisonCache::new(backend),
        }
    }

    /// Handle to the result, starting a run if none is cached or running.
    /// Must be called from within a Tokio runtime.
    pub fn compare_sequences(&self, reference_id: &str, comparison_ids: &[String]) -> ComparisonHandle {
        self.cache.compare_sequences(reference_id, comparison_ids)
    }

    pub async fn compare(&self, reference_id: &str, comparison_ids: &[String]) -> ComparisonOutcome {
        self.cache.compare(reference_id, comparison_ids).await
    }

    /// Kick off a run without waiting for it; poll with `get_comparison_result`.
    /// The run is a task of its own, so dropping the handle does not cancel it.
    /// Must be called from within a Tokio runtime.
    pub fn start_comparison(&self, reference_id: &str, comparison_ids: &[String]) {
        drop(self.cache.compare_sequences(reference_id, comparison_ids));
    }

    pub fn get_comparison_result(&self, reference_id: &str, comparison_ids: &[String]) -> ComparisonStatus {
        self.cache.get_result(reference_id, comparison_ids)
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn cache(&self) -> &ComparisonCache {
        &self.cache
    }
}
