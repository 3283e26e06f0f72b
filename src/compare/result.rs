use crate::bio::sequence::RecordSummary;
use crate::bio::stats::FileAggregate;
use crate::compare::engine::{ComparisonSummary, ReferenceMatches};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceFileSummary {
    pub file_id: String,
    pub file_name: String,
    pub total_sequences: usize,
    pub statistics: FileAggregate,
    pub sequences: Vec<RecordSummary>,
}

/// Outcome of one comparison run. Immutable once built; shared through `Arc`
/// by the cache entry that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub reference_file: ReferenceFileSummary,
    pub comparison_file_ids: Vec<String>,
    pub sequence_comparisons: Vec<ReferenceMatches>,
    pub summary: ComparisonSummary,
}

impl ComparisonResult {
    /// Highest scoring match across all reference records
    pub fn best_match(&self) -> Option<&crate::compare::engine::ComparisonMatch> {
        self.sequence_comparisons
            .iter()
            .filter_map(|c| c.matches.first())
            .max_by(|a, b| a.similarity_score.total_cmp(&b.similarity_score))
    }
}
