//! Positional similarity between records of different files.
//!
//! This is not an aligner: symbols are compared index by index with no gap
//! handling, and the match count is normalised by the longer sequence.

use crate::bio::composition::BaseDelta;
use crate::bio::sequence::{RecordSummary, SequenceRecord};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Five-level ordinal derived from a similarity score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SimilarityGrade {
    #[serde(rename = "very different")]
    VeryDifferent,
    #[serde(rename = "somewhat different")]
    SomewhatDifferent,
    #[serde(rename = "moderate")]
    Moderate,
    #[serde(rename = "similar")]
    Similar,
    #[serde(rename = "very similar")]
    VerySimilar,
}

impl SimilarityGrade {
    /// Lower bounds are inclusive: 90, 75, 60, 40
    pub fn from_score(score: f64) -> Self {
        if score >= 90.0 {
            SimilarityGrade::VerySimilar
        } else if score >= 75.0 {
            SimilarityGrade::Similar
        } else if score >= 60.0 {
            SimilarityGrade::Moderate
        } else if score >= 40.0 {
            SimilarityGrade::SomewhatDifferent
        } else {
            SimilarityGrade::VeryDifferent
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SimilarityGrade::VerySimilar => "very similar",
            SimilarityGrade::Similar => "similar",
            SimilarityGrade::Moderate => "moderate",
            SimilarityGrade::SomewhatDifferent => "somewhat different",
            SimilarityGrade::VeryDifferent => "very different",
        }
    }
}

impl fmt::Display for SimilarityGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Records of one compared file, in parsed order
#[derive(Debug, Clone)]
pub struct ComparedFile<'a> {
    pub file_id: &'a str,
    pub file_name: &'a str,
    pub records: &'a [SequenceRecord],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonMatch {
    pub reference: RecordSummary,
    pub compared: RecordSummary,
    pub file_id: String,
    pub file_name: String,
    pub length_difference: i64,
    pub length_ratio: f64,
    pub composition_delta: BaseDelta,
    pub similarity_score: f64,
    pub similarity_grade: SimilarityGrade,
}

/// All matches of one reference record, best first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceMatches {
    pub reference: RecordSummary,
    pub total_matches: usize,
    pub matches: Vec<ComparisonMatch>,
}

/// Counts per grade band: `<40`, `[40,60)`, `[60,75)`, `[75,90)`, `>=90`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimilarityDistribution {
    pub very_high: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub very_low: usize,
}

impl SimilarityDistribution {
    fn record(&mut self, score: f64) {
        match SimilarityGrade::from_score(score) {
            SimilarityGrade::VerySimilar => self.very_high += 1,
            SimilarityGrade::Similar => self.high += 1,
            SimilarityGrade::Moderate => self.medium += 1,
            SimilarityGrade::SomewhatDifferent => self.low += 1,
            SimilarityGrade::VeryDifferent => self.very_low += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.very_high + self.high + self.medium + self.low + self.very_low
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonSummary {
    pub total_reference_sequences: usize,
    pub total_comparisons: usize,
    pub average_similarity: f64,
    pub min_similarity: f64,
    pub max_similarity: f64,
    pub similarity_distribution: SimilarityDistribution,
}

/// Percentage of positions (up to the shorter length) holding the same
/// symbol, relative to the longer length. Case-insensitive; 0 when either
/// side is empty.
pub fn similarity_score(reference: &[u8], compared: &[u8]) -> f64 {
    if reference.is_empty() || compared.is_empty() {
        return 0.0;
    }

    let matches = reference
        .iter()
        .zip(compared)
        .filter(|(a, b)| a.eq_ignore_ascii_case(b))
        .count();
    let longest = reference.len().max(compared.len());

    matches as f64 / longest as f64 * 100.0
}

pub fn compare_records(
    reference: &SequenceRecord,
    compared: &SequenceRecord,
    file_id: &str,
    file_name: &str,
) -> ComparisonMatch {
    let ref_len = reference.len();
    let cmp_len = compared.len();
    let score = similarity_score(&reference.sequence, &compared.sequence);

    ComparisonMatch {
        reference: reference.summary(),
        compared: compared.summary(),
        file_id: file_id.to_string(),
        file_name: file_name.to_string(),
        length_difference: cmp_len as i64 - ref_len as i64,
        length_ratio: if ref_len > 0 {
            cmp_len as f64 / ref_len as f64
        } else {
            0.0
        },
        composition_delta: compared.counts().delta(reference.counts()),
        similarity_score: score,
        similarity_grade: SimilarityGrade::from_score(score),
    }
}

/// Cross-product comparison engine
#[derive(Debug, Clone, Copy)]
pub struct ComparisonEngine {
    parallel: bool,
}

impl Default for ComparisonEngine {
    fn default() -> Self {
        Self { parallel: true }
    }
}

impl ComparisonEngine {
    pub fn new(parallel: bool) -> Self {
        Self { parallel }
    }

    /// Match every reference record against every record of every compared
    /// file. Output follows reference order; within a reference, matches are
    /// stably sorted by descending score, so ties keep file order then record
    /// order.
    pub fn compare(
        &self,
        reference: &[SequenceRecord],
        compared: &[ComparedFile<'_>],
    ) -> Vec<ReferenceMatches> {
        if self.parallel {
            reference
                .par_iter()
                .map(|r| Self::match_reference(r, compared))
                .collect()
        } else {
            reference
                .iter()
                .map(|r| Self::match_reference(r, compared))
                .collect()
        }
    }

    fn match_reference(reference: &SequenceRecord, compared: &[ComparedFile<'_>]) -> ReferenceMatches {
        let mut matches: Vec<ComparisonMatch> = compared
            .iter()
            .flat_map(|file| {
                file.records
                    .iter()
                    .map(move |record| compare_records(reference, record, file.file_id, file.file_name))
            })
            .collect();

        matches.sort_by(|a, b| b.similarity_score.total_cmp(&a.similarity_score));

        ReferenceMatches {
            reference: reference.summary(),
            total_matches: matches.len(),
            matches,
        }
    }

    pub fn summarize(&self, comparisons: &[ReferenceMatches]) -> ComparisonSummary {
        let mut distribution = SimilarityDistribution::default();
        let mut total = 0.0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut count = 0usize;

        for m in comparisons.iter().flat_map(|c| &c.matches) {
            let score = m.similarity_score;
            distribution.record(score);
            total += score;
            min = min.min(score);
            max = max.max(score);
            count += 1;
        }

        let (average, min, max) = if count == 0 {
            (0.0, 0.0, 0.0)
        } else {
            (total / count as f64, min, max)
        };

        ComparisonSummary {
            total_reference_sequences: comparisons.len(),
            total_comparisons: count,
            average_similarity: average,
            min_similarity: min,
            max_similarity: max,
            similarity_distribution: distribution,
        }
    }
}
