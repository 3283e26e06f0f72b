use crate::bio::composition::BaseCounts;
use crate::bio::sequence::SequenceRecord;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of bins in both the length and the GC histogram
pub const HISTOGRAM_BINS: usize = 10;

const GC_BIN_WIDTH: f64 = 100.0 / HISTOGRAM_BINS as f64;

/// One histogram bucket. Length bins are inclusive on both ends; GC bins are
/// half-open except the last one, which also holds exactly 100%.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bin<T> {
    pub start: T,
    pub end: T,
    pub count: usize,
}

impl fmt::Display for Bin<usize> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

impl fmt::Display for Bin<f64> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}%", self.start as u32, self.end as u32)
    }
}

/// File-level reduction of per-record statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileAggregate {
    pub file_id: String,
    pub total_sequences: usize,
    pub valid_sequences: usize,
    pub total_length: u64,
    pub average_length: f64,
    pub min_length: usize,
    pub max_length: usize,
    pub average_gc_content: f64,
    pub base_composition: BaseCounts,
    pub length_distribution: Vec<Bin<usize>>,
    pub gc_distribution: Vec<Bin<f64>>,
}

impl FileAggregate {
    /// Zero-valued aggregate for a file without records
    pub fn empty(file_id: impl Into<String>) -> Self {
        Self {
            file_id: file_id.into(),
            total_sequences: 0,
            valid_sequences: 0,
            total_length: 0,
            average_length: 0.0,
            min_length: 0,
            max_length: 0,
            average_gc_content: 0.0,
            base_composition: BaseCounts::default(),
            length_distribution: Vec::new(),
            gc_distribution: Vec::new(),
        }
    }

    /// Reduce the records of one file.
    ///
    /// Length, GC and composition figures only consider valid records; the
    /// total count includes everything fed in.
    pub fn from_records<'a, I>(file_id: impl Into<String>, records: I) -> Self
    where
        I: IntoIterator<Item = &'a SequenceRecord>,
    {
        let mut acc = StatsAccumulator::default();
        for record in records {
            acc.push(record);
        }
        acc.finish(file_id)
    }
}

/// Running totals for one file, fed record by record so callers can stream.
///
/// Only per-record lengths and GC values are retained, never sequences.
#[derive(Debug, Default)]
pub struct StatsAccumulator {
    total_sequences: usize,
    lengths: Vec<usize>,
    gc_values: Vec<f64>,
    base_composition: BaseCounts,
}

impl StatsAccumulator {
    pub fn push(&mut self, record: &SequenceRecord) {
        self.total_sequences += 1;
        if !record.is_valid() {
            return;
        }
        self.lengths.push(record.len());
        self.gc_values.push(record.gc_content());
        self.base_composition += *record.counts();
    }

    pub fn total_sequences(&self) -> usize {
        self.total_sequences
    }

    pub fn finish(self, file_id: impl Into<String>) -> FileAggregate {
        let file_id = file_id.into();
        if self.total_sequences == 0 {
            return FileAggregate::empty(file_id);
        }

        let valid_sequences = self.lengths.len();
        let total_length: u64 = self.lengths.iter().map(|&l| l as u64).sum();
        let (average_length, average_gc_content) = if valid_sequences == 0 {
            (0.0, 0.0)
        } else {
            (
                total_length as f64 / valid_sequences as f64,
                self.gc_values.iter().sum::<f64>() / valid_sequences as f64,
            )
        };

        FileAggregate {
            file_id,
            total_sequences: self.total_sequences,
            valid_sequences,
            total_length,
            average_length: round2(average_length),
            min_length: self.lengths.iter().copied().min().unwrap_or(0),
            max_length: self.lengths.iter().copied().max().unwrap_or(0),
            average_gc_content: round2(average_gc_content),
            base_composition: self.base_composition,
            length_distribution: length_distribution(&self.lengths),
            gc_distribution: gc_distribution(&self.gc_values),
        }
    }
}

/// Round to 2 decimal places for reporting
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Ten equal-width inclusive bins over `[min, max]`; the last bin always ends
/// at `max`. Empty input yields no bins.
pub fn length_distribution(lengths: &[usize]) -> Vec<Bin<usize>> {
    let (Some(&min), Some(&max)) = (lengths.iter().min(), lengths.iter().max()) else {
        return Vec::new();
    };

    let width = ((max - min) / HISTOGRAM_BINS).max(1);
    let mut bins: Vec<Bin<usize>> = (0..HISTOGRAM_BINS)
        .map(|i| {
            let start = min + i * width;
            let end = if i == HISTOGRAM_BINS - 1 {
                max
            } else {
                start + width - 1
            };
            Bin { start, end, count: 0 }
        })
        .collect();

    // Bins before the last are contiguous, so the first containing bin is
    // found by division; anything past them lands in the last bin.
    for &length in lengths {
        let index = ((length - min) / width).min(HISTOGRAM_BINS - 1);
        bins[index].count += 1;
    }

    bins
}

/// Ten fixed bins of 10 percentage points. Exactly 100% is counted in the
/// last bin.
pub fn gc_distribution(gc_values: &[f64]) -> Vec<Bin<f64>> {
    if gc_values.is_empty() {
        return Vec::new();
    }

    let mut bins: Vec<Bin<f64>> = (0..HISTOGRAM_BINS)
        .map(|i| Bin {
            start: i as f64 * GC_BIN_WIDTH,
            end: (i + 1) as f64 * GC_BIN_WIDTH,
            count: 0,
        })
        .collect();

    for &gc in gc_values {
        let index = bins
            .iter()
            .position(|bin| gc >= bin.start && gc < bin.end)
            .unwrap_or(HISTOGRAM_BINS - 1);
        bins[index].count += 1;
    }

    bins
}
