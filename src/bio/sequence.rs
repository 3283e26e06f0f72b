use crate::bio::composition::{self, BaseCounts, Composition};
use serde::{Deserialize, Serialize};

/// A parsed FASTA record together with its derived composition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceRecord {
    pub id: String,
    pub header: String,
    pub sequence: Vec<u8>,
    pub composition: Composition,
}

impl SequenceRecord {
    pub fn new(header: impl Into<String>, sequence: Vec<u8>) -> Self {
        let header = header.into();
        let composition = composition::analyze(&sequence);

        Self {
            id: extract_sequence_id(&header),
            header,
            sequence,
            composition,
        }
    }

    pub fn len(&self) -> usize {
        self.composition.length
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    pub fn is_valid(&self) -> bool {
        self.composition.valid && self.composition.length > 0
    }

    pub fn gc_content(&self) -> f64 {
        self.composition.gc_content
    }

    pub fn counts(&self) -> &BaseCounts {
        &self.composition.counts
    }

    pub fn sequence_str(&self) -> String {
        String::from_utf8_lossy(&self.sequence).to_string()
    }

    pub fn summary(&self) -> RecordSummary {
        RecordSummary {
            sequence_id: self.id.clone(),
            header: self.header.clone(),
            length: self.composition.length,
            gc_content: self.composition.gc_content,
            counts: self.composition.counts,
            valid: self.is_valid(),
        }
    }
}

/// Sequence-free view of a record, used wherever records are reported
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordSummary {
    pub sequence_id: String,
    pub header: String,
    pub length: usize,
    pub gc_content: f64,
    pub counts: BaseCounts,
    pub valid: bool,
}

/// First whitespace-delimited token of a header, or `unknown`
pub fn extract_sequence_id(header: &str) -> String {
    header
        .split_whitespace()
        .next()
        .unwrap_or("unknown")
        .to_string()
}
