pub mod composition;
pub mod fasta;
pub mod sequence;
pub mod stats;

pub use composition::{BaseCounts, BaseDelta, Composition};
pub use sequence::{RecordSummary, SequenceRecord};
pub use stats::{Bin, FileAggregate};
