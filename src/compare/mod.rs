pub mod cache;
pub mod engine;
pub mod result;

pub use cache::{
    CacheStats, ComparisonBackend, ComparisonCache, ComparisonHandle, ComparisonOutcome,
    ComparisonRequest, ComparisonStatus, Fingerprint,
};
pub use engine::{
    ComparedFile, ComparisonEngine, ComparisonMatch, ComparisonSummary, ReferenceMatches,
    SimilarityDistribution, SimilarityGrade,
};
pub use result::{ComparisonResult, ReferenceFileSummary};
