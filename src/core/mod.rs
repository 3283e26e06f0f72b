pub mod analysis;
pub mod comparison;

pub use analysis::AnalysisService;
pub use comparison::{ComparisonRunner, ComparisonService};
