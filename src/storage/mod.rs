pub mod memory;
pub mod registry;
pub mod traits;

pub use memory::{InMemoryFileRegistry, InMemoryRecordStore};
pub use registry::{FileRecord, UploadStatus};
pub use traits::{BatchPolicy, FileRegistry, RecordStore};
