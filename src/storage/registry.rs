/// Registry entries for uploaded FASTA files
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UploadStatus {
    Uploading,
    Completed,
    Failed,
    Cancelled,
}

impl fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UploadStatus::Uploading => "UPLOADING",
            UploadStatus::Completed => "COMPLETED",
            UploadStatus::Failed => "FAILED",
            UploadStatus::Cancelled => "CANCELLED",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    pub file_id: String,
    pub original_name: String,
    pub path: PathBuf,
    pub size: u64,
    pub status: UploadStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FileRecord {
    /// A freshly registered upload, not yet written to disk
    pub fn new(file_id: impl Into<String>, original_name: impl Into<String>, path: PathBuf, size: u64) -> Self {
        let now = Utc::now();
        Self {
            file_id: file_id.into(),
            original_name: original_name.into(),
            path,
            size,
            status: UploadStatus::Uploading,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_status(mut self, status: UploadStatus) -> Self {
        self.status = status;
        self
    }

    pub fn is_completed(&self) -> bool {
        self.status == UploadStatus::Completed
    }

    pub fn formatted_size(&self) -> String {
        humansize::format_size(self.size, humansize::BINARY)
    }
}
