//! Shared setup for the integration tests
//!
//! Every fixture lives in its own temporary directory, which is removed when
//! the `TestEnvironment` is dropped.
#![allow(dead_code)]

use seqscope::config::Config;
use seqscope::core::{AnalysisService, ComparisonService};
use seqscope::storage::{FileRecord, FileRegistry, InMemoryFileRegistry, InMemoryRecordStore, UploadStatus};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

pub struct TestEnvironment {
    temp_dir: TempDir,
    pub registry: Arc<InMemoryFileRegistry>,
    pub store: Arc<InMemoryRecordStore>,
    pub analysis: Arc<AnalysisService>,
}

impl TestEnvironment {
    pub fn new() -> Self {
        Self::with_config(&Config::default())
    }

    pub fn with_config(config: &Config) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let registry = Arc::new(InMemoryFileRegistry::new());
        let store = InMemoryRecordStore::shared();
        let analysis = Arc::new(AnalysisService::from_config(
            registry.clone(),
            store.clone(),
            config,
        ));

        TestEnvironment {
            temp_dir,
            registry,
            store,
            analysis,
        }
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.temp_dir.path().join(relative)
    }

    /// Write `contents` to a file and register it with the given status
    pub fn add_file(&self, file_id: &str, contents: &str, status: UploadStatus) -> PathBuf {
        let path = self.path(&format!("{}.fasta", file_id));
        write_file(&path, contents.as_bytes());
        self.registry
            .register(
                FileRecord::new(file_id, format!("{}.fasta", file_id), path.clone(), contents.len() as u64)
                    .with_status(status),
            )
            .expect("Failed to register file");
        path
    }

    pub fn add_completed(&self, file_id: &str, contents: &str) -> PathBuf {
        self.add_file(file_id, contents, UploadStatus::Completed)
    }

    pub fn comparison_service(&self) -> ComparisonService {
        ComparisonService::new(self.analysis.clone(), &Config::default())
    }
}

pub fn write_file(path: &std::path::Path, contents: &[u8]) {
    let mut file = std::fs::File::create(path).expect("Failed to create file");
    file.write_all(contents).expect("Failed to write file");
}

/// Deterministic FASTA text: `count` records of `length` bases each
pub fn generate_fasta(count: usize, length: usize) -> String {
    let bases = b"ACGT";
    let mut content = String::new();
    for i in 0..count {
        content.push_str(&format!(">seq_{} generated\n", i));
        for j in 0..length {
            content.push(bases[(i + j) % 4] as char);
            if (j + 1) % 60 == 0 {
                content.push('\n');
            }
        }
        content.push('\n');
    }
    content
}

pub fn ids(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}
