pub mod compare;
pub mod stats;

use crate::cli::OutputFormat;
use crate::config::Config;
use crate::core::AnalysisService;
use crate::storage::{FileRecord, FileRegistry, InMemoryFileRegistry, InMemoryRecordStore, UploadStatus};
use crate::SeqscopeError;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Files named on the command line, registered as completed uploads in an
/// in-memory registry for the lifetime of the process
pub struct Session {
    registry: Arc<InMemoryFileRegistry>,
    analysis: Arc<AnalysisService>,
}

impl Session {
    pub fn new(config: &Config) -> Self {
        let registry = Arc::new(InMemoryFileRegistry::new());
        let analysis = Arc::new(AnalysisService::from_config(
            registry.clone(),
            InMemoryRecordStore::shared(),
            config,
        ));
        Self { registry, analysis }
    }

    /// Register a local file under a fresh id and return the id
    pub fn register_input(&self, path: &Path) -> crate::Result<String> {
        let file_id = Uuid::new_v4().to_string();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        let size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);

        self.registry.register(
            FileRecord::new(file_id.clone(), name, path.to_path_buf(), size).with_status(UploadStatus::Completed),
        )?;
        Ok(file_id)
    }

    pub fn analysis(&self) -> &Arc<AnalysisService> {
        &self.analysis
    }
}

/// Command-line format if given, else the configured default
pub fn resolve_format(arg: Option<&str>, config: &Config) -> crate::Result<OutputFormat> {
    arg.unwrap_or(&config.output.format)
        .parse()
        .map_err(SeqscopeError::Config)
}

pub fn spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
