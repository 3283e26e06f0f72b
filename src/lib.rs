pub mod bio;
pub mod cli;
pub mod compare;
pub mod config;
pub mod core;
pub mod storage;

pub use crate::compare::{ComparisonCache, ComparisonResult, ComparisonStatus, Fingerprint};
pub use crate::core::{analysis::AnalysisService, comparison::ComparisonService};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SeqscopeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("File not found in registry: {0}")]
    NotFound(String),

    #[error("File upload not completed: {0}")]
    NotReady(String),

    #[error("Missing file artifact: {0}")]
    MissingArtifact(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Comparison failed: {0}")]
    Comparison(String),

    #[error("{0}")]
    Other(String),
}

impl SeqscopeError {
    /// Errors caused by the state of a referenced file rather than by I/O or data
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            SeqscopeError::NotFound(_) | SeqscopeError::NotReady(_) | SeqscopeError::MissingArtifact(_)
        )
    }
}

impl SeqscopeError {
    /// Take an error back out of the `Arc` a shared comparison handle hands
    /// to every waiter, rebuilding it when other waiters still hold a copy
    pub fn unshare(err: std::sync::Arc<SeqscopeError>) -> SeqscopeError {
        match std::sync::Arc::try_unwrap(err) {
            Ok(err) => err,
            Err(shared) => match &*shared {
                SeqscopeError::Io(e) => SeqscopeError::Io(std::io::Error::new(e.kind(), e.to_string())),
                SeqscopeError::Parse(m) => SeqscopeError::Parse(m.clone()),
                SeqscopeError::NotFound(m) => SeqscopeError::NotFound(m.clone()),
                SeqscopeError::NotReady(m) => SeqscopeError::NotReady(m.clone()),
                SeqscopeError::MissingArtifact(m) => SeqscopeError::MissingArtifact(m.clone()),
                SeqscopeError::Storage(m) => SeqscopeError::Storage(m.clone()),
                SeqscopeError::Config(m) => SeqscopeError::Config(m.clone()),
                SeqscopeError::Comparison(m) => SeqscopeError::Comparison(m.clone()),
                SeqscopeError::Other(m) => SeqscopeError::Other(m.clone()),
            },
        }
    }
}

impl From<serde_json::Error> for SeqscopeError {
    fn from(err: serde_json::Error) -> Self {
        SeqscopeError::Parse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SeqscopeError>;
