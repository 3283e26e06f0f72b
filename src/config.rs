//! Configuration types for seqscope

use crate::storage::BatchPolicy;
use crate::SeqscopeError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub comparison: ComparisonConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_single_insert_threshold")]
    pub single_insert_threshold: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonConfig {
    /// Spread reference records over the rayon pool
    #[serde(default = "default_parallel")]
    pub parallel: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_format")]
    pub format: String,
}

fn default_batch_size() -> usize { 500 }
fn default_single_insert_threshold() -> usize { 100_000 }
fn default_parallel() -> bool { true }
fn default_format() -> String { "text".to_string() }

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            single_insert_threshold: default_single_insert_threshold(),
        }
    }
}

impl Default for ComparisonConfig {
    fn default() -> Self {
        Self {
            parallel: default_parallel(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
        }
    }
}

impl StorageConfig {
    pub fn batch_policy(&self) -> BatchPolicy {
        BatchPolicy {
            batch_size: self.batch_size,
            single_insert_threshold: self.single_insert_threshold,
        }
    }
}

pub fn default_config() -> Config {
    Config::default()
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, SeqscopeError> {
    let contents = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&contents)
        .map_err(|e| SeqscopeError::Config(format!("Failed to parse config: {}", e)))?;
    Ok(config)
}

pub fn save_config<P: AsRef<Path>>(path: P, config: &Config) -> Result<(), SeqscopeError> {
    let contents = toml::to_string_pretty(config)
        .map_err(|e| SeqscopeError::Config(format!("Failed to serialize config: {}", e)))?;
    std::fs::write(path, contents)?;
    Ok(())
}

/// Load the config at `path` if given and present, defaults otherwise
pub fn load_or_default(path: Option<&Path>) -> Result<Config, SeqscopeError> {
    match path {
        Some(path) if path.exists() => load_config(path),
        Some(path) => {
            warn!("Config file {} not found, using defaults", path.display());
            Ok(default_config())
        }
        None => Ok(default_config()),
    }
}
