//! Errors produced while transforming and loading source files.

use crate::warehouse_store::StoreError;
use std::path::PathBuf;
use thiserror::Error;

use super::ProcessingMode;

/// Errors raised while processing a single source file.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{}:{line}: malformed JSON record: {source}", path.display())]
    MalformedRecord {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("{}:{line}: record does not match the expected schema: {reason}", path.display())]
    SchemaMismatch {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("songplay ids from {base} for {count} events exceed the largest storable id")]
    SongplayIdOverflow { base: u64, count: usize },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PipelineError {
    pub(crate) fn schema_mismatch(path: &std::path::Path, line: usize, reason: impl Into<String>) -> Self {
        PipelineError::SchemaMismatch {
            path: path.to_path_buf(),
            line,
            reason: reason.into(),
        }
    }
}

/// A file failed to load; later files in the pass were not processed.
#[derive(Debug, Error)]
#[error("Failed to load {mode} file {}", path.display())]
pub struct LoadError {
    pub mode: ProcessingMode,
    pub path: PathBuf,
    #[source]
    pub source: PipelineError,
}
