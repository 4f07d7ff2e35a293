//! Batch loading: drives one pass over every file of a given kind, one
//! transaction per file, threading the songplay id counter through.

use super::catalog::process_song_file;
use super::error::{LoadError, PipelineError};
use super::files::{enumerate_files, FileOrder};
use super::log::process_log_file;
use crate::warehouse_store::WarehouseStore;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Which kind of source files a pass processes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingMode {
    /// Song catalog files, producing songs and artists.
    Catalog,
    /// Usage log files, producing time, users and songplays.
    Log,
}

impl fmt::Display for ProcessingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessingMode::Catalog => write!(f, "catalog"),
            ProcessingMode::Log => write!(f, "log"),
        }
    }
}

/// Totals of one loading pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadSummary {
    pub mode: ProcessingMode,
    pub files_processed: usize,
    pub playback_events: usize,
    pub resolved_songplays: usize,
    pub next_songplay_id: u64,
}

impl LoadSummary {
    fn new(mode: ProcessingMode, next_songplay_id: u64) -> Self {
        Self {
            mode,
            files_processed: 0,
            playback_events: 0,
            resolved_songplays: 0,
            next_songplay_id,
        }
    }
}

fn roll_back(store: &dyn WarehouseStore) {
    if let Err(rollback_error) = store.rollback_file() {
        warn!("Failed to roll back file transaction: {}", rollback_error);
    }
}

/// Run `f` inside a file transaction: committed if `f` succeeds, rolled
/// back if `f` or the commit fails.
pub fn run_in_file_transaction<T>(
    store: &dyn WarehouseStore,
    f: impl FnOnce() -> Result<T, PipelineError>,
) -> Result<T, PipelineError> {
    store.begin_file()?;
    let result = f().and_then(|value| {
        store.commit_file()?;
        Ok(value)
    });
    if result.is_err() {
        roll_back(store);
    }
    result
}

/// Load a single file and commit it, returning the updated summary.
fn load_file(
    store: &dyn WarehouseStore,
    path: &Path,
    summary: LoadSummary,
) -> Result<LoadSummary, PipelineError> {
    run_in_file_transaction(store, || match summary.mode {
        ProcessingMode::Catalog => {
            process_song_file(store, path)?;
            Ok(LoadSummary {
                files_processed: summary.files_processed + 1,
                ..summary
            })
        }
        ProcessingMode::Log => {
            let stats = process_log_file(store, path, summary.next_songplay_id)?;
            debug!(
                "{}: {} of {} records are playback events, {} matched the catalog",
                path.display(),
                stats.playback_events,
                stats.records,
                stats.resolved
            );
            Ok(LoadSummary {
                files_processed: summary.files_processed + 1,
                playback_events: summary.playback_events + stats.playback_events,
                resolved_songplays: summary.resolved_songplays + stats.resolved,
                next_songplay_id: stats.next_songplay_id,
                ..summary
            })
        }
    })
}

/// Load `files` in the given order. Songplay ids start at
/// `first_songplay_id`. Stops at the first failing file; the files before
/// it stay committed.
pub fn load_files(
    store: &dyn WarehouseStore,
    mode: ProcessingMode,
    files: &[PathBuf],
    first_songplay_id: u64,
) -> Result<LoadSummary, LoadError> {
    let total = files.len();
    files.iter().enumerate().try_fold(
        LoadSummary::new(mode, first_songplay_id),
        |summary, (index, path)| {
            let summary = load_file(store, path, summary).map_err(|source| LoadError {
                mode,
                path: path.clone(),
                source,
            })?;
            info!("{}/{} files processed.", index + 1, total);
            Ok(summary)
        },
    )
}

/// Discover every `extension` file under `root` and load them.
pub fn load_dir(
    store: &dyn WarehouseStore,
    mode: ProcessingMode,
    root: &Path,
    extension: &str,
    order: FileOrder,
    first_songplay_id: u64,
) -> Result<LoadSummary, LoadError> {
    let files = enumerate_files(root, extension, order).map_err(|source| LoadError {
        mode,
        path: root.to_path_buf(),
        source,
    })?;
    for file in &files {
        debug!("{}", file.display());
    }
    info!("{} files found in {}", files.len(), root.display());

    load_files(store, mode, &files, first_songplay_id)
}
