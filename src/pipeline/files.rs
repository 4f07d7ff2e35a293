//! Source file discovery.

use super::error::PipelineError;
use clap::ValueEnum;
use std::fmt;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Order in which discovered files are processed.
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FileOrder {
    /// Lexicographic order of the absolute paths.
    #[default]
    Sorted,
    /// Whatever order the directory walk yields.
    Walk,
}

impl fmt::Display for FileOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileOrder::Sorted => write!(f, "sorted"),
            FileOrder::Walk => write!(f, "walk"),
        }
    }
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e == extension)
        .unwrap_or(false)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with('.'))
        .unwrap_or(false)
}

/// Recursively list the absolute paths of the non-hidden files under
/// `root` whose extension is `extension`.
pub fn enumerate_files(
    root: &Path,
    extension: &str,
    order: FileOrder,
) -> Result<Vec<PathBuf>, PipelineError> {
    let root = root.canonicalize().map_err(|source| PipelineError::Io {
        path: root.to_path_buf(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in WalkDir::new(&root).follow_links(true) {
        let entry = entry.map_err(|e| PipelineError::Io {
            path: e.path().map(Path::to_path_buf).unwrap_or_else(|| root.clone()),
            source: e.into(),
        })?;
        let path = entry.path();
        if entry.file_type().is_file() && has_extension(path, extension) && !is_hidden(path) {
            files.push(path.to_path_buf());
        }
    }

    if order == FileOrder::Sorted {
        files.sort();
    }
    Ok(files)
}
