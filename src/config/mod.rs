mod file_config;

pub use file_config::FileConfig;

use crate::pipeline::{FileOrder, MAX_SONGPLAY_ID};
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;

pub const DEFAULT_SONG_DATA: &str = "data/song_data";
pub const DEFAULT_LOG_DATA: &str = "data/log_data";
pub const DEFAULT_EXTENSION: &str = "json";

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub db_path: Option<PathBuf>,
    pub song_data: PathBuf,
    pub log_data: PathBuf,
    pub extension: String,
    pub file_order: FileOrder,
    pub songplay_offset: Option<u64>,
    pub resume_songplay_ids: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            song_data: PathBuf::from(DEFAULT_SONG_DATA),
            log_data: PathBuf::from(DEFAULT_LOG_DATA),
            extension: DEFAULT_EXTENSION.to_string(),
            file_order: FileOrder::default(),
            songplay_offset: None,
            resume_songplay_ids: false,
        }
    }
}

/// Where the first songplay id of a run comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SongplayIdStart {
    /// Start at a fixed id (0 unless configured).
    Offset(u64),
    /// Continue after the highest id already in the warehouse.
    Resume,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub song_data: PathBuf,
    pub log_data: PathBuf,
    pub extension: String,
    pub file_order: FileOrder,
    pub songplay_id_start: SongplayIdStart,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_path = file
            .db_path
            .map(PathBuf::from)
            .or_else(|| cli.db_path.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("db_path must be specified on the command line or in config file")
            })?;

        let song_data = file
            .song_data
            .map(PathBuf::from)
            .unwrap_or_else(|| cli.song_data.clone());
        let log_data = file
            .log_data
            .map(PathBuf::from)
            .unwrap_or_else(|| cli.log_data.clone());
        for (name, dir) in [("song_data", &song_data), ("log_data", &log_data)] {
            if !dir.exists() {
                bail!("{} directory does not exist: {:?}", name, dir);
            }
            if !dir.is_dir() {
                bail!("{} is not a directory: {:?}", name, dir);
            }
        }

        let extension = file
            .extension
            .unwrap_or_else(|| cli.extension.clone())
            .trim_start_matches('.')
            .to_string();
        if extension.is_empty() {
            bail!("extension must not be empty");
        }

        let file_order = match file.file_order {
            Some(s) => parse_file_order(&s)
                .ok_or_else(|| anyhow::anyhow!("Invalid file_order '{}'", s))?,
            None => cli.file_order,
        };

        let songplay_offset = file.songplay_offset.or(cli.songplay_offset);
        let resume_songplay_ids = file
            .resume_songplay_ids
            .unwrap_or(cli.resume_songplay_ids);
        let songplay_id_start = match (songplay_offset, resume_songplay_ids) {
            (Some(_), true) => {
                bail!("songplay_offset and resume_songplay_ids cannot be used together")
            }
            (Some(offset), false) if offset > MAX_SONGPLAY_ID => {
                bail!("songplay_offset must not exceed {}", MAX_SONGPLAY_ID)
            }
            (Some(offset), false) => SongplayIdStart::Offset(offset),
            (None, true) => SongplayIdStart::Resume,
            (None, false) => SongplayIdStart::Offset(0),
        };

        Ok(Self {
            db_path,
            song_data,
            log_data,
            extension,
            file_order,
            songplay_id_start,
        })
    }
}

/// Parses a file order string. Uses clap's ValueEnum trait for parsing.
fn parse_file_order(s: &str) -> Option<FileOrder> {
    FileOrder::from_str(s, true).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    struct DataDirs {
        _dir: TempDir,
        song_data: PathBuf,
        log_data: PathBuf,
    }

    fn make_data_dirs() -> DataDirs {
        let dir = TempDir::new().unwrap();
        let song_data = dir.path().join("song_data");
        let log_data = dir.path().join("log_data");
        fs::create_dir_all(&song_data).unwrap();
        fs::create_dir_all(&log_data).unwrap();
        DataDirs {
            _dir: dir,
            song_data,
            log_data,
        }
    }

    fn cli_for(dirs: &DataDirs) -> CliConfig {
        CliConfig {
            db_path: Some(PathBuf::from("/tmp/warehouse.db")),
            song_data: dirs.song_data.clone(),
            log_data: dirs.log_data.clone(),
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_file_order() {
        assert_eq!(parse_file_order("sorted"), Some(FileOrder::Sorted));
        assert_eq!(parse_file_order("WALK"), Some(FileOrder::Walk));
        assert_eq!(parse_file_order("random"), None);
    }

    #[test]
    fn test_resolve_cli_only() {
        let dirs = make_data_dirs();
        let config = AppConfig::resolve(&cli_for(&dirs), None).unwrap();

        assert_eq!(config.db_path, PathBuf::from("/tmp/warehouse.db"));
        assert_eq!(config.song_data, dirs.song_data);
        assert_eq!(config.log_data, dirs.log_data);
        assert_eq!(config.extension, "json");
        assert_eq!(config.file_order, FileOrder::Sorted);
        assert_eq!(config.songplay_id_start, SongplayIdStart::Offset(0));
    }

    #[test]
    fn test_resolve_toml_overrides_cli() {
        let dirs = make_data_dirs();
        let cli = CliConfig {
            songplay_offset: Some(3),
            ..cli_for(&dirs)
        };
        let file_config = FileConfig {
            db_path: Some("/toml/warehouse.db".to_string()),
            extension: Some(".jsonl".to_string()),
            file_order: Some("walk".to_string()),
            songplay_offset: Some(10),
            ..Default::default()
        };

        let config = AppConfig::resolve(&cli, Some(file_config)).unwrap();

        assert_eq!(config.db_path, PathBuf::from("/toml/warehouse.db"));
        assert_eq!(config.extension, "jsonl");
        assert_eq!(config.file_order, FileOrder::Walk);
        assert_eq!(config.songplay_id_start, SongplayIdStart::Offset(10));
        // CLI value used when TOML doesn't specify
        assert_eq!(config.song_data, dirs.song_data);
    }

    #[test]
    fn test_resolve_missing_db_path_error() {
        let dirs = make_data_dirs();
        let cli = CliConfig {
            db_path: None,
            ..cli_for(&dirs)
        };
        let err = AppConfig::resolve(&cli, None).unwrap_err();
        assert!(err.to_string().contains("db_path must be specified"));
    }

    #[test]
    fn test_resolve_nonexistent_data_dir_error() {
        let dirs = make_data_dirs();
        let cli = CliConfig {
            log_data: PathBuf::from("/nonexistent/log_data"),
            ..cli_for(&dirs)
        };
        let err = AppConfig::resolve(&cli, None).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_resolve_data_dir_not_directory_error() {
        let dirs = make_data_dirs();
        let temp_file = tempfile::NamedTempFile::new().unwrap();
        let cli = CliConfig {
            song_data: temp_file.path().to_path_buf(),
            ..cli_for(&dirs)
        };
        let err = AppConfig::resolve(&cli, None).unwrap_err();
        assert!(err.to_string().contains("not a directory"));
    }

    #[test]
    fn test_resolve_resume_songplay_ids() {
        let dirs = make_data_dirs();
        let cli = CliConfig {
            resume_songplay_ids: true,
            ..cli_for(&dirs)
        };
        let config = AppConfig::resolve(&cli, None).unwrap();
        assert_eq!(config.songplay_id_start, SongplayIdStart::Resume);
    }

    #[test]
    fn test_resolve_offset_and_resume_conflict() {
        let dirs = make_data_dirs();
        let cli = CliConfig {
            songplay_offset: Some(5),
            resume_songplay_ids: true,
            ..cli_for(&dirs)
        };
        assert!(AppConfig::resolve(&cli, None).is_err());
    }

    #[test]
    fn test_resolve_offset_beyond_max_songplay_id() {
        let dirs = make_data_dirs();
        let file_config = FileConfig {
            songplay_offset: Some(u64::MAX),
            ..Default::default()
        };
        let err = AppConfig::resolve(&cli_for(&dirs), Some(file_config)).unwrap_err();
        assert!(err.to_string().contains("songplay_offset must not exceed"));

        let cli = CliConfig {
            songplay_offset: Some(MAX_SONGPLAY_ID),
            ..cli_for(&dirs)
        };
        let config = AppConfig::resolve(&cli, None).unwrap();
        assert_eq!(
            config.songplay_id_start,
            SongplayIdStart::Offset(MAX_SONGPLAY_ID)
        );
    }

    #[test]
    fn test_resolve_invalid_file_order_error() {
        let dirs = make_data_dirs();
        let file_config = FileConfig {
            file_order: Some("shuffled".to_string()),
            ..Default::default()
        };
        let err = AppConfig::resolve(&cli_for(&dirs), Some(file_config)).unwrap_err();
        assert!(err.to_string().contains("Invalid file_order"));
    }
}
