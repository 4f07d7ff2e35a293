use anyhow::{Context, Result};
use clap::Parser;
use songplay_etl::config::{
    AppConfig, CliConfig, FileConfig, SongplayIdStart, DEFAULT_EXTENSION, DEFAULT_LOG_DATA,
    DEFAULT_SONG_DATA,
};
use songplay_etl::{load_dir, FileOrder, ProcessingMode, SqliteWarehouseStore, WarehouseStore};
use std::path::PathBuf;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
#[command(name = "songplay-etl")]
#[command(about = "Load song catalog and usage log files into the songplay warehouse")]
struct CliArgs {
    /// Path to the SQLite warehouse database file (created if missing).
    #[clap(value_parser = parse_path)]
    pub db_path: Option<PathBuf>,

    /// Root directory of the song catalog files.
    #[clap(long, value_parser = parse_path, default_value = DEFAULT_SONG_DATA)]
    pub song_data: PathBuf,

    /// Root directory of the usage log files.
    #[clap(long, value_parser = parse_path, default_value = DEFAULT_LOG_DATA)]
    pub log_data: PathBuf,

    /// Extension of the source files to load.
    #[clap(long, default_value = DEFAULT_EXTENSION)]
    pub extension: String,

    /// Order in which discovered files are loaded.
    #[clap(long, value_enum, default_value_t = FileOrder::Sorted)]
    pub file_order: FileOrder,

    /// First songplay id of this run.
    #[clap(long, conflicts_with = "resume_songplay_ids")]
    pub songplay_offset: Option<u64>,

    /// Continue songplay ids after the highest one already stored.
    #[clap(long)]
    pub resume_songplay_ids: bool,

    /// Path to a TOML config file. Its values override the command line.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,
}

impl CliArgs {
    fn to_cli_config(&self) -> CliConfig {
        CliConfig {
            db_path: self.db_path.clone(),
            song_data: self.song_data.clone(),
            log_data: self.log_data.clone(),
            extension: self.extension.clone(),
            file_order: self.file_order,
            songplay_offset: self.songplay_offset,
            resume_songplay_ids: self.resume_songplay_ids,
        }
    }
}

fn run(config: &AppConfig) -> Result<()> {
    info!("Opening warehouse database at {:?}...", config.db_path);
    let store = SqliteWarehouseStore::open(&config.db_path)?;

    let first_songplay_id = match config.songplay_id_start {
        SongplayIdStart::Offset(offset) => offset,
        SongplayIdStart::Resume => store.next_songplay_id()?,
    };

    info!("Loading song catalog from {:?}...", config.song_data);
    let catalog = load_dir(
        &store,
        ProcessingMode::Catalog,
        &config.song_data,
        &config.extension,
        config.file_order,
        first_songplay_id,
    )?;
    info!("Catalog pass done: {} files", catalog.files_processed);

    info!(
        "Loading usage logs from {:?}, songplay ids from {}...",
        config.log_data, first_songplay_id
    );
    let logs = load_dir(
        &store,
        ProcessingMode::Log,
        &config.log_data,
        &config.extension,
        config.file_order,
        first_songplay_id,
    )?;
    info!(
        "Log pass done: {} files, {} songplays ({} matched to the catalog), next songplay id {}",
        logs.files_processed, logs.playback_events, logs.resolved_songplays, logs.next_songplay_id
    );

    let counts = store.table_counts()?;
    info!("Warehouse contains:");
    info!("  {} songs", counts.songs);
    info!("  {} artists", counts.artists);
    info!("  {} users", counts.users);
    info!("  {} time rows", counts.time);
    info!("  {} songplays", counts.songplays);
    Ok(())
}

fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading config from {:?}", path);
            Some(FileConfig::load(path)?)
        }
        None => None,
    };
    let config = AppConfig::resolve(&cli_args.to_cli_config(), file_config)?;

    run(&config)?;
    info!("ETL completed successfully!");
    Ok(())
}
