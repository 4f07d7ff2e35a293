//! The transformation pipeline: JSON-lines source files in, warehouse rows
//! out.

mod catalog;
mod error;
mod facts;
mod files;
mod loader;
mod log;
mod reader;
mod records;

pub use catalog::{extract_song_artist, process_song_file, read_song_file};
pub use error::{LoadError, PipelineError};
pub use facts::{resolve_songplay, resolve_songplays, SongplayResolution, MAX_SONGPLAY_ID};
pub use files::{enumerate_files, FileOrder};
pub use loader::{load_dir, load_files, run_in_file_transaction, LoadSummary, ProcessingMode};
pub use log::{
    playback_event, process_log_file, read_playback_events, time_dimension, user_row,
    LogFileStats, PlaybackEvent,
};
pub use reader::{JsonLinesFile, LineRecord, Records};
pub use records::{LogEnvelope, LogRecord, SongRecord, NEXT_SONG_PAGE};
