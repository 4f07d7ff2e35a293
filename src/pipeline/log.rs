//! Usage log normalization: playback filtering, time dimension derivation
//! and user projection.

use super::error::PipelineError;
use super::facts::resolve_songplays;
use super::reader::{JsonLinesFile, LineRecord};
use super::records::{LogEnvelope, LogRecord};
use crate::warehouse_store::{Level, TimeDimension, User, WarehouseStore};
use chrono::{DateTime, Datelike, Timelike, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

/// A playback (`NextSong`) log record with every field the warehouse
/// needs checked for presence.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackEvent {
    pub line: usize,
    pub start_time: DateTime<Utc>,
    pub user_id: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gender: Option<String>,
    pub level: Level,
    pub session_id: i64,
    pub song: String,
    pub artist: String,
    pub length: f64,
    pub location: Option<String>,
    pub user_agent: Option<String>,
}

/// Outcome of loading one log file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogFileStats {
    pub records: usize,
    pub playback_events: usize,
    pub resolved: usize,
    pub next_songplay_id: u64,
}

fn required<T>(path: &Path, line: usize, field: &str, value: Option<T>) -> Result<T, PipelineError> {
    value.ok_or_else(|| {
        PipelineError::schema_mismatch(path, line, format!("playback event is missing `{}`", field))
    })
}

/// Turn a parsed log line into a playback event. Non-playback lines yield
/// `None`; only their `page` and `ts` are checked.
pub fn playback_event(
    path: &Path,
    record: LineRecord<Value>,
) -> Result<Option<PlaybackEvent>, PipelineError> {
    let LineRecord { line, record } = record;
    let envelope = LogEnvelope::deserialize(&record)
        .map_err(|e| PipelineError::schema_mismatch(path, line, e.to_string()))?;
    if !envelope.is_playback() {
        return Ok(None);
    }
    let record: LogRecord = serde_json::from_value(record)
        .map_err(|e| PipelineError::schema_mismatch(path, line, e.to_string()))?;

    let start_time = DateTime::from_timestamp_millis(record.ts).ok_or_else(|| {
        PipelineError::schema_mismatch(path, line, format!("timestamp {} out of range", record.ts))
    })?;
    let level_str = required(path, line, "level", record.level)?;
    let level = Level::from_str(&level_str).ok_or_else(|| {
        PipelineError::schema_mismatch(path, line, format!("unknown level '{}'", level_str))
    })?;

    Ok(Some(PlaybackEvent {
        line,
        start_time,
        user_id: required(path, line, "userId", record.user_id)?,
        first_name: record.first_name,
        last_name: record.last_name,
        gender: record.gender,
        level,
        session_id: required(path, line, "sessionId", record.session_id)?,
        song: required(path, line, "song", record.song)?,
        artist: required(path, line, "artist", record.artist)?,
        length: required(path, line, "length", record.length)?,
        location: record.location,
        user_agent: record.user_agent,
    }))
}

/// Decompose a timestamp into a time dimension row. Weeks follow ISO 8601
/// numbering; all fields are taken in UTC.
pub fn time_dimension(start_time: DateTime<Utc>) -> TimeDimension {
    TimeDimension {
        start_time,
        hour: start_time.hour(),
        day: start_time.day(),
        week: start_time.iso_week().week(),
        month: start_time.month(),
        year: start_time.year(),
        weekday: start_time.weekday().to_string(),
    }
}

pub fn user_row(event: &PlaybackEvent) -> User {
    User {
        user_id: event.user_id,
        first_name: event.first_name.clone(),
        last_name: event.last_name.clone(),
        gender: event.gender.clone(),
        level: event.level,
    }
}

/// Read a log file and keep its playback events, in file order. Returns
/// the events and the total number of records.
pub fn read_playback_events(path: &Path) -> Result<(Vec<PlaybackEvent>, usize), PipelineError> {
    let mut events = Vec::new();
    let mut total = 0;
    for record in JsonLinesFile::new(path).records::<Value>()? {
        total += 1;
        if let Some(event) = playback_event(path, record?)? {
            events.push(event);
        }
    }
    Ok((events, total))
}

/// Load one log file: time and user rows for every playback event, then
/// one songplay per event numbered from `base_songplay_id`.
pub fn process_log_file(
    store: &dyn WarehouseStore,
    path: &Path,
    base_songplay_id: u64,
) -> Result<LogFileStats, PipelineError> {
    let (events, records) = read_playback_events(path)?;

    for event in &events {
        store.insert_time(&time_dimension(event.start_time))?;
    }
    for event in &events {
        store.insert_user(&user_row(event))?;
    }

    let resolution = resolve_songplays(store, &events, base_songplay_id)?;

    Ok(LogFileStats {
        records,
        playback_events: events.len(),
        resolved: resolution.resolved,
        next_songplay_id: resolution.next_songplay_id,
    })
}
