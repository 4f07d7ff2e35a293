//! Songplay fact resolution.

use super::error::PipelineError;
use super::log::PlaybackEvent;
use crate::warehouse_store::{Songplay, WarehouseStore};
use tracing::trace;

/// Largest songplay id the store can hold (SQLite integers are signed).
pub const MAX_SONGPLAY_ID: u64 = i64::MAX as u64;

/// Outcome of resolving the songplays of one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SongplayResolution {
    /// Songplays whose song and artist were found in the store.
    pub resolved: usize,
    /// The id to hand to the next file.
    pub next_songplay_id: u64,
}

/// Build the songplay for `event`, looking its song and artist up in the
/// store. Unmatched plays keep null song and artist ids.
pub fn resolve_songplay(
    store: &dyn WarehouseStore,
    event: &PlaybackEvent,
    songplay_id: u64,
) -> Result<Songplay, PipelineError> {
    let found = store.find_song_artist(&event.song, &event.artist, event.length)?;
    if found.is_none() {
        trace!(
            "line {}: no catalog match for '{}' by '{}' ({})",
            event.line,
            event.song,
            event.artist,
            event.length
        );
    }
    let (song_id, artist_id) = match found {
        Some(found) => (Some(found.song_id), Some(found.artist_id)),
        None => (None, None),
    };

    Ok(Songplay {
        songplay_id,
        start_time: event.start_time,
        user_id: event.user_id,
        level: event.level,
        song_id,
        artist_id,
        session_id: event.session_id,
        location: event.location.clone(),
        user_agent: event.user_agent.clone(),
    })
}

/// Resolve and insert one songplay per event, in order, with ids
/// `base_songplay_id..base_songplay_id + events.len()`. Fails before
/// inserting anything if that range goes past [`MAX_SONGPLAY_ID`].
pub fn resolve_songplays(
    store: &dyn WarehouseStore,
    events: &[PlaybackEvent],
    base_songplay_id: u64,
) -> Result<SongplayResolution, PipelineError> {
    let next_songplay_id = u64::try_from(events.len())
        .ok()
        .and_then(|count| base_songplay_id.checked_add(count))
        .filter(|&next| next <= MAX_SONGPLAY_ID)
        .ok_or(PipelineError::SongplayIdOverflow {
            base: base_songplay_id,
            count: events.len(),
        })?;

    let mut resolved = 0;
    for (songplay_id, event) in (base_songplay_id..next_songplay_id).zip(events) {
        let songplay = resolve_songplay(store, event, songplay_id)?;
        if songplay.song_id.is_some() {
            resolved += 1;
        }
        store.insert_songplay(&songplay)?;
    }
    Ok(SongplayResolution {
        resolved,
        next_songplay_id,
    })
}
