//! Song catalog files: one record per file, projected into a song row and
//! an artist row.

use super::error::PipelineError;
use super::reader::JsonLinesFile;
use super::records::SongRecord;
use crate::warehouse_store::{Artist, Song, WarehouseStore};
use std::path::Path;
use tracing::debug;

/// Split a catalog record into its song and artist rows.
pub fn extract_song_artist(record: SongRecord) -> (Song, Artist) {
    let song = Song {
        song_id: record.song_id,
        title: record.title,
        artist_id: record.artist_id.clone(),
        year: record.year,
        duration: record.duration,
    };
    let artist = Artist {
        artist_id: record.artist_id,
        name: record.artist_name,
        location: record.artist_location,
        latitude: record.artist_latitude,
        longitude: record.artist_longitude,
    };
    (song, artist)
}

/// Read the single record of a catalog file.
pub fn read_song_file(path: &Path) -> Result<SongRecord, PipelineError> {
    let mut records = JsonLinesFile::new(path).records::<SongRecord>()?;
    let first = match records.next() {
        Some(record) => record?,
        None => {
            return Err(PipelineError::schema_mismatch(
                path,
                0,
                "catalog file contains no record",
            ))
        }
    };
    if let Some(extra) = records.next() {
        let line = match extra {
            Ok(extra) => extra.line,
            Err(e) => return Err(e),
        };
        return Err(PipelineError::schema_mismatch(
            path,
            line,
            "catalog file contains more than one record",
        ));
    }
    Ok(first.record)
}

/// Insert the song and artist described by one catalog file.
pub fn process_song_file(store: &dyn WarehouseStore, path: &Path) -> Result<(), PipelineError> {
    let (song, artist) = extract_song_artist(read_song_file(path)?);
    debug!("Loading song {} by artist {}", song.song_id, artist.artist_id);
    store.insert_song(&song)?;
    store.insert_artist(&artist)?;
    Ok(())
}
