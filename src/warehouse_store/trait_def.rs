//! WarehouseStore trait definition.
//!
//! This trait is the narrow storage interface the pipeline writes through.
//! Duplicate-key handling on inserts is part of the store's contract, not
//! the caller's.

use super::models::{Artist, Song, SongArtistMatch, Songplay, TimeDimension, User};
use thiserror::Error;

/// Errors raised by a warehouse store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Store connection lock was poisoned")]
    LockPoisoned,

    #[error("songplay id {0} does not fit in an SQLite integer")]
    SongplayIdOutOfRange(u64),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Trait for warehouse storage backends.
pub trait WarehouseStore: Send + Sync {
    // =========================================================================
    // Transactions
    // =========================================================================

    /// Open the transaction covering one input file.
    fn begin_file(&self) -> StoreResult<()>;

    /// Commit the transaction opened by `begin_file`.
    fn commit_file(&self) -> StoreResult<()>;

    /// Discard everything written since `begin_file`.
    fn rollback_file(&self) -> StoreResult<()>;

    // =========================================================================
    // Dimension Inserts
    // =========================================================================

    /// Insert a song. An existing `song_id` is left untouched.
    fn insert_song(&self, song: &Song) -> StoreResult<()>;

    /// Insert an artist. An existing `artist_id` is left untouched.
    fn insert_artist(&self, artist: &Artist) -> StoreResult<()>;

    /// Insert a user, or update the `level` of an existing `user_id`.
    fn insert_user(&self, user: &User) -> StoreResult<()>;

    /// Insert a time row. An existing `start_time` is left untouched.
    fn insert_time(&self, time: &TimeDimension) -> StoreResult<()>;

    // =========================================================================
    // Facts
    // =========================================================================

    /// Insert a songplay. A duplicate `songplay_id` is an error.
    fn insert_songplay(&self, songplay: &Songplay) -> StoreResult<()>;

    /// Find the song/artist pair whose song title, artist name and song
    /// duration all match exactly.
    fn find_song_artist(
        &self,
        title: &str,
        artist_name: &str,
        duration: f64,
    ) -> StoreResult<Option<SongArtistMatch>>;

    /// The id following the highest stored `songplay_id`, or 0 if none.
    fn next_songplay_id(&self) -> StoreResult<u64>;
}
