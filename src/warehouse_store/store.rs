//! SQLite-backed warehouse store implementation.

use super::models::*;
use super::schema::WAREHOUSE_VERSIONED_SCHEMAS;
use super::trait_def::{StoreError, StoreResult, WarehouseStore};
use crate::sqlite_persistence::BASE_DB_VERSION;
use anyhow::{bail, Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::info;

/// SQLite-backed warehouse store.
///
/// Owns the single connection used for a whole run; the connection is
/// closed when the store is dropped, which discards any transaction left
/// open by a failed file.
pub struct SqliteWarehouseStore {
    conn: Mutex<Connection>,
}

fn migrate_if_needed(conn: &Connection) -> Result<()> {
    let db_version: i64 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;

    let latest_version = WAREHOUSE_VERSIONED_SCHEMAS.len() - 1;
    let latest_schema = &WAREHOUSE_VERSIONED_SCHEMAS[latest_version];

    let table_count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
        [],
        |r| r.get(0),
    )?;

    if table_count == 0 {
        info!("Creating warehouse db schema at version {}", latest_version);
        latest_schema.create(conn)?;
        return Ok(());
    }

    if db_version < BASE_DB_VERSION as i64 {
        bail!(
            "Database user_version {} does not belong to a warehouse database",
            db_version
        );
    }
    let current_version = (db_version - BASE_DB_VERSION as i64) as usize;
    if current_version != latest_version {
        bail!(
            "Unsupported warehouse db version {}, expected {}",
            current_version,
            latest_version
        );
    }

    latest_schema
        .validate(conn)
        .context("Warehouse database schema does not match")
}

impl SqliteWarehouseStore {
    /// Open (or create) the warehouse database at `db_path`.
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path.as_ref()).with_context(|| {
            format!(
                "Failed to open warehouse database {}",
                db_path.as_ref().display()
            )
        })?;
        Self::from_connection(conn)
    }

    /// Create a store backed by a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        migrate_if_needed(&conn)?;
        Ok(SqliteWarehouseStore {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }

    /// Row counts of every warehouse table.
    pub fn table_counts(&self) -> StoreResult<TableCounts> {
        let conn = self.conn()?;
        let count = |table: &str| -> StoreResult<usize> {
            let n: i64 =
                conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| r.get(0))?;
            Ok(n as usize)
        };
        Ok(TableCounts {
            songs: count("songs")?,
            artists: count("artists")?,
            users: count("users")?,
            time: count("time")?,
            songplays: count("songplays")?,
        })
    }

    /// All songplays ordered by id.
    pub fn list_songplays(&self) -> StoreResult<Vec<Songplay>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT songplay_id, start_time, user_id, level, song_id, artist_id,
                    session_id, location, user_agent
             FROM songplays ORDER BY songplay_id ASC",
        )?;
        let songplays = stmt
            .query_map([], Self::parse_songplay_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(songplays)
    }

    /// Get a user by id.
    pub fn get_user(&self, user_id: i64) -> StoreResult<Option<User>> {
        let conn = self.conn()?;
        let user = conn
            .query_row(
                "SELECT user_id, first_name, last_name, gender, level FROM users WHERE user_id = ?1",
                params![user_id],
                |row| {
                    Ok(User {
                        user_id: row.get(0)?,
                        first_name: row.get(1)?,
                        last_name: row.get(2)?,
                        gender: row.get(3)?,
                        level: Self::parse_level(row, 4)?,
                    })
                },
            )
            .optional()?;
        Ok(user)
    }

    /// Get an artist by id.
    pub fn get_artist(&self, artist_id: &str) -> StoreResult<Option<Artist>> {
        let conn = self.conn()?;
        let artist = conn
            .query_row(
                "SELECT artist_id, name, location, latitude, longitude FROM artists WHERE artist_id = ?1",
                params![artist_id],
                |row| {
                    Ok(Artist {
                        artist_id: row.get(0)?,
                        name: row.get(1)?,
                        location: row.get(2)?,
                        latitude: row.get(3)?,
                        longitude: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(artist)
    }

    /// Get a song by id.
    pub fn get_song(&self, song_id: &str) -> StoreResult<Option<Song>> {
        let conn = self.conn()?;
        let song = conn
            .query_row(
                "SELECT song_id, title, artist_id, year, duration FROM songs WHERE song_id = ?1",
                params![song_id],
                |row| {
                    Ok(Song {
                        song_id: row.get(0)?,
                        title: row.get(1)?,
                        artist_id: row.get(2)?,
                        year: row.get(3)?,
                        duration: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(song)
    }

    fn parse_level(row: &rusqlite::Row, index: usize) -> rusqlite::Result<Level> {
        let level: String = row.get(index)?;
        Level::from_str(&level).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                index,
                rusqlite::types::Type::Text,
                format!("invalid level '{}'", level).into(),
            )
        })
    }

    fn parse_timestamp(row: &rusqlite::Row, index: usize) -> rusqlite::Result<chrono::DateTime<chrono::Utc>> {
        let millis: i64 = row.get(index)?;
        chrono::DateTime::from_timestamp_millis(millis).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                index,
                rusqlite::types::Type::Integer,
                format!("timestamp {} out of range", millis).into(),
            )
        })
    }

    fn parse_songplay_row(row: &rusqlite::Row) -> rusqlite::Result<Songplay> {
        Ok(Songplay {
            songplay_id: row.get::<_, i64>(0)? as u64,
            start_time: Self::parse_timestamp(row, 1)?,
            user_id: row.get(2)?,
            level: Self::parse_level(row, 3)?,
            song_id: row.get(4)?,
            artist_id: row.get(5)?,
            session_id: row.get(6)?,
            location: row.get(7)?,
            user_agent: row.get(8)?,
        })
    }
}

impl WarehouseStore for SqliteWarehouseStore {
    fn begin_file(&self) -> StoreResult<()> {
        self.conn()?.execute_batch("BEGIN IMMEDIATE")?;
        Ok(())
    }

    fn commit_file(&self) -> StoreResult<()> {
        self.conn()?.execute_batch("COMMIT")?;
        Ok(())
    }

    fn rollback_file(&self) -> StoreResult<()> {
        let conn = self.conn()?;
        if !conn.is_autocommit() {
            conn.execute_batch("ROLLBACK")?;
        }
        Ok(())
    }

    fn insert_song(&self, song: &Song) -> StoreResult<()> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare_cached(
            "INSERT INTO songs (song_id, title, artist_id, year, duration)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(song_id) DO NOTHING",
        )?;
        stmt.execute(params![
            &song.song_id,
            &song.title,
            &song.artist_id,
            song.year,
            song.duration,
        ])?;
        Ok(())
    }

    fn insert_artist(&self, artist: &Artist) -> StoreResult<()> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare_cached(
            "INSERT INTO artists (artist_id, name, location, latitude, longitude)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(artist_id) DO NOTHING",
        )?;
        stmt.execute(params![
            &artist.artist_id,
            &artist.name,
            &artist.location,
            artist.latitude,
            artist.longitude,
        ])?;
        Ok(())
    }

    fn insert_user(&self, user: &User) -> StoreResult<()> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare_cached(
            "INSERT INTO users (user_id, first_name, last_name, gender, level)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(user_id) DO UPDATE SET level = excluded.level",
        )?;
        stmt.execute(params![
            user.user_id,
            &user.first_name,
            &user.last_name,
            &user.gender,
            user.level.as_str(),
        ])?;
        Ok(())
    }

    fn insert_time(&self, time: &TimeDimension) -> StoreResult<()> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare_cached(
            "INSERT INTO time (start_time, hour, day, week, month, year, weekday)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(start_time) DO NOTHING",
        )?;
        stmt.execute(params![
            time.start_time.timestamp_millis(),
            time.hour,
            time.day,
            time.week,
            time.month,
            time.year,
            &time.weekday,
        ])?;
        Ok(())
    }

    fn insert_songplay(&self, songplay: &Songplay) -> StoreResult<()> {
        let songplay_id = i64::try_from(songplay.songplay_id)
            .map_err(|_| StoreError::SongplayIdOutOfRange(songplay.songplay_id))?;
        let conn = self.conn()?;
        let mut stmt = conn.prepare_cached(
            "INSERT INTO songplays (songplay_id, start_time, user_id, level, song_id,
                                    artist_id, session_id, location, user_agent)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )?;
        stmt.execute(params![
            songplay_id,
            songplay.start_time.timestamp_millis(),
            songplay.user_id,
            songplay.level.as_str(),
            &songplay.song_id,
            &songplay.artist_id,
            songplay.session_id,
            &songplay.location,
            &songplay.user_agent,
        ])?;
        Ok(())
    }

    fn find_song_artist(
        &self,
        title: &str,
        artist_name: &str,
        duration: f64,
    ) -> StoreResult<Option<SongArtistMatch>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare_cached(
            "SELECT songs.song_id, artists.artist_id
             FROM songs JOIN artists ON songs.artist_id = artists.artist_id
             WHERE songs.title = ?1 AND artists.name = ?2 AND songs.duration = ?3
             LIMIT 1",
        )?;
        let found = stmt
            .query_row(params![title, artist_name, duration], |row| {
                Ok(SongArtistMatch {
                    song_id: row.get(0)?,
                    artist_id: row.get(1)?,
                })
            })
            .optional()?;
        Ok(found)
    }

    fn next_songplay_id(&self) -> StoreResult<u64> {
        let conn = self.conn()?;
        let max_id: Option<i64> =
            conn.query_row("SELECT MAX(songplay_id) FROM songplays", [], |r| r.get(0))?;
        Ok(max_id.map(|id| id as u64 + 1).unwrap_or(0))
    }
}
