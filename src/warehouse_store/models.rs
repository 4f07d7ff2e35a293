//! Warehouse row models.
//!
//! These are the rows of the star schema: four dimension tables (songs,
//! artists, users, time) and the songplays fact table.

use chrono::{DateTime, Utc};

/// Song dimension row, keyed by the catalog-supplied `song_id`.
#[derive(Debug, Clone, PartialEq)]
pub struct Song {
    pub song_id: String,
    pub title: String,
    pub artist_id: String,
    pub year: i32,
    pub duration: f64,
}

/// Artist dimension row, keyed by the catalog-supplied `artist_id`.
#[derive(Debug, Clone, PartialEq)]
pub struct Artist {
    pub artist_id: String,
    pub name: String,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Subscription level of a user at the time of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Free,
    Paid,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Free => "free",
            Level::Paid => "paid",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "free" => Some(Level::Free),
            "paid" => Some(Level::Paid),
            _ => None,
        }
    }
}

/// User dimension row. The store keeps only the latest `level`.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub user_id: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gender: Option<String>,
    pub level: Level,
}

/// Time dimension row, derived from a playback event timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeDimension {
    pub start_time: DateTime<Utc>,
    pub hour: u32,
    pub day: u32,
    pub week: u32,
    pub month: u32,
    pub year: i32,
    /// Abbreviated weekday name, e.g. "Mon".
    pub weekday: String,
}

/// Songplay fact row.
#[derive(Debug, Clone, PartialEq)]
pub struct Songplay {
    pub songplay_id: u64,
    pub start_time: DateTime<Utc>,
    pub user_id: i64,
    pub level: Level,
    pub song_id: Option<String>,
    pub artist_id: Option<String>,
    pub session_id: i64,
    pub location: Option<String>,
    pub user_agent: Option<String>,
}

/// A song/artist pair matched by title, artist name and duration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SongArtistMatch {
    pub song_id: String,
    pub artist_id: String,
}

/// Row counts per warehouse table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableCounts {
    pub songs: usize,
    pub artists: usize,
    pub users: usize,
    pub time: usize,
    pub songplays: usize,
}
