//! Typed source records, as they appear in the song catalog and the usage
//! logs. Unknown fields are rejected at decode time. Log lines are decoded
//! in two steps: the [`LogEnvelope`] of every line, then the full
//! [`LogRecord`] of playback lines only.

use serde::{Deserialize, Deserializer};

/// One song catalog record.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SongRecord {
    pub song_id: String,
    pub title: String,
    pub artist_id: String,
    pub year: i32,
    pub duration: f64,
    pub artist_name: String,
    pub artist_location: Option<String>,
    pub artist_latitude: Option<f64>,
    pub artist_longitude: Option<f64>,
    // Present in catalog dumps, not used by the warehouse.
    #[serde(default)]
    pub num_songs: Option<i64>,
}

/// The fields present on every usage log event. Other fields are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LogEnvelope {
    pub page: String,
    pub ts: i64,
}

impl LogEnvelope {
    pub fn is_playback(&self) -> bool {
        self.page == NEXT_SONG_PAGE
    }
}

/// One usage log record. Only `page` and `ts` are present on every event;
/// the remaining fields depend on the event type.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LogRecord {
    pub artist: Option<String>,
    pub auth: Option<String>,
    pub first_name: Option<String>,
    pub gender: Option<String>,
    pub item_in_session: Option<i64>,
    pub last_name: Option<String>,
    pub length: Option<f64>,
    pub level: Option<String>,
    pub location: Option<String>,
    pub method: Option<String>,
    pub page: String,
    pub registration: Option<f64>,
    pub session_id: Option<i64>,
    pub song: Option<String>,
    pub status: Option<i64>,
    pub ts: i64,
    pub user_agent: Option<String>,
    #[serde(default, deserialize_with = "deserialize_user_id")]
    pub user_id: Option<i64>,
}

/// Page value of playback events.
pub const NEXT_SONG_PAGE: &str = "NextSong";

/// Accepts `"39"`, `39` or `null`; the empty string marks a logged-out user.
fn deserialize_user_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawUserId {
        Number(i64),
        Text(String),
    }

    match Option::<RawUserId>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawUserId::Number(id)) => Ok(Some(id)),
        Some(RawUserId::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(RawUserId::Text(text)) => text
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid userId '{}'", text))),
    }
}
