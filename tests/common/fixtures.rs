//! Test fixture creation for source files and the warehouse database

use songplay_etl::{FileOrder, LoadError, LoadSummary, ProcessingMode, SqliteWarehouseStore};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A catalog record line.
pub fn song_line(
    song_id: &str,
    title: &str,
    artist_id: &str,
    artist_name: &str,
    duration: f64,
) -> String {
    serde_json::json!({
        "num_songs": 1,
        "song_id": song_id,
        "title": title,
        "artist_id": artist_id,
        "year": 2004,
        "duration": duration,
        "artist_name": artist_name,
        "artist_location": "",
        "artist_latitude": null,
        "artist_longitude": null,
    })
    .to_string()
}

/// A usage log record line. Non-`NextSong` pages get the null song fields
/// real logs carry.
pub fn log_line(
    page: &str,
    ts: i64,
    user_id: i64,
    level: &str,
    song: &str,
    artist: &str,
    length: f64,
) -> String {
    let playback = page == "NextSong";
    serde_json::json!({
        "artist": if playback { Some(artist) } else { None },
        "auth": "Logged In",
        "firstName": "Test",
        "gender": "F",
        "itemInSession": 0,
        "lastName": "User",
        "length": if playback { Some(length) } else { None },
        "level": level,
        "location": "San Jose-Sunnyvale-Santa Clara, CA",
        "method": "PUT",
        "page": page,
        "registration": 1540940782796.0,
        "sessionId": 583,
        "song": if playback { Some(song) } else { None },
        "status": 200,
        "ts": ts,
        "userAgent": "Mozilla/5.0 (X11; Linux x86_64)",
        "userId": user_id.to_string(),
    })
    .to_string()
}

/// Temporary song/log data directories plus a warehouse database file.
pub struct TestWarehouse {
    pub dir: TempDir,
    pub song_data: PathBuf,
    pub log_data: PathBuf,
    pub db_path: PathBuf,
}

impl TestWarehouse {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let song_data = dir.path().join("song_data");
        let log_data = dir.path().join("log_data");
        fs::create_dir_all(&song_data).unwrap();
        fs::create_dir_all(&log_data).unwrap();
        let db_path = dir.path().join("warehouse.db");
        Self {
            dir,
            song_data,
            log_data,
            db_path,
        }
    }

    fn write(root: &Path, relative: &str, lines: &[String]) -> PathBuf {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, lines.join("\n") + "\n").unwrap();
        path
    }

    pub fn write_song_file(&self, relative: &str, line: String) -> PathBuf {
        Self::write(&self.song_data, relative, &[line])
    }

    pub fn write_log_file(&self, relative: &str, lines: &[String]) -> PathBuf {
        Self::write(&self.log_data, relative, lines)
    }

    pub fn open_store(&self) -> SqliteWarehouseStore {
        SqliteWarehouseStore::open(&self.db_path).unwrap()
    }

    pub fn load_catalog(&self, store: &SqliteWarehouseStore) -> Result<LoadSummary, LoadError> {
        songplay_etl::load_dir(
            store,
            ProcessingMode::Catalog,
            &self.song_data,
            "json",
            FileOrder::Sorted,
            0,
        )
    }

    pub fn load_logs(
        &self,
        store: &SqliteWarehouseStore,
        first_songplay_id: u64,
    ) -> Result<LoadSummary, LoadError> {
        songplay_etl::load_dir(
            store,
            ProcessingMode::Log,
            &self.log_data,
            "json",
            FileOrder::Sorted,
            first_songplay_id,
        )
    }
}
