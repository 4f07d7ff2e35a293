// Catalog entries
pub const SONG_1_ID: &str = "SOAAAAA12A8C13A001";
pub const SONG_1_TITLE: &str = "Midnight Drive";
pub const SONG_1_DURATION: f64 = 231.44444;
pub const ARTIST_1_ID: &str = "ARAAAAA1187B98A001";
pub const ARTIST_1_NAME: &str = "The Night Owls";

pub const SONG_2_ID: &str = "SOAAAAA12A8C13A002";
pub const SONG_2_TITLE: &str = "Paper Boats";
pub const SONG_2_DURATION: f64 = 187.0;
pub const ARTIST_2_ID: &str = "ARAAAAA1187B98A002";
pub const ARTIST_2_NAME: &str = "Harbor Lights";

// Users
pub const USER_1_ID: i64 = 15;
pub const USER_2_ID: i64 = 88;

// 2018-11-05T10:00:00Z, a Monday
pub const BASE_TS: i64 = 1541412000000;
