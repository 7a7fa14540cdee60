// ==============
// crates/backend-lib/src/metrics.rs

//! Central place for metric keys
pub const USER_REGISTERED: &str = "auth.registered";
pub const LOGIN_SUCCEEDED: &str = "auth.login.succeeded";
pub const LOGIN_FAILED: &str = "auth.login.failed";
pub const LOGIN_LOCKED_OUT: &str = "auth.login.locked_out";
pub const SONG_CREATED: &str = "song.created";
pub const SONG_DELETED: &str = "song.deleted";
pub const SONG_VIEWED: &str = "song.viewed";
pub const SONG_RATED: &str = "song.rated";
pub const SONG_FLAGGED: &str = "song.flagged";
pub const REQUEST_RATE_LIMITED: &str = "http.rate_limited";
