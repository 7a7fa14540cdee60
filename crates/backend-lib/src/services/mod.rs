//! Domain operations behind the HTTP handlers. Each function checks
//! permissions and validates its input before touching the database.

pub mod accounts;
pub mod songlists;
pub mod songs;
pub mod users;
