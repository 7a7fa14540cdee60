//! HTTP handlers. Each one extracts, calls into `services` and wraps the
//! result; authorization and validation live below this layer.

pub mod admin;
pub mod auth;
pub mod health;
pub mod songlists;
pub mod songs;
pub mod users;
