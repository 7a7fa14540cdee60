// ================
// common/src/lib.rs
// ================
//! Common types and structures
//! used for communication between the GuitarTab Pro API and its clients.
//! This crate defines the JSON request/response bodies and supporting types.

pub mod page;
pub mod role;
pub mod song;
pub mod songlist;
pub mod user;

pub use page::{ApiMessage, Page, PageInfo, PageQuery};
pub use role::{Role, UnknownRole};

use serde::{Deserialize, Serialize};

/// Body of `GET /health`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Health {
    /// Always `"healthy"` while the process serves requests
    pub status: String,
    /// Service identifier
    pub service: String,
}
