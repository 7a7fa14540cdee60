//! Response envelopes.

use serde::{Deserialize, Serialize};

/// Pagination state returned with every listing
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PageInfo {
    /// Current page (1-based)
    pub page: u32,
    /// Items per page after clamping
    pub per_page: u32,
    /// Number of matching items across all pages
    pub total: u64,
    /// Number of pages, `ceil(total / per_page)`
    pub pages: u32,
    pub has_next: bool,
    pub has_prev: bool,
    pub next_page: Option<u32>,
    pub prev_page: Option<u32>,
}

/// Plain `page` / `per_page` query string
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// One page of results
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: PageInfo,
}

/// Generic success envelope: a human readable message plus optional data
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ApiMessage<T> {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiMessage<T> {
    /// Message with a payload
    pub fn with_data(message: impl Into<String>, data: T) -> Self {
        Self {
            message: message.into(),
            data: Some(data),
        }
    }
}

impl ApiMessage<()> {
    /// Message without a payload
    pub fn text(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            data: None,
        }
    }
}
