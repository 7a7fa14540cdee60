//! Offset pagination and the sort allow-list.

use guitartab_common::{Page, PageInfo};

use crate::validation::{ValidationError, ValidationResult};

/// Default and maximum for the popular / top-rated / recent lists
pub const DEFAULT_TOP_LIMIT: u32 = 10;
pub const MAX_TOP_LIMIT: u32 = 50;

/// A clamped page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub per_page: u32,
}

impl PageRequest {
    /// `page` below 1 becomes 1; `per_page` is clamped to `1..=max`
    pub fn new(page: Option<u32>, per_page: Option<u32>, default_per_page: u32, max_per_page: u32) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            per_page: per_page
                .unwrap_or(default_per_page)
                .clamp(1, max_per_page.max(1)),
        }
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.per_page)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.per_page)
    }

    /// Envelope metadata for a result set of `total` rows
    pub fn info(&self, total: u64) -> PageInfo {
        let per_page = u64::from(self.per_page);
        let pages = u32::try_from(total.div_ceil(per_page)).unwrap_or(u32::MAX);
        let has_next = self.page < pages;
        let has_prev = self.page > 1;
        PageInfo {
            page: self.page,
            per_page: self.per_page,
            total,
            pages,
            has_next,
            has_prev,
            next_page: has_next.then(|| self.page + 1),
            prev_page: has_prev.then(|| self.page - 1),
        }
    }

    /// Wrap one page of items
    pub fn wrap<T>(&self, items: Vec<T>, total: u64) -> Page<T> {
        Page {
            items,
            pagination: self.info(total),
        }
    }
}

/// Clamp a top-list `limit` to `1..=50`
pub fn clamp_limit(limit: Option<u32>) -> i64 {
    i64::from(limit.unwrap_or(DEFAULT_TOP_LIMIT).clamp(1, MAX_TOP_LIMIT))
}

/// Columns songs may be sorted by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Title,
    Artist,
    CreatedAt,
    Views,
    Rating,
    Difficulty,
    Year,
}

impl SortField {
    pub const ALLOWED: &'static str = "title, artist, created_at, views, rating, difficulty, year";

    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "title" => SortField::Title,
            "artist" => SortField::Artist,
            "created_at" => SortField::CreatedAt,
            "views" => SortField::Views,
            "rating" => SortField::Rating,
            "difficulty" => SortField::Difficulty,
            "year" => SortField::Year,
            _ => return None,
        })
    }

    /// Column name; only ever one of the fixed identifiers above
    pub fn column(self) -> &'static str {
        match self {
            SortField::Title => "title",
            SortField::Artist => "artist",
            SortField::CreatedAt => "created_at",
            SortField::Views => "views",
            SortField::Rating => "rating",
            SortField::Difficulty => "difficulty",
            SortField::Year => "year",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Validated sort column and order, `created_at desc` by default
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    pub field: SortField,
    pub order: SortOrder,
}

impl Default for Sort {
    fn default() -> Self {
        Self {
            field: SortField::CreatedAt,
            order: SortOrder::Desc,
        }
    }
}

impl Sort {
    pub fn parse(sort_by: Option<&str>, sort_order: Option<&str>) -> ValidationResult<Self> {
        let field = match sort_by {
            None | Some("") => SortField::CreatedAt,
            Some(s) => SortField::parse(s).ok_or_else(|| ValidationError::Invalid {
                field: "sort_by",
                message: format!("sort_by must be one of: {}", SortField::ALLOWED),
            })?,
        };
        let order = match sort_order.map(str::to_ascii_lowercase).as_deref() {
            None | Some("") | Some("desc") => SortOrder::Desc,
            Some("asc") => SortOrder::Asc,
            Some(_) => {
                return Err(ValidationError::Invalid {
                    field: "sort_order",
                    message: "sort_order must be asc or desc".to_string(),
                })
            },
        };
        Ok(Self { field, order })
    }

    /// `ORDER BY` body for the songs table aliased `alias`, with the id as
    /// tie breaker so pages are stable
    pub fn order_by(&self, alias: &str) -> String {
        format!(
            "{alias}.{} {}, {alias}.id {}",
            self.field.column(),
            self.order.sql(),
            self.order.sql()
        )
    }
}
