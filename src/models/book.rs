//! Book (catalog entry) model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Book model from database.
///
/// `issue_count` is a derived column (lifetime number of loans) present only
/// on rows produced by the catalog list/detail queries.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub isbn: String,
    pub title: String,
    pub author: String,
    pub subject: String,
    pub publisher: Option<String>,
    pub publication_year: Option<i32>,
    pub total_copies: i32,
    pub available_copies: i32,
    pub shelf_location: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[sqlx(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_count: Option<i64>,
}

/// Create book request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 1))]
    pub isbn: String,
    #[validate(length(min = 1))]
    pub title: String,
    #[validate(length(min = 1))]
    pub author: String,
    #[validate(length(min = 1))]
    pub subject: String,
    pub publisher: Option<String>,
    pub publication_year: Option<i32>,
    #[validate(range(min = 1))]
    pub total_copies: Option<i32>,
    pub shelf_location: Option<String>,
}

/// Update book request; absent fields are left unchanged.
///
/// When `total_copies` changes without an explicit `available_copies`, the
/// available count is recomputed from the open-loan count so the
/// `0 <= available <= total` invariant survives a resize.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateBook {
    pub isbn: Option<String>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub publisher: Option<String>,
    pub publication_year: Option<i32>,
    #[validate(range(min = 0))]
    pub total_copies: Option<i32>,
    #[validate(range(min = 0))]
    pub available_copies: Option<i32>,
    pub shelf_location: Option<String>,
}

/// Search field scope for catalog queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SearchField {
    Title,
    Author,
    Subject,
    #[default]
    All,
}

/// Sort key for catalog queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BookSort {
    #[default]
    Title,
    Author,
    Year,
    Popularity,
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Catalog search/listing query parameters
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct BookQuery {
    /// Search term
    pub q: Option<String>,
    /// Field the search term applies to (title, author, subject, all)
    pub filter: Option<SearchField>,
    /// Exact subject filter
    pub subject: Option<String>,
    /// Exact publication year filter
    pub year: Option<i32>,
    /// Sort key (title, author, year, popularity)
    pub sort: Option<BookSort>,
    /// Sort direction (ASC, DESC)
    pub order: Option<SortOrder>,
    /// Page number (default: 1)
    pub page: Option<i64>,
    /// Items per page (default: 20)
    pub per_page: Option<i64>,
}

impl BookQuery {
    /// Effective page number, never below 1
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    /// Effective page size, clamped to 1..=100
    pub fn per_page(&self) -> i64 {
        self.per_page.unwrap_or(20).clamp(1, 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_defaults_and_clamping() {
        let query = BookQuery::default();
        assert_eq!(query.page(), 1);
        assert_eq!(query.per_page(), 20);

        let query = BookQuery {
            page: Some(0),
            per_page: Some(1000),
            ..Default::default()
        };
        assert_eq!(query.page(), 1);
        assert_eq!(query.per_page(), 100);
    }
}
