//! Member (borrower) model and related types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Membership category
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[sqlx(type_name = "member_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MemberType {
    Student,
    Faculty,
    Public,
}

/// Member account status. Only active members may be issued new loans.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[sqlx(type_name = "member_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MemberStatus {
    Active,
    Inactive,
}

/// Member model from database.
///
/// `transaction_count` and `current_issued` are derived columns attached by
/// the detail query only.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Member {
    pub id: i32,
    pub member_code: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub member_type: MemberType,
    pub registration_date: NaiveDate,
    pub status: MemberStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[sqlx(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_count: Option<i64>,
    #[sqlx(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_issued: Option<i64>,
}

/// Create member request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateMember {
    #[validate(length(min = 1))]
    pub member_code: String,
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    pub phone: Option<String>,
    pub member_type: MemberType,
    pub registration_date: Option<NaiveDate>,
    pub status: Option<MemberStatus>,
}

/// Update member request; absent fields are left unchanged
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateMember {
    pub name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub member_type: Option<MemberType>,
    pub status: Option<MemberStatus>,
}

/// Member listing query parameters
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct MemberQuery {
    /// Search term over name, email, member code and phone
    pub q: Option<String>,
    /// Filter by membership category
    pub member_type: Option<MemberType>,
    /// Filter by account status
    pub status: Option<MemberStatus>,
    /// Page number (default: 1)
    pub page: Option<i64>,
    /// Items per page (default: 20)
    pub per_page: Option<i64>,
}

impl MemberQuery {
    /// Effective page number, never below 1
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    /// Effective page size, clamped to 1..=100
    pub fn per_page(&self) -> i64 {
        self.per_page.unwrap_or(20).clamp(1, 100)
    }
}
