//! Reporting endpoints

use axum::{
    extract::{Query, State},
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

use crate::{error::AppResult, models::book::Book, models::member::MemberType};

/// Popular-books query parameters
#[derive(Debug, Deserialize, IntoParams)]
pub struct PopularBooksQuery {
    /// Number of books to return (default: 10)
    pub limit: Option<i64>,
}

/// Popular-books report
#[derive(Serialize, ToSchema)]
pub struct PopularBooksResponse {
    pub books: Vec<Book>,
}

/// Overdue fines summary
#[derive(Serialize, ToSchema)]
pub struct OverdueSummary {
    /// Loans currently overdue
    pub overdue_count: i64,
    /// Sum of unpaid fines on overdue loans
    pub total_outstanding_fines: Decimal,
    /// Sum of fines flagged as paid
    pub total_paid_fines: Decimal,
}

/// Member count for one membership category
#[derive(Serialize, FromRow, ToSchema)]
pub struct MemberTypeCount {
    pub member_type: MemberType,
    pub count: i64,
}

/// Member activity report
#[derive(Serialize, ToSchema)]
pub struct MemberActivity {
    pub active_members: i64,
    pub inactive_members: i64,
    pub members_by_type: Vec<MemberTypeCount>,
    /// Loans issued in the last 30 days
    pub recent_loans: i64,
}

/// Issue/return volume for one calendar month
#[derive(Serialize, FromRow, ToSchema)]
pub struct MonthlyTrend {
    /// Month in YYYY-MM form
    pub month: String,
    pub issue_count: i64,
    pub return_count: i64,
}

/// Monthly trends report
#[derive(Serialize, ToSchema)]
pub struct MonthlyTrendsResponse {
    pub months: Vec<MonthlyTrend>,
}

/// Books ranked by lifetime loan count
#[utoipa::path(
    get,
    path = "/reports/popular-books",
    tag = "reports",
    params(PopularBooksQuery),
    responses(
        (status = 200, description = "Most borrowed books", body = PopularBooksResponse)
    )
)]
pub async fn popular_books(
    State(state): State<crate::AppState>,
    Query(query): Query<PopularBooksQuery>,
) -> AppResult<Json<PopularBooksResponse>> {
    let books = state
        .services
        .reports
        .popular_books(query.limit.unwrap_or(10))
        .await?;
    Ok(Json(PopularBooksResponse { books }))
}

/// Overdue counts and fine totals (applies the overdue sweep first)
#[utoipa::path(
    get,
    path = "/reports/overdue-summary",
    tag = "reports",
    responses(
        (status = 200, description = "Overdue summary", body = OverdueSummary)
    )
)]
pub async fn overdue_summary(
    State(state): State<crate::AppState>,
) -> AppResult<Json<OverdueSummary>> {
    let summary = state.services.reports.overdue_summary().await?;
    Ok(Json(summary))
}

/// Member counts and recent checkout volume
#[utoipa::path(
    get,
    path = "/reports/member-activity",
    tag = "reports",
    responses(
        (status = 200, description = "Member activity", body = MemberActivity)
    )
)]
pub async fn member_activity(
    State(state): State<crate::AppState>,
) -> AppResult<Json<MemberActivity>> {
    let report = state.services.reports.member_activity().await?;
    Ok(Json(report))
}

/// Issue/return counts per month for the trailing year
#[utoipa::path(
    get,
    path = "/reports/monthly-trends",
    tag = "reports",
    responses(
        (status = 200, description = "Monthly trends", body = MonthlyTrendsResponse)
    )
)]
pub async fn monthly_trends(
    State(state): State<crate::AppState>,
) -> AppResult<Json<MonthlyTrendsResponse>> {
    let months = state.services.reports.monthly_trends().await?;
    Ok(Json(MonthlyTrendsResponse { months }))
}
