//! Loan (checkout transaction) endpoints.
//!
//! The listing endpoints are not read-only: every read path runs the lazy
//! overdue sweep before responding, persisting new overdue statuses and
//! fines as a side effect.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::loan::{IssueLoan, LoanDetails, LoanQuery},
};

use super::PaginatedResponse;

/// Overdue listing response
#[derive(Serialize, ToSchema)]
pub struct OverdueResponse {
    /// Loans currently past their due date
    pub transactions: Vec<LoanDetails>,
}

/// List loans with filters and pagination (applies the overdue sweep)
#[utoipa::path(
    get,
    path = "/transactions",
    tag = "transactions",
    params(LoanQuery),
    responses(
        (status = 200, description = "Page of loans", body = PaginatedResponse<LoanDetails>)
    )
)]
pub async fn list_loans(
    State(state): State<crate::AppState>,
    Query(query): Query<LoanQuery>,
) -> AppResult<Json<PaginatedResponse<LoanDetails>>> {
    let (items, total) = state.services.loans.list_loans(&query).await?;

    Ok(Json(PaginatedResponse {
        items,
        total,
        page: query.page(),
        per_page: query.per_page(),
    }))
}

/// List all currently-overdue loans (applies the overdue sweep)
#[utoipa::path(
    get,
    path = "/transactions/overdue",
    tag = "transactions",
    responses(
        (status = 200, description = "Overdue loans with today's fines", body = OverdueResponse)
    )
)]
pub async fn list_overdue_loans(
    State(state): State<crate::AppState>,
) -> AppResult<Json<OverdueResponse>> {
    let transactions = state.services.loans.list_overdue().await?;
    Ok(Json(OverdueResponse { transactions }))
}

/// Get one loan (applies the overdue sweep)
#[utoipa::path(
    get,
    path = "/transactions/{id}",
    tag = "transactions",
    params(
        ("id" = i32, Path, description = "Loan ID")
    ),
    responses(
        (status = 200, description = "Loan details", body = LoanDetails),
        (status = 404, description = "Loan not found")
    )
)]
pub async fn get_loan(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<LoanDetails>> {
    let loan = state.services.loans.get_loan(id).await?;
    Ok(Json(loan))
}

/// Loan history for one member (applies the overdue sweep)
#[utoipa::path(
    get,
    path = "/transactions/member/{member_id}",
    tag = "transactions",
    params(
        ("member_id" = i32, Path, description = "Member ID")
    ),
    responses(
        (status = 200, description = "Member's loans", body = Vec<LoanDetails>),
        (status = 404, description = "Member not found")
    )
)]
pub async fn get_member_loans(
    State(state): State<crate::AppState>,
    Path(member_id): Path<i32>,
) -> AppResult<Json<Vec<LoanDetails>>> {
    let loans = state.services.loans.member_loans(member_id).await?;
    Ok(Json(loans))
}

/// Issue a book to a member
#[utoipa::path(
    post,
    path = "/transactions/issue",
    tag = "transactions",
    request_body = IssueLoan,
    responses(
        (status = 201, description = "Loan created", body = LoanDetails),
        (status = 404, description = "Book or member not found"),
        (status = 409, description = "No copies available"),
        (status = 422, description = "Member is not active")
    )
)]
pub async fn issue_loan(
    State(state): State<crate::AppState>,
    Json(request): Json<IssueLoan>,
) -> AppResult<(StatusCode, Json<LoanDetails>)> {
    let loan = state.services.loans.issue(&request).await?;
    Ok((StatusCode::CREATED, Json(loan)))
}

/// Return a loaned book
#[utoipa::path(
    put,
    path = "/transactions/{id}/return",
    tag = "transactions",
    params(
        ("id" = i32, Path, description = "Loan ID")
    ),
    responses(
        (status = 200, description = "Book returned", body = LoanDetails),
        (status = 404, description = "Loan not found"),
        (status = 409, description = "Already returned")
    )
)]
pub async fn return_loan(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<LoanDetails>> {
    let loan = state.services.loans.return_loan(id).await?;
    Ok(Json(loan))
}

/// Mark a loan's fine as paid (idempotent)
#[utoipa::path(
    put,
    path = "/transactions/{id}/pay",
    tag = "transactions",
    params(
        ("id" = i32, Path, description = "Loan ID")
    ),
    responses(
        (status = 200, description = "Fine marked paid", body = LoanDetails),
        (status = 404, description = "Loan not found")
    )
)]
pub async fn pay_fine(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<LoanDetails>> {
    let loan = state.services.loans.pay_fine(id).await?;
    Ok(Json(loan))
}
