//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{books, health, loans, members, reports};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Libris API",
        version = "1.0.0",
        description = "Library Management System REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Books
        books::list_books,
        books::get_book,
        books::create_book,
        books::update_book,
        books::delete_book,
        // Members
        members::list_members,
        members::get_member,
        members::create_member,
        members::update_member,
        members::delete_member,
        // Transactions
        loans::list_loans,
        loans::list_overdue_loans,
        loans::get_loan,
        loans::get_member_loans,
        loans::issue_loan,
        loans::return_loan,
        loans::pay_fine,
        // Reports
        reports::popular_books,
        reports::overdue_summary,
        reports::member_activity,
        reports::monthly_trends,
    ),
    components(
        schemas(
            // Books
            crate::models::book::Book,
            crate::models::book::CreateBook,
            crate::models::book::UpdateBook,
            crate::models::book::SearchField,
            crate::models::book::BookSort,
            crate::models::book::SortOrder,
            // Members
            crate::models::member::Member,
            crate::models::member::CreateMember,
            crate::models::member::UpdateMember,
            crate::models::member::MemberType,
            crate::models::member::MemberStatus,
            // Transactions
            crate::models::loan::LoanDetails,
            crate::models::loan::IssueLoan,
            crate::models::loan::LoanStatus,
            loans::OverdueResponse,
            // Reports
            reports::PopularBooksResponse,
            reports::OverdueSummary,
            reports::MemberTypeCount,
            reports::MemberActivity,
            reports::MonthlyTrend,
            reports::MonthlyTrendsResponse,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "books", description = "Catalog management"),
        (name = "members", description = "Member directory"),
        (name = "transactions", description = "Checkout, return and fines"),
        (name = "reports", description = "Reporting")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
