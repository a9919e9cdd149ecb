//! Reporting service

use rust_decimal::Decimal;

use crate::{
    api::reports::{MemberActivity, MemberTypeCount, MonthlyTrend, OverdueSummary},
    error::AppResult,
    models::book::Book,
    repository::Repository,
    services::loans::LoansService,
};

#[derive(Clone)]
pub struct ReportsService {
    repository: Repository,
    loans: LoansService,
}

impl ReportsService {
    pub fn new(repository: Repository, loans: LoansService) -> Self {
        Self { repository, loans }
    }

    /// Books ranked by lifetime loan count
    pub async fn popular_books(&self, limit: i64) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(
            r#"
            SELECT books.*,
                   (SELECT COUNT(*) FROM loans WHERE loans.book_id = books.id) AS issue_count
            FROM books
            ORDER BY issue_count DESC, title ASC
            LIMIT $1
            "#,
        )
        .bind(limit.clamp(1, 100))
        .fetch_all(&self.repository.pool)
        .await?;

        Ok(books)
    }

    /// Overdue loan count plus outstanding and collected fine totals.
    ///
    /// Runs the overdue sweep first so the figures reflect today.
    pub async fn overdue_summary(&self) -> AppResult<OverdueSummary> {
        let overdue = self.loans.list_overdue().await?;

        let total_outstanding_fines: Decimal = sqlx::query_scalar(
            "SELECT COALESCE(SUM(fine_amount), 0) FROM loans WHERE status = 'overdue' AND NOT paid",
        )
        .fetch_one(&self.repository.pool)
        .await?;

        let total_paid_fines: Decimal =
            sqlx::query_scalar("SELECT COALESCE(SUM(fine_amount), 0) FROM loans WHERE paid")
                .fetch_one(&self.repository.pool)
                .await?;

        Ok(OverdueSummary {
            overdue_count: overdue.len() as i64,
            total_outstanding_fines,
            total_paid_fines,
        })
    }

    /// Member counts by status and type, plus recent checkout volume
    pub async fn member_activity(&self) -> AppResult<MemberActivity> {
        let pool = &self.repository.pool;

        let active_members: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM members WHERE status = 'active'")
                .fetch_one(pool)
                .await?;

        let inactive_members: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM members WHERE status = 'inactive'")
                .fetch_one(pool)
                .await?;

        let members_by_type = sqlx::query_as::<_, MemberTypeCount>(
            "SELECT member_type, COUNT(*) AS count FROM members GROUP BY member_type ORDER BY member_type",
        )
        .fetch_all(pool)
        .await?;

        let recent_loans: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM loans WHERE issue_date >= CURRENT_DATE - INTERVAL '30 days'",
        )
        .fetch_one(pool)
        .await?;

        Ok(MemberActivity {
            active_members,
            inactive_members,
            members_by_type,
            recent_loans,
        })
    }

    /// Issue and return counts per month over the trailing year
    pub async fn monthly_trends(&self) -> AppResult<Vec<MonthlyTrend>> {
        let months = sqlx::query_as::<_, MonthlyTrend>(
            r#"
            SELECT to_char(issue_date, 'YYYY-MM') AS month,
                   COUNT(*) AS issue_count,
                   COUNT(return_date) AS return_count
            FROM loans
            WHERE issue_date >= CURRENT_DATE - INTERVAL '12 months'
            GROUP BY to_char(issue_date, 'YYYY-MM')
            ORDER BY month ASC
            "#,
        )
        .fetch_all(&self.repository.pool)
        .await?;

        Ok(months)
    }
}
