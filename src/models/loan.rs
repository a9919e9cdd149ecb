//! Loan (checkout transaction) model and related types

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

/// Loan lifecycle state.
///
/// `issued` moves to `overdue` lazily the first time a read observes the loan
/// past its due date, and to `returned` exactly once on return.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[sqlx(type_name = "loan_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LoanStatus {
    Issued,
    Overdue,
    Returned,
}

/// Loan model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Loan {
    pub id: i32,
    pub book_id: i32,
    pub member_id: i32,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub fine_amount: Decimal,
    pub status: LoanStatus,
    pub paid: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Loan joined with book and member display fields
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct LoanDetails {
    pub id: i32,
    pub book_id: i32,
    pub member_id: i32,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub fine_amount: Decimal,
    pub status: LoanStatus,
    pub paid: bool,
    pub book_title: String,
    pub book_isbn: String,
    pub book_author: String,
    pub member_name: String,
    pub member_code: String,
    pub member_email: String,
}

/// Issue (checkout) request
#[derive(Debug, Deserialize, ToSchema)]
pub struct IssueLoan {
    pub book_id: i32,
    pub member_id: i32,
    /// Explicit due date; defaults to issue date + configured loan period
    pub due_date: Option<NaiveDate>,
}

/// Loan listing query parameters
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct LoanQuery {
    /// Filter by lifecycle state
    pub status: Option<LoanStatus>,
    /// Filter by member
    pub member_id: Option<i32>,
    /// Filter by book
    pub book_id: Option<i32>,
    /// Page number (default: 1)
    pub page: Option<i64>,
    /// Items per page (default: 20)
    pub per_page: Option<i64>,
}

impl LoanQuery {
    /// Effective page number, never below 1
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    /// Effective page size, clamped to 1..=100
    pub fn per_page(&self) -> i64 {
        self.per_page.unwrap_or(20).clamp(1, 100)
    }
}

/// Fine accrual policy, built from [`LoansConfig`](crate::config::LoansConfig).
#[derive(Debug, Clone)]
pub struct FinePolicy {
    pub grace_days: i64,
    pub daily_fine: Decimal,
    pub max_fine: Option<Decimal>,
}

impl FinePolicy {
    pub fn from_config(config: &crate::config::LoansConfig) -> Self {
        Self {
            grace_days: config.grace_days,
            daily_fine: config.daily_fine,
            max_fine: config.max_fine,
        }
    }

    /// Fine owed on a loan due on `due_date`, evaluated as of `as_of`.
    ///
    /// Computed on whole calendar days. Nothing accrues within the grace
    /// period (or for early returns); past it the fine grows by `daily_fine`
    /// per day, clipped at `max_fine` when a cap is configured.
    pub fn fine(&self, due_date: NaiveDate, as_of: NaiveDate) -> Decimal {
        let overdue_days = (as_of - due_date).num_days();
        if overdue_days <= self.grace_days {
            return Decimal::ZERO;
        }
        let fine = Decimal::from(overdue_days - self.grace_days) * self.daily_fine;
        match self.max_fine {
            Some(cap) => fine.min(cap),
            None => fine,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capped_policy() -> FinePolicy {
        FinePolicy {
            grace_days: 1,
            daily_fine: Decimal::new(200, 2),
            max_fine: Some(Decimal::new(5000, 2)),
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn no_fine_on_or_before_due_date() {
        let policy = capped_policy();
        let due = date(2026, 3, 10);
        assert_eq!(policy.fine(due, date(2026, 3, 1)), Decimal::ZERO);
        assert_eq!(policy.fine(due, due), Decimal::ZERO);
    }

    #[test]
    fn no_fine_within_grace_period() {
        let policy = capped_policy();
        let due = date(2026, 3, 10);
        assert_eq!(policy.fine(due, date(2026, 3, 11)), Decimal::ZERO);
    }

    #[test]
    fn fine_accrues_per_day_after_grace() {
        let policy = capped_policy();
        let due = date(2026, 3, 10);
        assert_eq!(policy.fine(due, date(2026, 3, 12)), Decimal::new(200, 2));
        assert_eq!(policy.fine(due, date(2026, 3, 13)), Decimal::new(400, 2));
        assert_eq!(policy.fine(due, date(2026, 3, 20)), Decimal::new(1800, 2));
    }

    #[test]
    fn fine_is_capped() {
        let policy = capped_policy();
        let due = date(2026, 1, 1);
        assert_eq!(policy.fine(due, date(2026, 6, 1)), Decimal::new(5000, 2));
    }

    #[test]
    fn twenty_days_late_with_default_policy() {
        let policy = capped_policy();
        let due = date(2026, 3, 1);
        // 20 days past due, 1-day grace: 19 * 2.00 = 38.00
        assert_eq!(policy.fine(due, date(2026, 3, 21)), Decimal::new(3800, 2));
    }

    #[test]
    fn uncapped_policy_keeps_growing() {
        let policy = FinePolicy {
            grace_days: 0,
            daily_fine: Decimal::new(500, 2),
            max_fine: None,
        };
        let due = date(2026, 1, 1);
        assert_eq!(policy.fine(due, date(2026, 1, 31)), Decimal::new(15000, 2));
    }
}
