//! Loans repository: the transactional core of the loan ledger.
//!
//! Issue and return each run as a single database transaction so the book's
//! available-copy count can never drift from the set of open loans, even
//! under concurrent requests. The copy decrement on issue is a conditional
//! update checked by affected-row count rather than a read-then-write.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        loan::{FinePolicy, IssueLoan, Loan, LoanDetails, LoanQuery, LoanStatus},
        member::{Member, MemberStatus},
    },
};

const LOAN_DETAILS_SELECT: &str = r#"
    SELECT l.id, l.book_id, l.member_id, l.issue_date, l.due_date, l.return_date,
           l.fine_amount, l.status, l.paid,
           b.title AS book_title, b.isbn AS book_isbn, b.author AS book_author,
           m.name AS member_name, m.member_code, m.email AS member_email
    FROM loans l
    JOIN books b ON l.book_id = b.id
    JOIN members m ON l.member_id = m.id
"#;

#[derive(Clone)]
pub struct LoansRepository {
    pool: Pool<Postgres>,
}

impl LoansRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get loan with book and member details
    pub async fn get_details(&self, id: i32) -> AppResult<LoanDetails> {
        let sql = format!("{} WHERE l.id = $1", LOAN_DETAILS_SELECT);
        sqlx::query_as::<_, LoanDetails>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", id)))
    }

    /// List loans with optional status/member/book filters and pagination
    pub async fn list(&self, query: &LoanQuery) -> AppResult<(Vec<LoanDetails>, i64)> {
        let mut conditions: Vec<String> = Vec::new();
        let mut idx = 1usize;

        if query.status.is_some() {
            conditions.push(format!("l.status = ${}", idx));
            idx += 1;
        }
        if query.member_id.is_some() {
            conditions.push(format!("l.member_id = ${}", idx));
            idx += 1;
        }
        if query.book_id.is_some() {
            conditions.push(format!("l.book_id = ${}", idx));
            idx += 1;
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let total: i64 = {
            let sql = format!("SELECT COUNT(*) FROM loans l {}", where_clause);
            let mut q = sqlx::query_scalar::<_, i64>(&sql);
            if let Some(status) = query.status {
                q = q.bind(status);
            }
            if let Some(member_id) = query.member_id {
                q = q.bind(member_id);
            }
            if let Some(book_id) = query.book_id {
                q = q.bind(book_id);
            }
            q.fetch_one(&self.pool).await?
        };

        let page = query.page();
        let per_page = query.per_page();

        let loans = {
            let sql = format!(
                "{} {} ORDER BY l.issue_date DESC, l.id DESC LIMIT ${} OFFSET ${}",
                LOAN_DETAILS_SELECT,
                where_clause,
                idx,
                idx + 1
            );
            let mut q = sqlx::query_as::<_, LoanDetails>(&sql);
            if let Some(status) = query.status {
                q = q.bind(status);
            }
            if let Some(member_id) = query.member_id {
                q = q.bind(member_id);
            }
            if let Some(book_id) = query.book_id {
                q = q.bind(book_id);
            }
            q = q.bind(per_page).bind((page - 1) * per_page);
            q.fetch_all(&self.pool).await?
        };

        Ok((loans, total))
    }

    /// All loans currently past their due date and not yet returned
    pub async fn list_overdue(&self, today: NaiveDate) -> AppResult<Vec<LoanDetails>> {
        let sql = format!(
            "{} WHERE l.status IN ('issued', 'overdue') AND l.due_date < $1 ORDER BY l.due_date ASC",
            LOAN_DETAILS_SELECT
        );
        Ok(sqlx::query_as::<_, LoanDetails>(&sql)
            .bind(today)
            .fetch_all(&self.pool)
            .await?)
    }

    /// Full loan history for one member
    pub async fn list_by_member(&self, member_id: i32) -> AppResult<Vec<LoanDetails>> {
        let sql = format!(
            "{} WHERE l.member_id = $1 ORDER BY l.issue_date DESC, l.id DESC",
            LOAN_DETAILS_SELECT
        );
        Ok(sqlx::query_as::<_, LoanDetails>(&sql)
            .bind(member_id)
            .fetch_all(&self.pool)
            .await?)
    }

    /// Issue a book to a member.
    ///
    /// Runs in one transaction: validates the book and member, then claims a
    /// copy with `available_copies = available_copies - 1 ... AND
    /// available_copies > 0`. Zero affected rows means someone else took the
    /// last copy, so the whole operation rolls back with a conflict.
    pub async fn issue(
        &self,
        request: &IssueLoan,
        issue_date: NaiveDate,
        due_date: NaiveDate,
    ) -> AppResult<i32> {
        let mut tx = self.pool.begin().await?;

        let book_exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE id = $1)")
                .bind(request.book_id)
                .fetch_one(&mut *tx)
                .await?;
        if !book_exists {
            return Err(AppError::NotFound(format!(
                "Book with id {} not found",
                request.book_id
            )));
        }

        let member = sqlx::query_as::<_, Member>("SELECT * FROM members WHERE id = $1")
            .bind(request.member_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Member with id {} not found", request.member_id))
            })?;
        if member.status != MemberStatus::Active {
            return Err(AppError::InvalidState("Member is not active".to_string()));
        }

        let claimed = sqlx::query(
            r#"
            UPDATE books
            SET available_copies = available_copies - 1, updated_at = NOW()
            WHERE id = $1 AND available_copies > 0
            "#,
        )
        .bind(request.book_id)
        .execute(&mut *tx)
        .await?;
        if claimed.rows_affected() == 0 {
            return Err(AppError::Conflict("Book is not available".to_string()));
        }

        let loan_id = sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO loans (book_id, member_id, issue_date, due_date, status, fine_amount)
            VALUES ($1, $2, $3, $4, 'issued', 0)
            RETURNING id
            "#,
        )
        .bind(request.book_id)
        .bind(request.member_id)
        .bind(issue_date)
        .bind(due_date)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(loan_id)
    }

    /// Return a loaned book.
    ///
    /// Locks the loan row, re-checks it is still open, fixes the fine against
    /// the actual return date and releases the copy back to the book, all in
    /// one transaction.
    pub async fn return_loan(
        &self,
        id: i32,
        return_date: NaiveDate,
        policy: &FinePolicy,
    ) -> AppResult<LoanDetails> {
        let mut tx = self.pool.begin().await?;

        let loan = sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", id)))?;

        if loan.status == LoanStatus::Returned {
            return Err(AppError::Conflict("Book already returned".to_string()));
        }

        let fine = policy.fine(loan.due_date, return_date);

        sqlx::query(
            r#"
            UPDATE loans
            SET return_date = $1, fine_amount = $2, status = 'returned', updated_at = NOW()
            WHERE id = $3
            "#,
        )
        .bind(return_date)
        .bind(fine)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        // LEAST guards against a catalog resize that shrank the total while
        // this copy was out
        sqlx::query(
            r#"
            UPDATE books
            SET available_copies = LEAST(available_copies + 1, total_copies), updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(loan.book_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        self.get_details(id).await
    }

    /// Persist the overdue state observed by a read path.
    ///
    /// Conditional on the loan still being `issued` so a concurrent return
    /// is never clobbered.
    pub async fn mark_overdue(&self, id: i32, fine: Decimal) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE loans
            SET status = 'overdue', fine_amount = $1, updated_at = NOW()
            WHERE id = $2 AND status = 'issued'
            "#,
        )
        .bind(fine)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Refresh the fine of a loan already marked overdue
    pub async fn update_fine(&self, id: i32, fine: Decimal) -> AppResult<()> {
        sqlx::query(
            "UPDATE loans SET fine_amount = $1, updated_at = NOW() WHERE id = $2 AND status = 'overdue'",
        )
        .bind(fine)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Flag a loan's fine as paid. Idempotent.
    pub async fn set_paid(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("UPDATE loans SET paid = TRUE, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Loan with id {} not found", id)));
        }
        Ok(())
    }
}
