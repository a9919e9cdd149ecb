//! Loan ledger service: issue, return, fines and the lazy overdue sweep.
//!
//! Overdue status is reconciled on read rather than by a background job:
//! every listing path funnels its rows through [`LoansService::reconcile_overdue`],
//! which persists the new status and fine before the response is built.

use chrono::{Duration, Utc};

use crate::{
    config::LoansConfig,
    error::AppResult,
    models::loan::{FinePolicy, IssueLoan, LoanDetails, LoanQuery, LoanStatus},
    repository::Repository,
};

#[derive(Clone)]
pub struct LoansService {
    repository: Repository,
    policy: FinePolicy,
    period_days: i64,
}

impl LoansService {
    pub fn new(repository: Repository, config: &LoansConfig) -> Self {
        Self {
            repository,
            policy: FinePolicy::from_config(config),
            period_days: config.period_days,
        }
    }

    /// Issue a book to a member.
    ///
    /// Due date defaults to today plus the configured loan period when the
    /// request does not carry one.
    pub async fn issue(&self, request: &IssueLoan) -> AppResult<LoanDetails> {
        let today = Utc::now().date_naive();
        let due_date = request
            .due_date
            .unwrap_or(today + Duration::days(self.period_days));

        let loan_id = self.repository.loans.issue(request, today, due_date).await?;

        tracing::info!(
            loan_id,
            book_id = request.book_id,
            member_id = request.member_id,
            %due_date,
            "book issued"
        );

        self.repository.loans.get_details(loan_id).await
    }

    /// Return a loaned book; fine is fixed against the actual return date
    pub async fn return_loan(&self, loan_id: i32) -> AppResult<LoanDetails> {
        let today = Utc::now().date_naive();
        let loan = self
            .repository
            .loans
            .return_loan(loan_id, today, &self.policy)
            .await?;

        tracing::info!(loan_id, fine = %loan.fine_amount, "book returned");

        Ok(loan)
    }

    /// Flag a loan's fine as paid.
    ///
    /// Deliberately unconditional and idempotent: no check that a fine is
    /// outstanding or that the book came back, matching historical behavior.
    pub async fn pay_fine(&self, loan_id: i32) -> AppResult<LoanDetails> {
        self.repository.loans.set_paid(loan_id).await?;
        self.repository.loans.get_details(loan_id).await
    }

    /// Get one loan, overdue state reconciled first
    pub async fn get_loan(&self, loan_id: i32) -> AppResult<LoanDetails> {
        let mut loan = self.repository.loans.get_details(loan_id).await?;
        self.reconcile_one(&mut loan).await?;
        Ok(loan)
    }

    /// List loans with filters and pagination, overdue state reconciled
    pub async fn list_loans(&self, query: &LoanQuery) -> AppResult<(Vec<LoanDetails>, i64)> {
        let (mut loans, total) = self.repository.loans.list(query).await?;
        self.reconcile_overdue(&mut loans).await?;
        Ok((loans, total))
    }

    /// All loans currently past their due date, reconciled so callers see
    /// today's fines
    pub async fn list_overdue(&self) -> AppResult<Vec<LoanDetails>> {
        let today = Utc::now().date_naive();
        let mut loans = self.repository.loans.list_overdue(today).await?;
        self.reconcile_overdue(&mut loans).await?;
        Ok(loans)
    }

    /// Full loan history for one member
    pub async fn member_loans(&self, member_id: i32) -> AppResult<Vec<LoanDetails>> {
        // Verify member exists
        self.repository.members.get_by_id(member_id).await?;
        let mut loans = self.repository.loans.list_by_member(member_id).await?;
        self.reconcile_overdue(&mut loans).await?;
        Ok(loans)
    }

    /// On-read reconciliation: persist overdue status and today's fine for
    /// every open loan observed past its due date, updating the rows in place.
    pub async fn reconcile_overdue(&self, loans: &mut [LoanDetails]) -> AppResult<()> {
        for loan in loans.iter_mut() {
            self.reconcile_one(loan).await?;
        }
        Ok(())
    }

    async fn reconcile_one(&self, loan: &mut LoanDetails) -> AppResult<()> {
        let today = Utc::now().date_naive();
        if loan.due_date >= today {
            return Ok(());
        }
        let fine = self.policy.fine(loan.due_date, today);
        match loan.status {
            LoanStatus::Issued => {
                // Conditional write: a concurrent return wins
                if self.repository.loans.mark_overdue(loan.id, fine).await? {
                    loan.status = LoanStatus::Overdue;
                    loan.fine_amount = fine;
                }
            }
            LoanStatus::Overdue => {
                // Fine keeps accruing until the book comes back
                self.repository.loans.update_fine(loan.id, fine).await?;
                loan.fine_amount = fine;
            }
            LoanStatus::Returned => {}
        }
        Ok(())
    }
}
