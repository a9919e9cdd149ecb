//! Members repository for directory database operations

use chrono::Utc;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::member::{CreateMember, Member, MemberQuery, MemberStatus, UpdateMember},
};

#[derive(Clone)]
pub struct MembersRepository {
    pool: Pool<Postgres>,
}

impl MembersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get member by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Member> {
        sqlx::query_as::<_, Member>("SELECT * FROM members WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Member with id {} not found", id)))
    }

    /// Get member by ID with lifetime and open loan counts
    pub async fn get_details(&self, id: i32) -> AppResult<Member> {
        sqlx::query_as::<_, Member>(
            r#"
            SELECT members.*,
                   (SELECT COUNT(*) FROM loans WHERE loans.member_id = members.id) AS transaction_count,
                   (SELECT COUNT(*) FROM loans
                    WHERE loans.member_id = members.id
                      AND loans.status IN ('issued', 'overdue')) AS current_issued
            FROM members
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Member with id {} not found", id)))
    }

    /// Search and list members with pagination
    pub async fn list(&self, query: &MemberQuery) -> AppResult<(Vec<Member>, i64)> {
        let mut conditions: Vec<String> = Vec::new();
        let mut idx = 1usize;

        let like = query.q.as_ref().map(|q| format!("%{}%", q));
        if like.is_some() {
            conditions.push(format!(
                "(name ILIKE ${0} OR email ILIKE ${0} OR member_code ILIKE ${0} OR phone ILIKE ${0})",
                idx
            ));
            idx += 1;
        }
        if query.member_type.is_some() {
            conditions.push(format!("member_type = ${}", idx));
            idx += 1;
        }
        if query.status.is_some() {
            conditions.push(format!("status = ${}", idx));
            idx += 1;
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let total: i64 = {
            let sql = format!("SELECT COUNT(*) FROM members {}", where_clause);
            let mut q = sqlx::query_scalar::<_, i64>(&sql);
            if let Some(ref like) = like {
                q = q.bind(like.clone());
            }
            if let Some(member_type) = query.member_type {
                q = q.bind(member_type);
            }
            if let Some(status) = query.status {
                q = q.bind(status);
            }
            q.fetch_one(&self.pool).await?
        };

        let page = query.page();
        let per_page = query.per_page();

        let members = {
            let sql = format!(
                "SELECT * FROM members {} ORDER BY registration_date DESC, id DESC LIMIT ${} OFFSET ${}",
                where_clause,
                idx,
                idx + 1
            );
            let mut q = sqlx::query_as::<_, Member>(&sql);
            if let Some(ref like) = like {
                q = q.bind(like.clone());
            }
            if let Some(member_type) = query.member_type {
                q = q.bind(member_type);
            }
            if let Some(status) = query.status {
                q = q.bind(status);
            }
            q = q.bind(per_page).bind((page - 1) * per_page);
            q.fetch_all(&self.pool).await?
        };

        Ok((members, total))
    }

    /// Create a new member
    pub async fn create(&self, member: &CreateMember) -> AppResult<Member> {
        let registration_date = member
            .registration_date
            .unwrap_or_else(|| Utc::now().date_naive());
        let status = member.status.unwrap_or(MemberStatus::Active);

        let id = sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO members (member_code, name, email, phone, member_type, registration_date, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(&member.member_code)
        .bind(&member.name)
        .bind(&member.email)
        .bind(&member.phone)
        .bind(member.member_type)
        .bind(registration_date)
        .bind(status)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::from_store(e, "Member code or email already exists"))?;

        self.get_by_id(id).await
    }

    /// Update a member; absent fields keep their current value
    pub async fn update(&self, id: i32, update: &UpdateMember) -> AppResult<Member> {
        let existing = self.get_by_id(id).await?;

        sqlx::query(
            r#"
            UPDATE members
            SET name = $1, email = $2, phone = $3, member_type = $4, status = $5, updated_at = NOW()
            WHERE id = $6
            "#,
        )
        .bind(update.name.as_ref().unwrap_or(&existing.name))
        .bind(update.email.as_ref().unwrap_or(&existing.email))
        .bind(update.phone.as_ref().or(existing.phone.as_ref()))
        .bind(update.member_type.unwrap_or(existing.member_type))
        .bind(update.status.unwrap_or(existing.status))
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::from_store(e, "Member code or email already exists"))?;

        self.get_by_id(id).await
    }

    /// Delete a member, refused while they still have open loans
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        self.get_by_id(id).await?;

        let open_loans: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM loans WHERE member_id = $1 AND status IN ('issued', 'overdue')",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        if open_loans > 0 {
            return Err(AppError::Conflict(
                "Cannot delete member with active loans".to_string(),
            ));
        }

        sqlx::query("DELETE FROM members WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
