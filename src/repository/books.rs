//! Books repository for catalog database operations

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookQuery, BookSort, CreateBook, SearchField, UpdateBook},
};

/// Lifetime loan count, exposed as `issue_count` on listing/detail rows
const ISSUE_COUNT_SUBQUERY: &str =
    "(SELECT COUNT(*) FROM loans WHERE loans.book_id = books.id) AS issue_count";

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get book by ID, with its lifetime loan count
    pub async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(&format!(
            "SELECT books.*, {} FROM books WHERE id = $1",
            ISSUE_COUNT_SUBQUERY
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// Search and list books with pagination
    pub async fn list(&self, query: &BookQuery) -> AppResult<(Vec<Book>, i64)> {
        let mut conditions: Vec<String> = Vec::new();
        let mut idx = 1usize;

        let like = query.q.as_ref().map(|q| format!("%{}%", q));
        if like.is_some() {
            match query.filter.unwrap_or_default() {
                SearchField::Title => {
                    conditions.push(format!("title ILIKE ${}", idx));
                    idx += 1;
                }
                SearchField::Author => {
                    conditions.push(format!("author ILIKE ${}", idx));
                    idx += 1;
                }
                SearchField::Subject => {
                    conditions.push(format!("subject ILIKE ${}", idx));
                    idx += 1;
                }
                SearchField::All => {
                    conditions.push(format!(
                        "(title ILIKE ${0} OR author ILIKE ${0} OR isbn ILIKE ${0} OR subject ILIKE ${0})",
                        idx
                    ));
                    idx += 1;
                }
            }
        }
        if query.subject.is_some() {
            conditions.push(format!("subject = ${}", idx));
            idx += 1;
        }
        if query.year.is_some() {
            conditions.push(format!("publication_year = ${}", idx));
            idx += 1;
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let order = query.order.unwrap_or_default().as_sql();
        let order_clause = match query.sort.unwrap_or_default() {
            BookSort::Title => format!("ORDER BY title {}", order),
            BookSort::Author => format!("ORDER BY author {}", order),
            BookSort::Year => format!("ORDER BY publication_year {}", order),
            BookSort::Popularity => format!("ORDER BY issue_count {}", order),
        };

        let total: i64 = {
            let sql = format!("SELECT COUNT(*) FROM books {}", where_clause);
            let mut q = sqlx::query_scalar::<_, i64>(&sql);
            if let Some(ref like) = like {
                q = q.bind(like.clone());
            }
            if let Some(ref subject) = query.subject {
                q = q.bind(subject.clone());
            }
            if let Some(year) = query.year {
                q = q.bind(year);
            }
            q.fetch_one(&self.pool).await?
        };

        let page = query.page();
        let per_page = query.per_page();

        let books = {
            let sql = format!(
                "SELECT books.*, {} FROM books {} {} LIMIT ${} OFFSET ${}",
                ISSUE_COUNT_SUBQUERY,
                where_clause,
                order_clause,
                idx,
                idx + 1
            );
            let mut q = sqlx::query_as::<_, Book>(&sql);
            if let Some(ref like) = like {
                q = q.bind(like.clone());
            }
            if let Some(ref subject) = query.subject {
                q = q.bind(subject.clone());
            }
            if let Some(year) = query.year {
                q = q.bind(year);
            }
            q = q.bind(per_page).bind((page - 1) * per_page);
            q.fetch_all(&self.pool).await?
        };

        Ok((books, total))
    }

    /// Create a new book; available copies start equal to total copies
    pub async fn create(&self, book: &CreateBook) -> AppResult<Book> {
        let total_copies = book.total_copies.unwrap_or(1);

        let id = sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO books (isbn, title, author, subject, publisher, publication_year,
                               total_copies, available_copies, shelf_location)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $7, $8)
            RETURNING id
            "#,
        )
        .bind(&book.isbn)
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.subject)
        .bind(&book.publisher)
        .bind(book.publication_year)
        .bind(total_copies)
        .bind(&book.shelf_location)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::from_store(e, "ISBN already exists"))?;

        self.get_by_id(id).await
    }

    /// Update a book.
    ///
    /// When the copy total changes without an explicit available count, the
    /// available count is recomputed as `max(0, total - open loans)` so a
    /// resize cannot break the availability invariant.
    pub async fn update(&self, id: i32, update: &UpdateBook) -> AppResult<Book> {
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))?;

        let new_total = update.total_copies.unwrap_or(existing.total_copies);
        let new_available = match update.available_copies {
            Some(available) => available.min(new_total),
            None => {
                let currently_issued: i64 = sqlx::query_scalar(
                    "SELECT COUNT(*) FROM loans WHERE book_id = $1 AND status IN ('issued', 'overdue')",
                )
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;
                (new_total - currently_issued as i32).max(0)
            }
        };

        sqlx::query(
            r#"
            UPDATE books
            SET isbn = $1, title = $2, author = $3, subject = $4, publisher = $5,
                publication_year = $6, total_copies = $7, available_copies = $8,
                shelf_location = $9, updated_at = NOW()
            WHERE id = $10
            "#,
        )
        .bind(update.isbn.as_ref().unwrap_or(&existing.isbn))
        .bind(update.title.as_ref().unwrap_or(&existing.title))
        .bind(update.author.as_ref().unwrap_or(&existing.author))
        .bind(update.subject.as_ref().unwrap_or(&existing.subject))
        .bind(update.publisher.as_ref().or(existing.publisher.as_ref()))
        .bind(update.publication_year.or(existing.publication_year))
        .bind(new_total)
        .bind(new_available)
        .bind(update.shelf_location.as_ref().or(existing.shelf_location.as_ref()))
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::from_store(e, "ISBN already exists"))?;

        tx.commit().await?;

        self.get_by_id(id).await
    }

    /// Delete a book, refused while it still has open loans
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        if !exists {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }

        let open_loans: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM loans WHERE book_id = $1 AND status IN ('issued', 'overdue')",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        if open_loans > 0 {
            return Err(AppError::Conflict(
                "Cannot delete book with active loans".to_string(),
            ));
        }

        sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
