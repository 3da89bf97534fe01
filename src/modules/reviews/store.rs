use sqlx::{sqlite::SqliteRow, Row};
use time::OffsetDateTime;

use shelf_db::{Database, StoreError, StoreResult};

use super::models::{Review, ReviewDraft};

const ENTITY: &str = "review";

/// Review rows in the `review` table
#[derive(Clone, Debug)]
pub struct ReviewStore {
    db: Database,
}

impl ReviewStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Insert a review stamped with the current time
    pub async fn insert(&self, draft: &ReviewDraft) -> StoreResult<Review> {
        let row = sqlx::query(
            r#"
            INSERT INTO review (book_id, reviewer, text, rating, created_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id, book_id, reviewer, text, rating, created_at
            "#,
        )
        .bind(draft.book)
        .bind(&draft.reviewer)
        .bind(&draft.text)
        .bind(draft.rating)
        .bind(OffsetDateTime::now_utc())
        .fetch_one(self.db.pool())
        .await
        .map_err(|err| missing_book(err, draft.book))?;

        Ok(review_from_row(&row)?)
    }

    pub async fn fetch(&self, id: i64) -> StoreResult<Review> {
        let row = sqlx::query(
            r#"
            SELECT id, book_id, reviewer, text, rating, created_at
            FROM review
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(self.db.pool())
        .await?;

        match row {
            Some(row) => Ok(review_from_row(&row)?),
            None => Err(StoreError::not_found(ENTITY, id)),
        }
    }

    /// All reviews ordered by id
    pub async fn fetch_all(&self) -> StoreResult<Vec<Review>> {
        let rows = sqlx::query(
            r#"
            SELECT id, book_id, reviewer, text, rating, created_at
            FROM review
            ORDER BY id ASC
            "#,
        )
        .fetch_all(self.db.pool())
        .await?;

        collect_reviews(&rows)
    }

    /// Reviews of one book ordered by id
    pub async fn fetch_for_book(&self, book_id: i64) -> StoreResult<Vec<Review>> {
        let rows = sqlx::query(
            r#"
            SELECT id, book_id, reviewer, text, rating, created_at
            FROM review
            WHERE book_id = ?
            ORDER BY id ASC
            "#,
        )
        .bind(book_id)
        .fetch_all(self.db.pool())
        .await?;

        collect_reviews(&rows)
    }

    /// Overwrite the writable columns of review `id`; `created_at` is kept
    pub async fn update(&self, id: i64, draft: &ReviewDraft) -> StoreResult<Review> {
        let row = sqlx::query(
            r#"
            UPDATE review
            SET book_id = ?, reviewer = ?, text = ?, rating = ?
            WHERE id = ?
            RETURNING id, book_id, reviewer, text, rating, created_at
            "#,
        )
        .bind(draft.book)
        .bind(&draft.reviewer)
        .bind(&draft.text)
        .bind(draft.rating)
        .bind(id)
        .fetch_optional(self.db.pool())
        .await
        .map_err(|err| missing_book(err, draft.book))?;

        match row {
            Some(row) => Ok(review_from_row(&row)?),
            None => Err(StoreError::not_found(ENTITY, id)),
        }
    }

    pub async fn delete(&self, id: i64) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM review WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(ENTITY, id));
        }
        Ok(())
    }
}

/// The referenced book vanished between validation and the write.
fn missing_book(err: sqlx::Error, book_id: i64) -> StoreError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
            StoreError::not_found("book", book_id)
        }
        _ => StoreError::Database(err),
    }
}

fn collect_reviews(rows: &[SqliteRow]) -> StoreResult<Vec<Review>> {
    rows.iter()
        .map(|row| review_from_row(row).map_err(StoreError::from))
        .collect()
}

fn review_from_row(row: &SqliteRow) -> Result<Review, sqlx::Error> {
    Ok(Review {
        id: row.try_get("id")?,
        book: row.try_get("book_id")?,
        reviewer: row.try_get("reviewer")?,
        text: row.try_get("text")?,
        rating: row.try_get("rating")?,
        created_at: row.try_get("created_at")?,
    })
}
