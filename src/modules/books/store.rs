use sqlx::{sqlite::SqliteRow, Row};

use shelf_db::{Database, StoreError, StoreResult};

use super::models::{Book, BookDraft};

const ENTITY: &str = "book";

/// Book rows in the `book` table
#[derive(Clone, Debug)]
pub struct BookStore {
    db: Database,
}

impl BookStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Insert a book and return it with its assigned id
    pub async fn insert(&self, draft: &BookDraft) -> StoreResult<Book> {
        let row = sqlx::query(
            r#"
            INSERT INTO book (title, author, published_date)
            VALUES (?, ?, ?)
            RETURNING id, title, author, published_date
            "#,
        )
        .bind(&draft.title)
        .bind(&draft.author)
        .bind(draft.published_date)
        .fetch_one(self.db.pool())
        .await?;

        Ok(book_from_row(&row)?)
    }

    pub async fn fetch(&self, id: i64) -> StoreResult<Book> {
        let row = sqlx::query(
            r#"
            SELECT id, title, author, published_date
            FROM book
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(self.db.pool())
        .await?;

        match row {
            Some(row) => Ok(book_from_row(&row)?),
            None => Err(StoreError::not_found(ENTITY, id)),
        }
    }

    /// All books ordered by id
    pub async fn fetch_all(&self) -> StoreResult<Vec<Book>> {
        let rows = sqlx::query(
            r#"
            SELECT id, title, author, published_date
            FROM book
            ORDER BY id ASC
            "#,
        )
        .fetch_all(self.db.pool())
        .await?;

        rows.iter()
            .map(|row| book_from_row(row).map_err(StoreError::from))
            .collect()
    }

    pub async fn exists(&self, id: i64) -> StoreResult<bool> {
        let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM book WHERE id = ?")
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(found.is_some())
    }

    /// Overwrite every column of book `id`
    pub async fn update(&self, id: i64, draft: &BookDraft) -> StoreResult<Book> {
        let row = sqlx::query(
            r#"
            UPDATE book
            SET title = ?, author = ?, published_date = ?
            WHERE id = ?
            RETURNING id, title, author, published_date
            "#,
        )
        .bind(&draft.title)
        .bind(&draft.author)
        .bind(draft.published_date)
        .bind(id)
        .fetch_optional(self.db.pool())
        .await?;

        match row {
            Some(row) => Ok(book_from_row(&row)?),
            None => Err(StoreError::not_found(ENTITY, id)),
        }
    }

    /// Delete book `id`; its reviews go with it through `ON DELETE CASCADE`
    pub async fn delete(&self, id: i64) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM book WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(ENTITY, id));
        }
        Ok(())
    }
}

fn book_from_row(row: &SqliteRow) -> Result<Book, sqlx::Error> {
    Ok(Book {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        author: row.try_get("author")?,
        published_date: row.try_get("published_date")?,
    })
}
