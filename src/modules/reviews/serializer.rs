use serde_json::Value;
use shelf_http::{
    serializer::{FieldErrors, FieldReader},
    AppError,
};

use super::models::ReviewDraft;
use crate::modules::books::store::BookStore;

pub const REVIEWER_MAX_LEN: usize = 100;
pub const RATING_MIN: i64 = 1;
pub const RATING_MAX: i64 = 5;

/// Validate a full review representation, resolving `book` against the store.
pub async fn validate_review(payload: &Value, books: &BookStore) -> Result<ReviewDraft, AppError> {
    let mut fields = FieldReader::new(payload)?;
    let book = fields.primary_key_field("book");
    let reviewer = fields.char_field("reviewer", REVIEWER_MAX_LEN);
    let text = fields.text_field("text");
    let rating = fields.integer_field("rating", RATING_MIN, RATING_MAX);

    if let Some(id) = book {
        if !books.exists(id).await? {
            fields.reject("book", format!("Invalid pk \"{id}\" - object does not exist."));
        }
    }

    Ok(fields.finish(|| {
        Some(ReviewDraft {
            book: book?,
            reviewer: reviewer?,
            text: text?,
            rating: rating?,
        })
    })?)
}

/// Validate a review posted under `/books/{id}/reviews`; the path decides the book.
pub fn validate_book_review(payload: &Value, book: i64) -> Result<ReviewDraft, FieldErrors> {
    let mut fields = FieldReader::new(payload)?;
    let reviewer = fields.char_field("reviewer", REVIEWER_MAX_LEN);
    let text = fields.text_field("text");
    let rating = fields.integer_field("rating", RATING_MIN, RATING_MAX);

    fields.finish(|| {
        Some(ReviewDraft {
            book,
            reviewer: reviewer?,
            text: text?,
            rating: rating?,
        })
    })
}
