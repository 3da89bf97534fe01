use serde::{Deserialize, Serialize};
use shelf_http::serializer::iso_date;
use time::Date;

/// A stored book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    /// Unique identifier for the book
    pub id: i64,
    /// Title of the book
    pub title: String,
    /// Author of the book
    pub author: String,
    /// Publication date, `YYYY-MM-DD` on the wire
    #[serde(with = "iso_date")]
    pub published_date: Date,
}

/// Validated input for creating or replacing a book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookDraft {
    pub title: String,
    pub author: String,
    pub published_date: Date,
}
