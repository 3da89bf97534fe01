use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A stored review of one book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: i64,
    /// Id of the reviewed book
    pub book: i64,
    pub reviewer: String,
    pub text: String,
    /// Between 1 and 5 inclusive
    pub rating: i64,
    /// Set once on insert
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Validated input for creating or replacing a review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewDraft {
    pub book: i64,
    pub reviewer: String,
    pub text: String,
    pub rating: i64,
}
