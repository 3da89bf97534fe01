use serde_json::Value;
use shelf_http::serializer::{FieldErrors, FieldReader};

use super::models::BookDraft;

pub const TITLE_MAX_LEN: usize = 255;
pub const AUTHOR_MAX_LEN: usize = 255;

/// Validate a full book representation; `id` in the payload is ignored.
pub fn validate_book(payload: &Value) -> Result<BookDraft, FieldErrors> {
    let mut fields = FieldReader::new(payload)?;
    let title = fields.char_field("title", TITLE_MAX_LEN);
    let author = fields.char_field("author", AUTHOR_MAX_LEN);
    let published_date = fields.date_field("published_date");

    fields.finish(|| {
        Some(BookDraft {
            title: title?,
            author: author?,
            published_date: published_date?,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::macros::date;

    #[test]
    fn valid_payload_becomes_draft() {
        let draft = validate_book(&json!({
            "id": 99,
            "title": "Dune",
            "author": "Frank Herbert",
            "published_date": "1965-06-01"
        }))
        .unwrap();

        assert_eq!(
            draft,
            BookDraft {
                title: "Dune".to_string(),
                author: "Frank Herbert".to_string(),
                published_date: date!(1965 - 06 - 01),
            }
        );
    }

    #[test]
    fn every_field_is_required() {
        let errors = validate_book(&json!({})).unwrap_err();
        let fields: Vec<&str> = errors.fields().collect();
        assert_eq!(fields, vec!["author", "published_date", "title"]);
    }

    #[test]
    fn overlong_title_is_rejected() {
        let errors = validate_book(&json!({
            "title": "x".repeat(TITLE_MAX_LEN + 1),
            "author": "Anon",
            "published_date": "2001-01-01"
        }))
        .unwrap_err();

        assert_eq!(
            errors.get("title").unwrap(),
            ["Ensure this field has no more than 255 characters."]
        );
    }

    #[test]
    fn impossible_dates_are_rejected() {
        let errors = validate_book(&json!({
            "title": "Dune",
            "author": "Frank Herbert",
            "published_date": "1965-02-30"
        }))
        .unwrap_err();

        assert!(errors.contains("published_date"));
    }
}
