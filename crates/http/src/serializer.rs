//! Field-level validation for JSON payloads.
//!
//! Entity serializers compose the `FieldReader` validators into one routine
//! per entity. Every field is checked even after an earlier one fails, so a
//! single 400 response reports all problems at once.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};
use time::Date;

/// Key used for errors that do not belong to a single field
pub const NON_FIELD_ERRORS: &str = "non_field_errors";

const REQUIRED: &str = "This field is required.";
const NULL: &str = "This field may not be null.";
const BLANK: &str = "This field may not be blank.";
const NOT_A_STRING: &str = "Not a valid string.";
const NOT_AN_INTEGER: &str = "A valid integer is required.";
const BAD_DATE: &str = "Date has wrong format. Use one of these formats instead: YYYY-MM-DD.";

/// Mapping of field name to the messages explaining why it was rejected
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    /// Errors holding a single message under `non_field_errors`
    pub fn non_field(message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.add(NON_FIELD_ERRORS, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

/// Reads typed fields out of a JSON object while collecting errors
pub struct FieldReader<'a> {
    data: &'a Map<String, Value>,
    errors: FieldErrors,
}

impl<'a> FieldReader<'a> {
    /// Start reading `payload`, which must be a JSON object.
    pub fn new(payload: &'a Value) -> Result<Self, FieldErrors> {
        match payload {
            Value::Object(data) => Ok(Self {
                data,
                errors: FieldErrors::default(),
            }),
            other => Err(FieldErrors::non_field(format!(
                "Invalid data. Expected an object, but got {}.",
                json_type_name(other)
            ))),
        }
    }

    fn present(&mut self, name: &str) -> Option<&'a Value> {
        match self.data.get(name) {
            None => {
                self.errors.add(name, REQUIRED);
                None
            }
            Some(Value::Null) => {
                self.errors.add(name, NULL);
                None
            }
            Some(value) => Some(value),
        }
    }

    /// Required, non-blank string of at most `max_len` characters.
    ///
    /// Numbers are accepted and rendered as text; surrounding whitespace is
    /// trimmed before the blank and length checks.
    pub fn char_field(&mut self, name: &str, max_len: usize) -> Option<String> {
        let text = self.text_field(name)?;
        if text.chars().count() > max_len {
            self.errors.add(
                name,
                format!("Ensure this field has no more than {max_len} characters."),
            );
            return None;
        }
        Some(text)
    }

    /// Required, non-blank string without a length limit.
    pub fn text_field(&mut self, name: &str) -> Option<String> {
        let text = match self.present(name)? {
            Value::String(text) => text.trim().to_string(),
            Value::Number(number) => number.to_string(),
            _ => {
                self.errors.add(name, NOT_A_STRING);
                return None;
            }
        };
        if text.is_empty() {
            self.errors.add(name, BLANK);
            return None;
        }
        Some(text)
    }

    /// Required calendar date in `YYYY-MM-DD` form.
    pub fn date_field(&mut self, name: &str) -> Option<Date> {
        let parsed = match self.present(name)? {
            Value::String(text) => iso_date::parse(text.trim()),
            _ => None,
        };
        if parsed.is_none() {
            self.errors.add(name, BAD_DATE);
        }
        parsed
    }

    /// Required integer within `min..=max`.
    pub fn integer_field(&mut self, name: &str, min: i64, max: i64) -> Option<i64> {
        let raw = self.present(name)?;
        let Some(value) = as_integer(raw) else {
            self.errors.add(name, NOT_AN_INTEGER);
            return None;
        };

        if value < min {
            self.errors.add(
                name,
                format!("Ensure this value is greater than or equal to {min}."),
            );
            return None;
        }
        if value > max {
            self.errors.add(
                name,
                format!("Ensure this value is less than or equal to {max}."),
            );
            return None;
        }
        Some(value)
    }

    /// Required reference to another entity by integer id.
    ///
    /// Only the shape is checked here; callers resolve the id and report a
    /// dangling reference with [`FieldReader::reject`].
    pub fn primary_key_field(&mut self, name: &str) -> Option<i64> {
        let value = self.present(name)?;
        let parsed = match value {
            Value::Number(_) | Value::String(_) => as_integer(value),
            _ => None,
        };
        if parsed.is_none() {
            self.errors.add(
                name,
                format!(
                    "Incorrect type. Expected pk value, received {}.",
                    json_type_name(value)
                ),
            );
        }
        parsed
    }

    /// Record an error found outside the built-in validators.
    pub fn reject(&mut self, name: &str, message: impl Into<String>) {
        self.errors.add(name, message);
    }

    /// Fail with the collected errors, or assemble the validated value.
    ///
    /// `build` is only called when no errors were recorded, at which point
    /// every validator above has returned `Some`.
    pub fn finish<T>(self, build: impl FnOnce() -> Option<T>) -> Result<T, FieldErrors> {
        if !self.errors.is_empty() {
            return Err(self.errors);
        }
        build().ok_or_else(|| FieldErrors::non_field("Invalid data."))
    }
}

fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64().or_else(|| {
            number
                .as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

/// JSON type name used in error messages
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Serde adapter for calendar dates as `YYYY-MM-DD`
pub mod iso_date {
    use serde::{Deserialize, Deserializer, Serializer};
    use time::{format_description::BorrowedFormatItem, macros::format_description, Date};

    const FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

    pub fn parse(text: &str) -> Option<Date> {
        Date::parse(text, FORMAT).ok()
    }

    pub fn format(date: &Date) -> String {
        date.format(FORMAT).unwrap_or_default()
    }

    pub fn serialize<S: Serializer>(date: &Date, serializer: S) -> Result<S::Ok, S::Error> {
        let text = date.format(FORMAT).map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&text)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Date, D::Error> {
        let text = String::deserialize(deserializer)?;
        Date::parse(&text, FORMAT).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::macros::date;

    #[test]
    fn non_object_payload_is_rejected() {
        let errors = FieldReader::new(&json!([1, 2])).err().unwrap();
        assert_eq!(
            errors.get(NON_FIELD_ERRORS).unwrap(),
            ["Invalid data. Expected an object, but got array."]
        );
    }

    #[test]
    fn missing_and_null_fields_are_reported_together() {
        let payload = json!({"author": null});
        let mut fields = FieldReader::new(&payload).unwrap();
        assert!(fields.char_field("title", 255).is_none());
        assert!(fields.char_field("author", 255).is_none());

        let errors = fields.finish(|| Some(())).unwrap_err();
        assert_eq!(errors.get("title").unwrap(), [REQUIRED]);
        assert_eq!(errors.get("author").unwrap(), [NULL]);
    }

    #[test]
    fn char_field_trims_and_checks_length() {
        let payload = json!({"a": "  Dune  ", "b": "   ", "c": "abcdef", "d": true, "e": 1984});
        let mut fields = FieldReader::new(&payload).unwrap();
        assert_eq!(fields.char_field("a", 10).as_deref(), Some("Dune"));
        assert!(fields.char_field("b", 10).is_none());
        assert!(fields.char_field("c", 5).is_none());
        assert!(fields.char_field("d", 5).is_none());
        assert_eq!(fields.char_field("e", 5).as_deref(), Some("1984"));

        let errors = fields.finish(|| Some(())).unwrap_err();
        assert_eq!(errors.get("b").unwrap(), [BLANK]);
        assert_eq!(
            errors.get("c").unwrap(),
            ["Ensure this field has no more than 5 characters."]
        );
        assert_eq!(errors.get("d").unwrap(), [NOT_A_STRING]);
        assert!(!errors.contains("a"));
    }

    #[test]
    fn date_field_accepts_iso_dates_only() {
        let payload = json!({"ok": "1965-06-01", "loose": "1965-6-1", "num": 19650601});
        let mut fields = FieldReader::new(&payload).unwrap();
        assert_eq!(fields.date_field("ok"), Some(date!(1965 - 06 - 01)));
        assert!(fields.date_field("loose").is_none());
        assert!(fields.date_field("num").is_none());

        let errors = fields.finish(|| Some(())).unwrap_err();
        assert_eq!(errors.get("loose").unwrap(), [BAD_DATE]);
        assert_eq!(errors.get("num").unwrap(), [BAD_DATE]);
    }

    #[test]
    fn integer_field_enforces_bounds() {
        for rating in 1..=5 {
            let payload = json!({ "rating": rating });
            let mut fields = FieldReader::new(&payload).unwrap();
            assert_eq!(fields.integer_field("rating", 1, 5), Some(rating));
        }

        let payload = json!({"low": 0, "high": 6, "text": "five", "numeric": "3", "frac": 2.5});
        let mut fields = FieldReader::new(&payload).unwrap();
        assert!(fields.integer_field("low", 1, 5).is_none());
        assert!(fields.integer_field("high", 1, 5).is_none());
        assert!(fields.integer_field("text", 1, 5).is_none());
        assert_eq!(fields.integer_field("numeric", 1, 5), Some(3));
        assert!(fields.integer_field("frac", 1, 5).is_none());

        let errors = fields.finish(|| Some(())).unwrap_err();
        assert_eq!(
            errors.get("low").unwrap(),
            ["Ensure this value is greater than or equal to 1."]
        );
        assert_eq!(
            errors.get("high").unwrap(),
            ["Ensure this value is less than or equal to 5."]
        );
        assert_eq!(errors.get("text").unwrap(), [NOT_AN_INTEGER]);
        assert_eq!(errors.get("frac").unwrap(), [NOT_AN_INTEGER]);
    }

    #[test]
    fn primary_key_field_reports_received_type() {
        let payload = json!({"book": [1], "other": "12"});
        let mut fields = FieldReader::new(&payload).unwrap();
        assert!(fields.primary_key_field("book").is_none());
        assert_eq!(fields.primary_key_field("other"), Some(12));

        let errors = fields.finish(|| Some(())).unwrap_err();
        assert_eq!(
            errors.get("book").unwrap(),
            ["Incorrect type. Expected pk value, received array."]
        );
    }

    #[test]
    fn finish_builds_when_clean() {
        let payload = json!({"title": "Dune"});
        let mut fields = FieldReader::new(&payload).unwrap();
        let title = fields.char_field("title", 255);
        let built = fields.finish(|| Some(title?.len())).unwrap();
        assert_eq!(built, 4);
    }

    #[test]
    fn display_joins_messages() {
        let mut errors = FieldErrors::default();
        errors.add("rating", "too high");
        errors.add("book", "missing");
        assert_eq!(errors.to_string(), "book: missing; rating: too high");
    }

    #[test]
    fn iso_date_round_trips_through_serde() {
        #[derive(Serialize, serde::Deserialize)]
        struct Wrapper {
            #[serde(with = "iso_date")]
            day: Date,
        }

        let encoded = serde_json::to_value(Wrapper {
            day: date!(2024 - 02 - 29),
        })
        .unwrap();
        assert_eq!(encoded, json!({"day": "2024-02-29"}));

        let decoded: Wrapper = serde_json::from_value(encoded).unwrap();
        assert_eq!(iso_date::format(&decoded.day), "2024-02-29");
    }
}
