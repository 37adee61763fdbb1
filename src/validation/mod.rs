//! Request validation.
//!
//! A `Validator` walks a decoded JSON object field by field, collecting
//! every failure into `FieldErrors` instead of stopping at the first one.
//! Accessors return the typed value when the field is present and valid.
//! In partial mode (updates) a missing or `null` field is simply skipped,
//! so `required` rules only apply to fields the client actually sent.

pub mod rules;

use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use rusqlite::Connection;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::db::repository::{
    row_exists, value_taken, DATETIME_FORMAT, DATE_FORMAT, TIME_FORMAT,
};
use crate::db::DatabaseError;

/// Field name → human-readable failures, serialized as the `errors` object.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// A decoded request body.
pub type Payload = Map<String, Value>;

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Validation failed")]
    Invalid(FieldErrors),

    #[error("Database error during validation: {0}")]
    Database(#[from] DatabaseError),
}

impl From<FieldErrors> for ValidationError {
    fn from(errors: FieldErrors) -> Self {
        ValidationError::Invalid(errors)
    }
}

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());

/// Uniqueness check spec: `table.column` must not already hold the value,
/// except on the row identified by `ignore`.
#[derive(Debug, Clone, Copy)]
pub struct Unique<'a> {
    pub table: &'a str,
    pub column: &'a str,
    pub ignore: Option<(&'a str, i64)>,
}

pub struct Validator<'a> {
    data: &'a Payload,
    partial: bool,
    errors: FieldErrors,
}

fn label(field: &str) -> String {
    field.replace('_', " ")
}

impl<'a> Validator<'a> {
    /// Create-mode validator: required fields must be present.
    pub fn new(data: &'a Payload) -> Self {
        Self {
            data,
            partial: false,
            errors: FieldErrors::new(),
        }
    }

    /// Update-mode validator: absent or `null` fields are left alone.
    pub fn partial(data: &'a Payload) -> Self {
        Self {
            data,
            partial: true,
            errors: FieldErrors::new(),
        }
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.errors
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn has_error(&self, field: &str) -> bool {
        self.errors.contains_key(field)
    }

    /// Finish validation; `Err` carries every collected failure.
    pub fn finish(self) -> Result<(), FieldErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }

    fn value(&mut self, field: &str, required: bool) -> Option<&'a Value> {
        let data: &'a Payload = self.data;
        match data.get(field) {
            None | Some(Value::Null) => {
                if required && !self.partial {
                    self.add(field, format!("The {} field is required.", label(field)));
                }
                None
            }
            Some(Value::String(s)) if s.trim().is_empty() => {
                if required && !self.partial {
                    self.add(field, format!("The {} field is required.", label(field)));
                }
                None
            }
            Some(value) => Some(value),
        }
    }

    // ── Strings ────────────────────────────────────────────

    fn string(&mut self, field: &str, required: bool) -> Option<String> {
        match self.value(field, required)? {
            Value::String(s) => Some(s.trim().to_string()),
            _ => {
                self.add(field, format!("The {} field must be a string.", label(field)));
                None
            }
        }
    }

    fn bounded(&mut self, field: &str, value: String, max: usize) -> Option<String> {
        if value.chars().count() > max {
            self.add(
                field,
                format!(
                    "The {} field must not be greater than {max} characters.",
                    label(field)
                ),
            );
            return None;
        }
        Some(value)
    }

    pub fn required_string(&mut self, field: &str, max: usize) -> Option<String> {
        let value = self.string(field, true)?;
        self.bounded(field, value, max)
    }

    pub fn optional_string(&mut self, field: &str, max: usize) -> Option<String> {
        let value = self.string(field, false)?;
        self.bounded(field, value, max)
    }

    /// Required string with a minimum length (passwords).
    pub fn required_secret(&mut self, field: &str, min: usize) -> Option<String> {
        let value = match self.value(field, true)? {
            Value::String(s) => s.clone(),
            _ => {
                self.add(field, format!("The {} field must be a string.", label(field)));
                return None;
            }
        };
        if value.chars().count() < min {
            self.add(
                field,
                format!("The {} field must be at least {min} characters.", label(field)),
            );
            return None;
        }
        Some(value)
    }

    pub fn required_email(&mut self, field: &str) -> Option<String> {
        let value = self.required_string(field, 255)?.to_lowercase();
        if !EMAIL_RE.is_match(&value) {
            self.add(
                field,
                format!("The {} field must be a valid email address.", label(field)),
            );
            return None;
        }
        Some(value)
    }

    /// Optional absolute http(s) URL.
    pub fn optional_url(&mut self, field: &str) -> Option<String> {
        let value = self.optional_string(field, 2048)?;
        match reqwest::Url::parse(&value) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Some(value),
            _ => {
                self.add(field, format!("The {} field must be a valid URL.", label(field)));
                None
            }
        }
    }

    // ── Numbers ────────────────────────────────────────────

    fn integer(&mut self, field: &str, required: bool, min: i64, max: i64) -> Option<i64> {
        let parsed = match self.value(field, required)? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        };
        let Some(n) = parsed else {
            self.add(field, format!("The {} field must be an integer.", label(field)));
            return None;
        };
        if n < min {
            self.add(field, format!("The {} field must be at least {min}.", label(field)));
            return None;
        }
        if n > max {
            self.add(
                field,
                format!("The {} field must not be greater than {max}.", label(field)),
            );
            return None;
        }
        Some(n)
    }

    pub fn required_integer(&mut self, field: &str, min: i64, max: i64) -> Option<i64> {
        self.integer(field, true, min, max)
    }

    /// A foreign-key id (positive integer).
    pub fn required_id(&mut self, field: &str) -> Option<i64> {
        self.integer(field, true, 1, i64::MAX)
    }

    pub fn optional_id(&mut self, field: &str) -> Option<i64> {
        self.integer(field, false, 1, i64::MAX)
    }

    fn number(&mut self, field: &str, required: bool, min: f64) -> Option<f64> {
        let parsed = match self.value(field, required)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            _ => None,
        };
        let Some(n) = parsed else {
            self.add(field, format!("The {} field must be a number.", label(field)));
            return None;
        };
        if n < min {
            self.add(field, format!("The {} field must be at least {min}.", label(field)));
            return None;
        }
        Some(n)
    }

    pub fn required_number(&mut self, field: &str, min: f64) -> Option<f64> {
        self.number(field, true, min)
    }

    // ── Dates & times ──────────────────────────────────────

    fn formatted<T>(
        &mut self,
        field: &str,
        required: bool,
        format: &str,
        shown: &str,
        parse: impl Fn(&str, &str) -> chrono::ParseResult<T>,
    ) -> Option<T> {
        let raw = self.string(field, required)?;
        match parse(&raw, format) {
            Ok(value) => Some(value),
            Err(_) => {
                self.add(
                    field,
                    format!("The {} field must match the format {shown}.", label(field)),
                );
                None
            }
        }
    }

    pub fn required_date(&mut self, field: &str) -> Option<NaiveDate> {
        self.formatted(field, true, DATE_FORMAT, "Y-m-d", NaiveDate::parse_from_str)
    }

    pub fn required_datetime(&mut self, field: &str) -> Option<NaiveDateTime> {
        self.formatted(
            field,
            true,
            DATETIME_FORMAT,
            "Y-m-d H:i:s",
            NaiveDateTime::parse_from_str,
        )
    }

    pub fn required_time(&mut self, field: &str) -> Option<NaiveTime> {
        self.formatted(field, true, TIME_FORMAT, "H:i", NaiveTime::parse_from_str)
    }

    // ── Enumerations ───────────────────────────────────────

    /// Value must parse as `T`; `allowed` is listed in the error message.
    pub fn required_enum<T: FromStr>(&mut self, field: &str, allowed: &[&str]) -> Option<T> {
        let raw = self.string(field, true)?;
        match raw.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                self.add(
                    field,
                    format!(
                        "The selected {} is invalid. Allowed: {}.",
                        label(field),
                        allowed.join(", ")
                    ),
                );
                None
            }
        }
    }

    /// Like `required_enum` but with a caller-supplied parser.
    pub fn required_choice<T>(
        &mut self,
        field: &str,
        allowed: &[&str],
        parse: impl Fn(&str) -> Option<T>,
    ) -> Option<T> {
        let raw = self.string(field, true)?;
        match parse(&raw) {
            Some(value) => Some(value),
            None => {
                self.add(
                    field,
                    format!(
                        "The selected {} is invalid. Allowed: {}.",
                        label(field),
                        allowed.join(", ")
                    ),
                );
                None
            }
        }
    }

    // ── Database-backed rules ──────────────────────────────

    /// Flag `value` if it is already taken. Skipped when the field itself
    /// already failed or was not supplied.
    pub fn unique(
        &mut self,
        conn: &Connection,
        field: &str,
        value: Option<&str>,
        rule: Unique<'_>,
    ) -> Result<(), DatabaseError> {
        let Some(value) = value else {
            return Ok(());
        };
        if self.has_error(field) {
            return Ok(());
        }
        if value_taken(conn, rule.table, rule.column, value, rule.ignore)? {
            self.add(field, format!("The {} has already been taken.", label(field)));
        }
        Ok(())
    }

    /// Flag `id` unless `table.column = id` exists.
    pub fn exists(
        &mut self,
        conn: &Connection,
        field: &str,
        id: Option<i64>,
        table: &str,
        column: &str,
    ) -> Result<(), DatabaseError> {
        let Some(id) = id else {
            return Ok(());
        };
        if self.has_error(field) {
            return Ok(());
        }
        if !row_exists(conn, table, column, &id)? {
            self.add(field, format!("The selected {} is invalid.", label(field)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;
    use crate::models::enums::Sex;
    use serde_json::json;

    fn payload(value: Value) -> Payload {
        match value {
            Value::Object(map) => map,
            _ => panic!("test payload must be an object"),
        }
    }

    #[test]
    fn missing_required_field_reported() {
        let data = payload(json!({}));
        let mut v = Validator::new(&data);
        assert_eq!(v.required_string("name", 255), None);
        let errors = v.finish().unwrap_err();
        assert_eq!(errors["name"], vec!["The name field is required."]);
    }

    #[test]
    fn partial_mode_skips_missing_and_null() {
        let data = payload(json!({ "phone": null }));
        let mut v = Validator::partial(&data);
        assert_eq!(v.required_string("name", 255), None);
        assert_eq!(v.required_string("phone", 20), None);
        assert!(v.finish().is_ok());
    }

    #[test]
    fn partial_mode_still_validates_present_fields() {
        let data = payload(json!({ "age": -1 }));
        let mut v = Validator::partial(&data);
        assert_eq!(v.required_integer("age", 0, 255), None);
        assert_eq!(
            v.finish().unwrap_err()["age"],
            vec!["The age field must be at least 0."]
        );
    }

    #[test]
    fn string_length_enforced() {
        let data = payload(json!({ "phone": "1".repeat(21) }));
        let mut v = Validator::new(&data);
        assert_eq!(v.required_string("phone", 20), None);
        assert!(v.finish().is_err());
    }

    #[test]
    fn email_is_normalized_and_checked() {
        let data = payload(json!({ "email": "DocMario@Example.com", "bad": "nope" }));
        let mut v = Validator::new(&data);
        assert_eq!(
            v.required_email("email").as_deref(),
            Some("docmario@example.com")
        );
        assert_eq!(v.required_email("bad"), None);
        assert!(v.finish().unwrap_err().contains_key("bad"));
    }

    #[test]
    fn numbers_accept_numeric_strings() {
        let data = payload(json!({ "weight": "70.5", "height": 1.8, "age": "41" }));
        let mut v = Validator::new(&data);
        assert_eq!(v.required_number("weight", 0.0), Some(70.5));
        assert_eq!(v.required_number("height", 0.0), Some(1.8));
        assert_eq!(v.required_integer("age", 0, 255), Some(41));
        assert!(v.finish().is_ok());
    }

    #[test]
    fn date_formats_enforced() {
        let data = payload(json!({
            "date_of_birth": "1990-02-30",
            "appointment_datetime": "2026-03-02 10:30:00",
            "start_time": "9am",
        }));
        let mut v = Validator::new(&data);
        assert_eq!(v.required_date("date_of_birth"), None);
        assert!(v.required_datetime("appointment_datetime").is_some());
        assert_eq!(v.required_time("start_time"), None);
        let errors = v.finish().unwrap_err();
        assert!(errors.contains_key("date_of_birth"));
        assert!(errors.contains_key("start_time"));
        assert!(!errors.contains_key("appointment_datetime"));
    }

    #[test]
    fn enum_membership() {
        let data = payload(json!({ "sex": "female", "other": "unknown" }));
        let mut v = Validator::new(&data);
        assert_eq!(v.required_enum::<Sex>("sex", &["male", "female", "other"]), Some(Sex::Female));
        assert_eq!(v.required_enum::<Sex>("other", &["male", "female", "other"]), None);
        assert!(v.finish().unwrap_err().contains_key("other"));
    }

    #[test]
    fn url_requires_http_scheme() {
        let data = payload(json!({ "a": "https://meet.example.com/x", "b": "ftp://x", "c": "nope" }));
        let mut v = Validator::new(&data);
        assert!(v.optional_url("a").is_some());
        assert!(v.optional_url("b").is_none());
        assert!(v.optional_url("c").is_none());
        assert_eq!(v.finish().unwrap_err().len(), 2);
    }

    #[test]
    fn unique_and_exists_hit_the_database() {
        let conn = open_memory_database().unwrap();
        conn.execute(
            "INSERT INTO users (name, last_name, email) VALUES ('A', 'B', 'taken@example.com')",
            [],
        )
        .unwrap();
        let id = conn.last_insert_rowid();

        let data = payload(json!({}));
        let mut v = Validator::new(&data);
        let rule = Unique {
            table: "users",
            column: "email",
            ignore: None,
        };
        v.unique(&conn, "email", Some("taken@example.com"), rule).unwrap();
        v.exists(&conn, "doctor_id", Some(99), "doctors", "user_id").unwrap();
        let errors = v.finish().unwrap_err();
        assert_eq!(errors["email"], vec!["The email has already been taken."]);
        assert_eq!(errors["doctor_id"], vec!["The selected doctor id is invalid."]);

        let mut v = Validator::new(&data);
        let own = Unique {
            ignore: Some(("id", id)),
            ..rule
        };
        v.unique(&conn, "email", Some("taken@example.com"), own).unwrap();
        assert!(v.finish().is_ok());
    }
}
