//! Repository layer — entity-scoped database operations.
//!
//! Plain functions over `&Connection` so they run unchanged inside a
//! `rusqlite::Transaction` (which derefs to `Connection`).
//! All public functions are re-exported here.

mod appointment;
mod association;
mod catalog;
mod doctor;
mod establishment;
mod patient;
mod schedule;
mod summary;
mod token;
mod user;

use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::DatabaseError;

pub use appointment::*;
pub use association::*;
pub use catalog::*;
pub use doctor::*;
pub use establishment::*;
pub use patient::*;
pub use schedule::*;
pub use summary::*;
pub use token::*;
pub use user::*;

/// Storage formats for temporal columns (TEXT in SQLite).
pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M";
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ═══════════════════════════════════════════════════════════
// Pagination
// ═══════════════════════════════════════════════════════════

/// A 1-based page window over an insertion-ordered listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub per_page: u32,
}

impl PageRequest {
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.max(1),
        }
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.per_page)
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.per_page)
    }

    pub fn page_of<T>(&self, items: Vec<T>, total: i64) -> Page<T> {
        Page {
            items,
            total,
            current_page: self.page,
            per_page: self.per_page,
        }
    }
}

/// One page of results plus the total row count of the listing.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub current_page: u32,
    pub per_page: u32,
}

impl<T> Page<T> {
    /// Last page number; an empty listing still has page 1.
    pub fn last_page(&self) -> u32 {
        let per_page = i64::from(self.per_page);
        let pages = (self.total + per_page - 1) / per_page;
        pages.max(1) as u32
    }

    /// 1-based position of the first item on this page, `None` when empty.
    pub fn from(&self) -> Option<i64> {
        if self.items.is_empty() {
            return None;
        }
        Some(i64::from(self.current_page - 1) * i64::from(self.per_page) + 1)
    }

    pub fn to(&self) -> Option<i64> {
        self.from().map(|from| from + self.items.len() as i64 - 1)
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            current_page: self.current_page,
            per_page: self.per_page,
        }
    }

    /// Fallible `map`, for enriching each row with relations.
    pub fn try_map<U, E>(self, f: impl FnMut(T) -> Result<U, E>) -> Result<Page<U>, E> {
        let items = self.items.into_iter().map(f).collect::<Result<Vec<_>, _>>()?;
        Ok(Page {
            items,
            total: self.total,
            current_page: self.current_page,
            per_page: self.per_page,
        })
    }
}

/// Count + windowed select over a whole table, ordered by `order_by`.
pub(crate) fn paginate_table<T>(
    conn: &Connection,
    table: &str,
    columns: &str,
    order_by: &str,
    page: PageRequest,
    map: impl FnMut(&Row<'_>) -> rusqlite::Result<T>,
) -> Result<Page<T>, DatabaseError> {
    let total: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
        row.get(0)
    })?;
    let mut stmt = conn.prepare(&format!(
        "SELECT {columns} FROM {table} ORDER BY {order_by} LIMIT ?1 OFFSET ?2"
    ))?;
    let items = stmt
        .query_map(params![page.limit(), page.offset()], map)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(page.page_of(items, total))
}

// ═══════════════════════════════════════════════════════════
// Lookups shared by validators
// ═══════════════════════════════════════════════════════════

/// Whether a row with `column = value` exists in `table`.
///
/// `table` and `column` are always compile-time identifiers from this crate.
pub fn row_exists(
    conn: &Connection,
    table: &str,
    column: &str,
    value: &dyn rusqlite::ToSql,
) -> Result<bool, DatabaseError> {
    let found = conn
        .query_row(
            &format!("SELECT 1 FROM {table} WHERE {column} = ?1 LIMIT 1"),
            [value],
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Whether `value` is already used in `table.column` by a row other than
/// the one identified by `ignore = (key_column, key)`.
pub fn value_taken(
    conn: &Connection,
    table: &str,
    column: &str,
    value: &str,
    ignore: Option<(&str, i64)>,
) -> Result<bool, DatabaseError> {
    let found = match ignore {
        Some((key_column, key)) => conn
            .query_row(
                &format!(
                    "SELECT 1 FROM {table} WHERE {column} = ?1 AND {key_column} <> ?2 LIMIT 1"
                ),
                params![value, key],
                |_| Ok(()),
            )
            .optional()?,
        None => conn
            .query_row(
                &format!("SELECT 1 FROM {table} WHERE {column} = ?1 LIMIT 1"),
                params![value],
                |_| Ok(()),
            )
            .optional()?,
    };
    Ok(found.is_some())
}

pub fn count_rows(conn: &Connection, table: &str) -> Result<i64, DatabaseError> {
    let count = conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
        row.get(0)
    })?;
    Ok(count)
}

// ═══════════════════════════════════════════════════════════
// Column decoding
// ═══════════════════════════════════════════════════════════

fn conversion_error(
    idx: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

pub(crate) fn col_enum<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr<Err = DatabaseError>,
{
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|e| conversion_error(idx, e))
}

pub(crate) fn col_opt_enum<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<T>>
where
    T: FromStr<Err = DatabaseError>,
{
    row.get::<_, Option<String>>(idx)?
        .map(|raw| raw.parse().map_err(|e| conversion_error(idx, e)))
        .transpose()
}

pub(crate) fn col_opt_date(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<NaiveDate>> {
    row.get::<_, Option<String>>(idx)?
        .map(|raw| {
            NaiveDate::parse_from_str(&raw, DATE_FORMAT).map_err(|e| conversion_error(idx, e))
        })
        .transpose()
}

pub(crate) fn col_opt_time(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<NaiveTime>> {
    row.get::<_, Option<String>>(idx)?
        .map(|raw| {
            NaiveTime::parse_from_str(&raw, TIME_FORMAT).map_err(|e| conversion_error(idx, e))
        })
        .transpose()
}

pub(crate) fn col_datetime(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDateTime> {
    let raw: String = row.get(idx)?;
    NaiveDateTime::parse_from_str(&raw, DATETIME_FORMAT).map_err(|e| conversion_error(idx, e))
}

pub(crate) fn col_opt_datetime(
    row: &Row<'_>,
    idx: usize,
) -> rusqlite::Result<Option<NaiveDateTime>> {
    row.get::<_, Option<String>>(idx)?
        .map(|raw| {
            NaiveDateTime::parse_from_str(&raw, DATETIME_FORMAT)
                .map_err(|e| conversion_error(idx, e))
        })
        .transpose()
}

pub(crate) fn fmt_date(date: Option<NaiveDate>) -> Option<String> {
    date.map(|d| d.format(DATE_FORMAT).to_string())
}

pub(crate) fn fmt_time(time: Option<NaiveTime>) -> Option<String> {
    time.map(|t| t.format(TIME_FORMAT).to_string())
}

pub(crate) fn fmt_datetime(at: NaiveDateTime) -> String {
    at.format(DATETIME_FORMAT).to_string()
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Row builders shared by repository and service tests.

    use rusqlite::Connection;

    use super::*;
    use crate::models::enums::*;
    use crate::models::*;

    pub fn new_user(email: &str, role: Option<Role>) -> NewUser {
        NewUser {
            role,
            name: "Mario".into(),
            last_name: "Rossi".into(),
            email: email.into(),
            password_hash: None,
            phone: Some("5551234567".into()),
            sex: Some(Sex::Male),
            age: Some(41),
            date_of_birth: NaiveDate::from_ymd_opt(1983, 5, 17),
            link_photo: None,
            external_id: None,
            external_auth: None,
        }
    }

    pub fn make_doctor(conn: &Connection, email: &str, license: &str) -> i64 {
        let user_id = insert_user(conn, &new_user(email, Some(Role::Doctor))).unwrap();
        insert_doctor(
            conn,
            &Doctor {
                user_id,
                professional_license: license.into(),
                education: "UNAM".into(),
                consultation_cost: 500.0,
            },
        )
        .unwrap();
        user_id
    }

    pub fn make_patient(conn: &Connection, email: &str, nss: &str) -> i64 {
        let user_id = insert_user(conn, &new_user(email, Some(Role::Patient))).unwrap();
        insert_patient(
            conn,
            &Patient {
                user_id,
                weight: 70.5,
                height: 1.72,
                nss: nss.into(),
                occupation: Some("Engineer".into()),
                blood_type: Some("O+".into()),
                emergency_contact_phone: None,
            },
        )
        .unwrap();
        user_id
    }

    pub fn make_appointment(conn: &Connection, doctor_id: i64, patient_id: i64) -> i64 {
        insert_appointment(
            conn,
            &NewAppointment {
                doctor_id,
                patient_id,
                appointment_datetime: NaiveDate::from_ymd_opt(2026, 3, 2)
                    .unwrap()
                    .and_hms_opt(10, 30, 0)
                    .unwrap(),
                link: None,
                status: AppointmentStatus::Scheduled,
                reason: "Checkup".into(),
                consultation_cost: 500.0,
            },
        )
        .unwrap()
    }
}
