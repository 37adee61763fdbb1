use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension};

use super::{col_opt_datetime, col_opt_enum, fmt_datetime};
use crate::db::DatabaseError;
use crate::models::enums::Role;

/// What a presented bearer token resolves to.
#[derive(Debug, Clone)]
pub struct TokenRecord {
    pub token_id: i64,
    pub user_id: i64,
    pub role: Option<Role>,
    pub expires_at: Option<NaiveDateTime>,
}

pub fn insert_access_token(
    conn: &Connection,
    user_id: i64,
    token_hash: &str,
    expires_at: Option<NaiveDateTime>,
) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO access_tokens (user_id, token_hash, expires_at) VALUES (?1, ?2, ?3)",
        params![user_id, token_hash, expires_at.map(fmt_datetime)],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Resolve a token hash to its owner. The owner's role is read live so
/// a role change applies to tokens already issued.
pub fn find_access_token(
    conn: &Connection,
    token_hash: &str,
) -> Result<Option<TokenRecord>, DatabaseError> {
    let record = conn
        .query_row(
            "SELECT t.id, t.user_id, u.role, t.expires_at
             FROM access_tokens t JOIN users u ON u.id = t.user_id
             WHERE t.token_hash = ?1",
            params![token_hash],
            |row| {
                Ok(TokenRecord {
                    token_id: row.get(0)?,
                    user_id: row.get(1)?,
                    role: col_opt_enum(row, 2)?,
                    expires_at: col_opt_datetime(row, 3)?,
                })
            },
        )
        .optional()?;
    Ok(record)
}

pub fn touch_access_token(conn: &Connection, token_id: i64) -> Result<(), DatabaseError> {
    conn.execute(
        "UPDATE access_tokens SET last_used_at = CURRENT_TIMESTAMP WHERE id = ?1",
        params![token_id],
    )?;
    Ok(())
}

pub fn delete_access_token(conn: &Connection, token_id: i64) -> Result<(), DatabaseError> {
    conn.execute("DELETE FROM access_tokens WHERE id = ?1", params![token_id])?;
    Ok(())
}
