use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{col_opt_date, col_opt_enum, fmt_date, paginate_table, Page, PageRequest};
use crate::db::DatabaseError;
use crate::models::*;

const USER_COLUMNS: &str = "id, role, name, last_name, email, password_hash, phone, sex, age, \
     date_of_birth, link_photo, external_id, external_auth";

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        role: col_opt_enum(row, 1)?,
        name: row.get(2)?,
        last_name: row.get(3)?,
        email: row.get(4)?,
        password_hash: row.get(5)?,
        phone: row.get(6)?,
        sex: col_opt_enum(row, 7)?,
        age: row.get(8)?,
        date_of_birth: col_opt_date(row, 9)?,
        link_photo: row.get(10)?,
        external_id: row.get(11)?,
        external_auth: row.get(12)?,
    })
}

pub fn insert_user(conn: &Connection, user: &NewUser) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO users (role, name, last_name, email, password_hash, phone, sex, age,
                            date_of_birth, link_photo, external_id, external_auth)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            user.role.map(|r| r.as_str()),
            user.name,
            user.last_name,
            user.email,
            user.password_hash,
            user.phone,
            user.sex.map(|s| s.as_str()),
            user.age,
            fmt_date(user.date_of_birth),
            user.link_photo,
            user.external_id,
            user.external_auth,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_user(conn: &Connection, id: i64) -> Result<Option<User>, DatabaseError> {
    let user = conn
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
            params![id],
            user_from_row,
        )
        .optional()?;
    Ok(user)
}

pub fn find_user_by_email(conn: &Connection, email: &str) -> Result<Option<User>, DatabaseError> {
    let user = conn
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
            params![email],
            user_from_row,
        )
        .optional()?;
    Ok(user)
}

/// Account previously created through a federated provider.
pub fn find_user_by_external(
    conn: &Connection,
    external_id: &str,
    provider: &str,
) -> Result<Option<User>, DatabaseError> {
    let user = conn
        .query_row(
            &format!(
                "SELECT {USER_COLUMNS} FROM users WHERE external_id = ?1 AND external_auth = ?2"
            ),
            params![external_id, provider],
            user_from_row,
        )
        .optional()?;
    Ok(user)
}

pub fn list_users(conn: &Connection, page: PageRequest) -> Result<Page<User>, DatabaseError> {
    paginate_table(conn, "users", USER_COLUMNS, "id", page, user_from_row)
}

/// Rewrites every mutable column from `user`.
pub fn update_user(conn: &Connection, user: &User) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE users SET role = ?1, name = ?2, last_name = ?3, email = ?4, password_hash = ?5,
                phone = ?6, sex = ?7, age = ?8, date_of_birth = ?9, link_photo = ?10,
                updated_at = CURRENT_TIMESTAMP
         WHERE id = ?11",
        params![
            user.role.map(|r| r.as_str()),
            user.name,
            user.last_name,
            user.email,
            user.password_hash,
            user.phone,
            user.sex.map(|s| s.as_str()),
            user.age,
            fmt_date(user.date_of_birth),
            user.link_photo,
            user.id,
        ],
    )?;
    if updated == 0 {
        return Err(DatabaseError::not_found("User", user.id));
    }
    Ok(())
}

/// Returns `false` when no row matched.
pub fn delete_user(conn: &Connection, id: i64) -> Result<bool, DatabaseError> {
    let deleted = conn.execute("DELETE FROM users WHERE id = ?1", params![id])?;
    Ok(deleted > 0)
}
