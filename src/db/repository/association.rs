use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{Page, PageRequest};
use crate::db::DatabaseError;
use crate::models::*;

fn association_from_row(row: &Row<'_>) -> rusqlite::Result<Association> {
    Ok(Association {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        target_id: row.get(2)?,
    })
}

fn association_columns(link: LinkKind) -> String {
    format!("id, {}, {}", link.owner_column(), link.target_column())
}

pub fn insert_association(
    conn: &Connection,
    link: LinkKind,
    owner_id: i64,
    target_id: i64,
) -> Result<i64, DatabaseError> {
    conn.execute(
        &format!(
            "INSERT INTO {} ({}, {}) VALUES (?1, ?2)",
            link.table(),
            link.owner_column(),
            link.target_column()
        ),
        params![owner_id, target_id],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_association(
    conn: &Connection,
    link: LinkKind,
    id: i64,
) -> Result<Option<Association>, DatabaseError> {
    let association = conn
        .query_row(
            &format!(
                "SELECT {} FROM {} WHERE id = ?1",
                association_columns(link),
                link.table()
            ),
            params![id],
            association_from_row,
        )
        .optional()?;
    Ok(association)
}

/// One owner's links, in insertion order.
pub fn list_associations(
    conn: &Connection,
    link: LinkKind,
    owner_id: i64,
    page: PageRequest,
) -> Result<Page<Association>, DatabaseError> {
    let total: i64 = conn.query_row(
        &format!(
            "SELECT COUNT(*) FROM {} WHERE {} = ?1",
            link.table(),
            link.owner_column()
        ),
        params![owner_id],
        |row| row.get(0),
    )?;
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM {} WHERE {} = ?1 ORDER BY id LIMIT ?2 OFFSET ?3",
        association_columns(link),
        link.table(),
        link.owner_column()
    ))?;
    let items = stmt
        .query_map(
            params![owner_id, page.limit(), page.offset()],
            association_from_row,
        )?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(page.page_of(items, total))
}

pub fn update_association(
    conn: &Connection,
    link: LinkKind,
    association: &Association,
) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        &format!(
            "UPDATE {} SET {} = ?1, {} = ?2, updated_at = CURRENT_TIMESTAMP WHERE id = ?3",
            link.table(),
            link.owner_column(),
            link.target_column()
        ),
        params![association.owner_id, association.target_id, association.id],
    )?;
    if updated == 0 {
        return Err(DatabaseError::not_found(link.label(), association.id));
    }
    Ok(())
}

pub fn delete_association(
    conn: &Connection,
    link: LinkKind,
    id: i64,
) -> Result<bool, DatabaseError> {
    let deleted = conn.execute(
        &format!("DELETE FROM {} WHERE id = ?1", link.table()),
        params![id],
    )?;
    Ok(deleted > 0)
}
