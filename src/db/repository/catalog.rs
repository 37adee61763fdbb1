use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{paginate_table, Page, PageRequest};
use crate::db::DatabaseError;
use crate::models::*;

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<CatalogEntry> {
    Ok(CatalogEntry {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
    })
}

fn entry_columns(kind: CatalogKind) -> String {
    format!("id, {}, description", kind.name_column())
}

pub fn insert_catalog_entry(
    conn: &Connection,
    kind: CatalogKind,
    entry: &NewCatalogEntry,
) -> Result<i64, DatabaseError> {
    conn.execute(
        &format!(
            "INSERT INTO {} ({}, description) VALUES (?1, ?2)",
            kind.table(),
            kind.name_column()
        ),
        params![entry.name, entry.description],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_catalog_entry(
    conn: &Connection,
    kind: CatalogKind,
    id: i64,
) -> Result<Option<CatalogEntry>, DatabaseError> {
    let entry = conn
        .query_row(
            &format!(
                "SELECT {} FROM {} WHERE id = ?1",
                entry_columns(kind),
                kind.table()
            ),
            params![id],
            entry_from_row,
        )
        .optional()?;
    Ok(entry)
}

pub fn list_catalog(
    conn: &Connection,
    kind: CatalogKind,
    page: PageRequest,
) -> Result<Page<CatalogEntry>, DatabaseError> {
    paginate_table(
        conn,
        kind.table(),
        &entry_columns(kind),
        "id",
        page,
        entry_from_row,
    )
}

pub fn update_catalog_entry(
    conn: &Connection,
    kind: CatalogKind,
    entry: &CatalogEntry,
) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        &format!(
            "UPDATE {} SET {} = ?1, description = ?2, updated_at = CURRENT_TIMESTAMP
             WHERE id = ?3",
            kind.table(),
            kind.name_column()
        ),
        params![entry.name, entry.description, entry.id],
    )?;
    if updated == 0 {
        return Err(DatabaseError::not_found(kind.label(), entry.id));
    }
    Ok(())
}

pub fn delete_catalog_entry(
    conn: &Connection,
    kind: CatalogKind,
    id: i64,
) -> Result<bool, DatabaseError> {
    let deleted = conn.execute(
        &format!("DELETE FROM {} WHERE id = ?1", kind.table()),
        params![id],
    )?;
    Ok(deleted > 0)
}

/// Catalog rows a doctor is linked to through `doctor_specialty`.
pub fn list_doctor_specialties(
    conn: &Connection,
    doctor_id: i64,
) -> Result<Vec<CatalogEntry>, DatabaseError> {
    linked_entries(conn, LinkKind::DoctorSpecialty, doctor_id)
}

/// Allergy, disease or medication rows linked to a patient.
pub fn list_patient_catalog(
    conn: &Connection,
    link: LinkKind,
    patient_id: i64,
) -> Result<Vec<CatalogEntry>, DatabaseError> {
    linked_entries(conn, link, patient_id)
}

fn linked_entries(
    conn: &Connection,
    link: LinkKind,
    owner_id: i64,
) -> Result<Vec<CatalogEntry>, DatabaseError> {
    let LinkTarget::Catalog(kind) = link.target() else {
        return Ok(Vec::new());
    };
    let mut stmt = conn.prepare(&format!(
        "SELECT c.id, c.{name}, c.description
         FROM {join} j JOIN {catalog} c ON c.id = j.{target}
         WHERE j.{owner} = ?1
         ORDER BY j.id",
        name = kind.name_column(),
        join = link.table(),
        catalog = kind.table(),
        target = link.target_column(),
        owner = link.owner_column(),
    ))?;
    let rows = stmt
        .query_map(params![owner_id], entry_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}
