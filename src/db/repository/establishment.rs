use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{paginate_table, Page, PageRequest};
use crate::db::DatabaseError;
use crate::models::*;

const ADDRESS_COLUMNS: &str =
    "id, street, interior_number, exterior_number, neighborhood, zip_code, city, country";
const ESTABLISHMENT_COLUMNS: &str =
    "id, establishment_name, establishment_type, website_url, address_id";

fn address_from_row(row: &Row<'_>) -> rusqlite::Result<Address> {
    Ok(Address {
        id: row.get(0)?,
        street: row.get(1)?,
        interior_number: row.get(2)?,
        exterior_number: row.get(3)?,
        neighborhood: row.get(4)?,
        zip_code: row.get(5)?,
        city: row.get(6)?,
        country: row.get(7)?,
    })
}

fn establishment_from_row(row: &Row<'_>) -> rusqlite::Result<Establishment> {
    Ok(Establishment {
        id: row.get(0)?,
        establishment_name: row.get(1)?,
        establishment_type: row.get(2)?,
        website_url: row.get(3)?,
        address_id: row.get(4)?,
    })
}

// ── Addresses ──────────────────────────────────────────────

pub fn insert_address(conn: &Connection, address: &NewAddress) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO addresses (street, interior_number, exterior_number, neighborhood,
                                zip_code, city, country)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            address.street,
            address.interior_number,
            address.exterior_number,
            address.neighborhood,
            address.zip_code,
            address.city,
            address.country,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_address(conn: &Connection, id: i64) -> Result<Option<Address>, DatabaseError> {
    let address = conn
        .query_row(
            &format!("SELECT {ADDRESS_COLUMNS} FROM addresses WHERE id = ?1"),
            params![id],
            address_from_row,
        )
        .optional()?;
    Ok(address)
}

pub fn list_addresses(
    conn: &Connection,
    page: PageRequest,
) -> Result<Page<Address>, DatabaseError> {
    paginate_table(conn, "addresses", ADDRESS_COLUMNS, "id", page, address_from_row)
}

pub fn update_address(conn: &Connection, address: &Address) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE addresses SET street = ?1, interior_number = ?2, exterior_number = ?3,
                neighborhood = ?4, zip_code = ?5, city = ?6, country = ?7,
                updated_at = CURRENT_TIMESTAMP
         WHERE id = ?8",
        params![
            address.street,
            address.interior_number,
            address.exterior_number,
            address.neighborhood,
            address.zip_code,
            address.city,
            address.country,
            address.id,
        ],
    )?;
    if updated == 0 {
        return Err(DatabaseError::not_found("Address", address.id));
    }
    Ok(())
}

pub fn delete_address(conn: &Connection, id: i64) -> Result<bool, DatabaseError> {
    let deleted = conn.execute("DELETE FROM addresses WHERE id = ?1", params![id])?;
    Ok(deleted > 0)
}

// ── Establishments ─────────────────────────────────────────

pub fn insert_establishment(
    conn: &Connection,
    establishment: &NewEstablishment,
) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO establishments (establishment_name, establishment_type, website_url,
                                     address_id)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            establishment.establishment_name,
            establishment.establishment_type,
            establishment.website_url,
            establishment.address_id,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_establishment(
    conn: &Connection,
    id: i64,
) -> Result<Option<Establishment>, DatabaseError> {
    let establishment = conn
        .query_row(
            &format!("SELECT {ESTABLISHMENT_COLUMNS} FROM establishments WHERE id = ?1"),
            params![id],
            establishment_from_row,
        )
        .optional()?;
    Ok(establishment)
}

pub fn list_establishments(
    conn: &Connection,
    page: PageRequest,
) -> Result<Page<Establishment>, DatabaseError> {
    paginate_table(
        conn,
        "establishments",
        ESTABLISHMENT_COLUMNS,
        "id",
        page,
        establishment_from_row,
    )
}

pub fn update_establishment(
    conn: &Connection,
    establishment: &Establishment,
) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE establishments SET establishment_name = ?1, establishment_type = ?2,
                website_url = ?3, address_id = ?4, updated_at = CURRENT_TIMESTAMP
         WHERE id = ?5",
        params![
            establishment.establishment_name,
            establishment.establishment_type,
            establishment.website_url,
            establishment.address_id,
            establishment.id,
        ],
    )?;
    if updated == 0 {
        return Err(DatabaseError::not_found("Establishment", establishment.id));
    }
    Ok(())
}

pub fn delete_establishment(conn: &Connection, id: i64) -> Result<bool, DatabaseError> {
    let deleted = conn.execute("DELETE FROM establishments WHERE id = ?1", params![id])?;
    Ok(deleted > 0)
}

pub fn with_address(
    conn: &Connection,
    establishment: Establishment,
) -> Result<EstablishmentWithAddress, DatabaseError> {
    let address = match establishment.address_id {
        Some(id) => get_address(conn, id)?,
        None => None,
    };
    Ok(EstablishmentWithAddress {
        establishment,
        address,
    })
}

pub fn load_establishment(
    conn: &Connection,
    id: i64,
) -> Result<Option<EstablishmentWithAddress>, DatabaseError> {
    get_establishment(conn, id)?
        .map(|e| with_address(conn, e))
        .transpose()
}

/// Establishments a doctor attends, each with its address.
pub fn list_doctor_establishments(
    conn: &Connection,
    doctor_id: i64,
) -> Result<Vec<EstablishmentWithAddress>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT e.id, e.establishment_name, e.establishment_type, e.website_url, e.address_id
         FROM doctor_establishment j JOIN establishments e ON e.id = j.establishment_id
         WHERE j.doctor_user_id = ?1
         ORDER BY j.id",
    )?;
    let rows = stmt
        .query_map(params![doctor_id], establishment_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    rows.into_iter().map(|e| with_address(conn, e)).collect()
}
