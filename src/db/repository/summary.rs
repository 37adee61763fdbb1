use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{paginate_table, Page, PageRequest};
use crate::db::DatabaseError;
use crate::models::*;

const MEDICINE_COLUMNS: &str =
    "id, summary_id, medicine_name, dosage, frequency, duration, notes";

fn summary_from_row(row: &Row<'_>) -> rusqlite::Result<Summary> {
    Ok(Summary {
        id: row.get(0)?,
        appointment_id: row.get(1)?,
        diagnosis: row.get(2)?,
    })
}

fn medicine_from_row(row: &Row<'_>) -> rusqlite::Result<Medicine> {
    Ok(Medicine {
        id: row.get(0)?,
        summary_id: row.get(1)?,
        medicine_name: row.get(2)?,
        dosage: row.get(3)?,
        frequency: row.get(4)?,
        duration: row.get(5)?,
        notes: row.get(6)?,
    })
}

// ── Summaries ──────────────────────────────────────────────

pub fn insert_summary(
    conn: &Connection,
    appointment_id: i64,
    diagnosis: &str,
) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO summaries (appointment_id, diagnosis) VALUES (?1, ?2)",
        params![appointment_id, diagnosis],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_summary(conn: &Connection, id: i64) -> Result<Option<Summary>, DatabaseError> {
    let summary = conn
        .query_row(
            "SELECT id, appointment_id, diagnosis FROM summaries WHERE id = ?1",
            params![id],
            summary_from_row,
        )
        .optional()?;
    Ok(summary)
}

pub fn list_summaries(
    conn: &Connection,
    page: PageRequest,
) -> Result<Page<Summary>, DatabaseError> {
    paginate_table(
        conn,
        "summaries",
        "id, appointment_id, diagnosis",
        "id",
        page,
        summary_from_row,
    )
}

pub fn update_summary(conn: &Connection, summary: &Summary) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE summaries SET appointment_id = ?1, diagnosis = ?2, updated_at = CURRENT_TIMESTAMP
         WHERE id = ?3",
        params![summary.appointment_id, summary.diagnosis, summary.id],
    )?;
    if updated == 0 {
        return Err(DatabaseError::not_found("Summary", summary.id));
    }
    Ok(())
}

pub fn delete_summary(conn: &Connection, id: i64) -> Result<bool, DatabaseError> {
    let deleted = conn.execute("DELETE FROM summaries WHERE id = ?1", params![id])?;
    Ok(deleted > 0)
}

pub fn with_medicines(
    conn: &Connection,
    summary: Summary,
) -> Result<SummaryWithMedicines, DatabaseError> {
    Ok(SummaryWithMedicines {
        medicines: list_medicines_for_summary(conn, summary.id)?,
        summary,
    })
}

/// First summary written for an appointment, with its medicines.
pub fn load_summary_for_appointment(
    conn: &Connection,
    appointment_id: i64,
) -> Result<Option<SummaryWithMedicines>, DatabaseError> {
    let summary = conn
        .query_row(
            "SELECT id, appointment_id, diagnosis FROM summaries
             WHERE appointment_id = ?1 ORDER BY id LIMIT 1",
            params![appointment_id],
            summary_from_row,
        )
        .optional()?;
    summary.map(|s| with_medicines(conn, s)).transpose()
}

// ── Medicines ──────────────────────────────────────────────

pub fn insert_medicine(conn: &Connection, medicine: &NewMedicine) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO medicines (summary_id, medicine_name, dosage, frequency, duration, notes)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            medicine.summary_id,
            medicine.medicine_name,
            medicine.dosage,
            medicine.frequency,
            medicine.duration,
            medicine.notes,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_medicine(conn: &Connection, id: i64) -> Result<Option<Medicine>, DatabaseError> {
    let medicine = conn
        .query_row(
            &format!("SELECT {MEDICINE_COLUMNS} FROM medicines WHERE id = ?1"),
            params![id],
            medicine_from_row,
        )
        .optional()?;
    Ok(medicine)
}

pub fn list_medicines(
    conn: &Connection,
    page: PageRequest,
) -> Result<Page<Medicine>, DatabaseError> {
    paginate_table(conn, "medicines", MEDICINE_COLUMNS, "id", page, medicine_from_row)
}

pub fn list_medicines_for_summary(
    conn: &Connection,
    summary_id: i64,
) -> Result<Vec<Medicine>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {MEDICINE_COLUMNS} FROM medicines WHERE summary_id = ?1 ORDER BY id"
    ))?;
    let rows = stmt
        .query_map(params![summary_id], medicine_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn update_medicine(conn: &Connection, medicine: &Medicine) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE medicines SET summary_id = ?1, medicine_name = ?2, dosage = ?3, frequency = ?4,
                duration = ?5, notes = ?6, updated_at = CURRENT_TIMESTAMP
         WHERE id = ?7",
        params![
            medicine.summary_id,
            medicine.medicine_name,
            medicine.dosage,
            medicine.frequency,
            medicine.duration,
            medicine.notes,
            medicine.id,
        ],
    )?;
    if updated == 0 {
        return Err(DatabaseError::not_found("Medicine", medicine.id));
    }
    Ok(())
}

pub fn delete_medicine(conn: &Connection, id: i64) -> Result<bool, DatabaseError> {
    let deleted = conn.execute("DELETE FROM medicines WHERE id = ?1", params![id])?;
    Ok(deleted > 0)
}
