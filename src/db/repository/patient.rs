use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{get_user, list_patient_catalog, paginate_table, Page, PageRequest};
use crate::db::DatabaseError;
use crate::models::*;

const PATIENT_COLUMNS: &str =
    "user_id, weight, height, nss, occupation, blood_type, emergency_contact_phone";

fn patient_from_row(row: &Row<'_>) -> rusqlite::Result<Patient> {
    Ok(Patient {
        user_id: row.get(0)?,
        weight: row.get(1)?,
        height: row.get(2)?,
        nss: row.get(3)?,
        occupation: row.get(4)?,
        blood_type: row.get(5)?,
        emergency_contact_phone: row.get(6)?,
    })
}

pub fn insert_patient(conn: &Connection, patient: &Patient) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO patients (user_id, weight, height, nss, occupation, blood_type,
                               emergency_contact_phone)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            patient.user_id,
            patient.weight,
            patient.height,
            patient.nss,
            patient.occupation,
            patient.blood_type,
            patient.emergency_contact_phone,
        ],
    )?;
    Ok(())
}

pub fn get_patient(conn: &Connection, user_id: i64) -> Result<Option<Patient>, DatabaseError> {
    let patient = conn
        .query_row(
            &format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE user_id = ?1"),
            params![user_id],
            patient_from_row,
        )
        .optional()?;
    Ok(patient)
}

pub fn list_patients(
    conn: &Connection,
    page: PageRequest,
) -> Result<Page<Patient>, DatabaseError> {
    paginate_table(conn, "patients", PATIENT_COLUMNS, "user_id", page, patient_from_row)
}

pub fn update_patient(conn: &Connection, patient: &Patient) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE patients SET weight = ?1, height = ?2, nss = ?3, occupation = ?4,
                blood_type = ?5, emergency_contact_phone = ?6, updated_at = CURRENT_TIMESTAMP
         WHERE user_id = ?7",
        params![
            patient.weight,
            patient.height,
            patient.nss,
            patient.occupation,
            patient.blood_type,
            patient.emergency_contact_phone,
            patient.user_id,
        ],
    )?;
    if updated == 0 {
        return Err(DatabaseError::not_found("Patient", patient.user_id));
    }
    Ok(())
}

pub fn delete_patient(conn: &Connection, user_id: i64) -> Result<bool, DatabaseError> {
    let deleted = conn.execute("DELETE FROM patients WHERE user_id = ?1", params![user_id])?;
    Ok(deleted > 0)
}

pub fn load_patient_profile(
    conn: &Connection,
    user_id: i64,
) -> Result<Option<PatientProfile>, DatabaseError> {
    let Some(patient) = get_patient(conn, user_id)? else {
        return Ok(None);
    };
    enrich_patient(conn, patient).map(Some)
}

pub fn enrich_patient(
    conn: &Connection,
    patient: Patient,
) -> Result<PatientProfile, DatabaseError> {
    let user = get_user(conn, patient.user_id)?
        .ok_or_else(|| DatabaseError::not_found("User", patient.user_id))?;
    Ok(PatientProfile {
        allergies: list_patient_catalog(conn, LinkKind::AllergyPatient, patient.user_id)?,
        diseases: list_patient_catalog(conn, LinkKind::DiseasePatient, patient.user_id)?,
        medications: list_patient_catalog(conn, LinkKind::MedicationPatient, patient.user_id)?,
        user,
        patient,
    })
}
