use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{
    get_user, list_doctor_establishments, list_doctor_specialties, list_schedules_for_doctor,
    paginate_table, Page, PageRequest,
};
use crate::db::DatabaseError;
use crate::models::*;

fn doctor_from_row(row: &Row<'_>) -> rusqlite::Result<Doctor> {
    Ok(Doctor {
        user_id: row.get(0)?,
        professional_license: row.get(1)?,
        education: row.get(2)?,
        consultation_cost: row.get(3)?,
    })
}

pub fn insert_doctor(conn: &Connection, doctor: &Doctor) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO doctors (user_id, professional_license, education, consultation_cost)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            doctor.user_id,
            doctor.professional_license,
            doctor.education,
            doctor.consultation_cost,
        ],
    )?;
    Ok(())
}

pub fn get_doctor(conn: &Connection, user_id: i64) -> Result<Option<Doctor>, DatabaseError> {
    let doctor = conn
        .query_row(
            "SELECT user_id, professional_license, education, consultation_cost
             FROM doctors WHERE user_id = ?1",
            params![user_id],
            doctor_from_row,
        )
        .optional()?;
    Ok(doctor)
}

pub fn list_doctors(conn: &Connection, page: PageRequest) -> Result<Page<Doctor>, DatabaseError> {
    paginate_table(
        conn,
        "doctors",
        "user_id, professional_license, education, consultation_cost",
        "user_id",
        page,
        doctor_from_row,
    )
}

pub fn update_doctor(conn: &Connection, doctor: &Doctor) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE doctors SET professional_license = ?1, education = ?2, consultation_cost = ?3,
                updated_at = CURRENT_TIMESTAMP
         WHERE user_id = ?4",
        params![
            doctor.professional_license,
            doctor.education,
            doctor.consultation_cost,
            doctor.user_id,
        ],
    )?;
    if updated == 0 {
        return Err(DatabaseError::not_found("Doctor", doctor.user_id));
    }
    Ok(())
}

pub fn delete_doctor(conn: &Connection, user_id: i64) -> Result<bool, DatabaseError> {
    let deleted = conn.execute("DELETE FROM doctors WHERE user_id = ?1", params![user_id])?;
    Ok(deleted > 0)
}

/// Assemble a doctor with user row, specialties, establishments and schedules.
pub fn load_doctor_profile(
    conn: &Connection,
    user_id: i64,
) -> Result<Option<DoctorProfile>, DatabaseError> {
    let Some(doctor) = get_doctor(conn, user_id)? else {
        return Ok(None);
    };
    enrich_doctor(conn, doctor).map(Some)
}

pub fn enrich_doctor(conn: &Connection, doctor: Doctor) -> Result<DoctorProfile, DatabaseError> {
    let user = get_user(conn, doctor.user_id)?
        .ok_or_else(|| DatabaseError::not_found("User", doctor.user_id))?;
    Ok(DoctorProfile {
        specialties: list_doctor_specialties(conn, doctor.user_id)?,
        establishments: list_doctor_establishments(conn, doctor.user_id)?,
        schedules: list_schedules_for_doctor(conn, doctor.user_id)?,
        user,
        doctor,
    })
}
