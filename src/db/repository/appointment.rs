use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{
    col_datetime, col_enum, fmt_datetime, get_doctor, get_patient, load_summary_for_appointment,
    paginate_table, Page, PageRequest,
};
use crate::db::DatabaseError;
use crate::models::*;

const APPOINTMENT_COLUMNS: &str = "id, doctor_id, patient_id, appointment_datetime, link, \
     status, reason, consultation_cost";

fn appointment_from_row(row: &Row<'_>) -> rusqlite::Result<Appointment> {
    Ok(Appointment {
        id: row.get(0)?,
        doctor_id: row.get(1)?,
        patient_id: row.get(2)?,
        appointment_datetime: col_datetime(row, 3)?,
        link: row.get(4)?,
        status: col_enum(row, 5)?,
        reason: row.get(6)?,
        consultation_cost: row.get(7)?,
    })
}

pub fn insert_appointment(
    conn: &Connection,
    appt: &NewAppointment,
) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO appointments (doctor_id, patient_id, appointment_datetime, link, status,
                                   reason, consultation_cost)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            appt.doctor_id,
            appt.patient_id,
            fmt_datetime(appt.appointment_datetime),
            appt.link,
            appt.status.as_str(),
            appt.reason,
            appt.consultation_cost,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_appointment(conn: &Connection, id: i64) -> Result<Option<Appointment>, DatabaseError> {
    let appt = conn
        .query_row(
            &format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE id = ?1"),
            params![id],
            appointment_from_row,
        )
        .optional()?;
    Ok(appt)
}

pub fn list_appointments(
    conn: &Connection,
    page: PageRequest,
) -> Result<Page<Appointment>, DatabaseError> {
    paginate_table(
        conn,
        "appointments",
        APPOINTMENT_COLUMNS,
        "id",
        page,
        appointment_from_row,
    )
}

pub fn update_appointment(conn: &Connection, appt: &Appointment) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE appointments SET doctor_id = ?1, patient_id = ?2, appointment_datetime = ?3,
                link = ?4, status = ?5, reason = ?6, consultation_cost = ?7,
                updated_at = CURRENT_TIMESTAMP
         WHERE id = ?8",
        params![
            appt.doctor_id,
            appt.patient_id,
            fmt_datetime(appt.appointment_datetime),
            appt.link,
            appt.status.as_str(),
            appt.reason,
            appt.consultation_cost,
            appt.id,
        ],
    )?;
    if updated == 0 {
        return Err(DatabaseError::not_found("Appointment", appt.id));
    }
    Ok(())
}

pub fn delete_appointment(conn: &Connection, id: i64) -> Result<bool, DatabaseError> {
    let deleted = conn.execute("DELETE FROM appointments WHERE id = ?1", params![id])?;
    Ok(deleted > 0)
}

pub fn load_appointment_detail(
    conn: &Connection,
    id: i64,
) -> Result<Option<AppointmentDetail>, DatabaseError> {
    let Some(appt) = get_appointment(conn, id)? else {
        return Ok(None);
    };
    enrich_appointment(conn, appt).map(Some)
}

pub fn enrich_appointment(
    conn: &Connection,
    appointment: Appointment,
) -> Result<AppointmentDetail, DatabaseError> {
    Ok(AppointmentDetail {
        doctor: get_doctor(conn, appointment.doctor_id)?,
        patient: get_patient(conn, appointment.patient_id)?,
        summary: load_summary_for_appointment(conn, appointment.id)?,
        appointment,
    })
}
