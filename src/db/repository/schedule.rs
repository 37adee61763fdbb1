use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{col_enum, col_opt_time, fmt_time, paginate_table, Page, PageRequest};
use crate::db::DatabaseError;
use crate::models::*;

const SCHEDULE_COLUMNS: &str = "id, doctor_id, start_time, end_time, day_of_week";

fn schedule_from_row(row: &Row<'_>) -> rusqlite::Result<Schedule> {
    Ok(Schedule {
        id: row.get(0)?,
        doctor_id: row.get(1)?,
        start_time: col_opt_time(row, 2)?,
        end_time: col_opt_time(row, 3)?,
        day_of_week: col_enum(row, 4)?,
    })
}

pub fn insert_schedule(conn: &Connection, schedule: &NewSchedule) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO schedules (doctor_id, start_time, end_time, day_of_week)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            schedule.doctor_id,
            fmt_time(schedule.start_time),
            fmt_time(schedule.end_time),
            schedule.day_of_week.as_str(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_schedule(conn: &Connection, id: i64) -> Result<Option<Schedule>, DatabaseError> {
    let schedule = conn
        .query_row(
            &format!("SELECT {SCHEDULE_COLUMNS} FROM schedules WHERE id = ?1"),
            params![id],
            schedule_from_row,
        )
        .optional()?;
    Ok(schedule)
}

pub fn list_schedules(
    conn: &Connection,
    page: PageRequest,
) -> Result<Page<Schedule>, DatabaseError> {
    paginate_table(conn, "schedules", SCHEDULE_COLUMNS, "id", page, schedule_from_row)
}

/// Every slot of one doctor, unpaginated.
pub fn list_schedules_for_doctor(
    conn: &Connection,
    doctor_id: i64,
) -> Result<Vec<Schedule>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {SCHEDULE_COLUMNS} FROM schedules WHERE doctor_id = ?1 ORDER BY id"
    ))?;
    let rows = stmt
        .query_map(params![doctor_id], schedule_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn update_schedule(conn: &Connection, schedule: &Schedule) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE schedules SET start_time = ?1, end_time = ?2, day_of_week = ?3,
                updated_at = CURRENT_TIMESTAMP
         WHERE id = ?4",
        params![
            fmt_time(schedule.start_time),
            fmt_time(schedule.end_time),
            schedule.day_of_week.as_str(),
            schedule.id,
        ],
    )?;
    if updated == 0 {
        return Err(DatabaseError::not_found("Schedule", schedule.id));
    }
    Ok(())
}

pub fn delete_schedule(conn: &Connection, id: i64) -> Result<bool, DatabaseError> {
    let deleted = conn.execute("DELETE FROM schedules WHERE id = ?1", params![id])?;
    Ok(deleted > 0)
}
