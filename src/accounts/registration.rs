//! Doctor / patient sign-up.
//!
//! Order of operations:
//! 1. validate every field (read-only, collects all errors)
//! 2. hash the password outside the write transaction
//! 3. in one transaction: user row, role profile, (doctor) seven empty
//!    schedule slots
//! 4. commit, then issue the bearer token
//!
//! Any failure before commit drops the transaction, which rolls back
//! every row written in step 3.

use rusqlite::Connection;

use super::{issue_after_commit, AccountError};
use crate::core_state::CoreState;
use crate::crypto;
use crate::db;
use crate::models::enums::{DayOfWeek, Role};
use crate::models::*;
use crate::validation::{rules, Payload, Validator};

/// A freshly created account with its first token.
#[derive(Debug)]
pub struct Registration<P> {
    pub profile: P,
    pub token: String,
}

pub fn register_doctor(
    conn: &mut Connection,
    core: &CoreState,
    payload: &Payload,
) -> Result<Registration<DoctorProfile>, AccountError> {
    let mut v = Validator::new(payload);
    let info = rules::personal_info(&mut v, conn, None)?;
    let fields = rules::doctor_fields(&mut v, conn, None)?;
    v.finish()?;

    let password = info.password.as_deref().unwrap_or_default();
    let hash = crypto::hash_password(password, core.password_rounds)?;

    let tx = conn.transaction()?;
    let user_id = db::insert_user(&tx, &info.into_new_user(Some(Role::Doctor), hash)?)?;
    db::insert_doctor(&tx, &rules::new_doctor(user_id, fields)?)?;
    for day in DayOfWeek::ALL {
        db::insert_schedule(
            &tx,
            &NewSchedule {
                doctor_id: user_id,
                start_time: None,
                end_time: None,
                day_of_week: *day,
            },
        )?;
    }
    tx.commit()?;
    tracing::info!(user_id, "Doctor registered");

    let token = issue_after_commit(conn, core, user_id)?;
    let profile =
        db::load_doctor_profile(conn, user_id)?.ok_or(AccountError::NotFound("Doctor"))?;
    Ok(Registration { profile, token })
}

pub fn register_patient(
    conn: &mut Connection,
    core: &CoreState,
    payload: &Payload,
) -> Result<Registration<PatientProfile>, AccountError> {
    let mut v = Validator::new(payload);
    let info = rules::personal_info(&mut v, conn, None)?;
    let fields = rules::patient_fields(&mut v, conn, None)?;
    v.finish()?;

    let password = info.password.as_deref().unwrap_or_default();
    let hash = crypto::hash_password(password, core.password_rounds)?;

    let tx = conn.transaction()?;
    let user_id = db::insert_user(&tx, &info.into_new_user(Some(Role::Patient), hash)?)?;
    db::insert_patient(&tx, &rules::new_patient(user_id, fields)?)?;
    tx.commit()?;
    tracing::info!(user_id, "Patient registered");

    let token = issue_after_commit(conn, core, user_id)?;
    let profile =
        db::load_patient_profile(conn, user_id)?.ok_or(AccountError::NotFound("Patient"))?;
    Ok(Registration { profile, token })
}
