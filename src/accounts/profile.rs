//! Profile edits and account removal.
//!
//! Updates are strict partial patches: only fields present (and non-null)
//! in the payload change. Validation and password hashing happen before
//! the write transaction is opened.

use rusqlite::Connection;

use super::AccountError;
use crate::core_state::CoreState;
use crate::crypto;
use crate::db;
use crate::models::*;
use crate::validation::rules::{self, PersonalInfo};
use crate::validation::{Payload, Validator};

fn hash_if_present(info: &PersonalInfo, core: &CoreState) -> Result<Option<String>, AccountError> {
    info.password
        .as_deref()
        .map(|pw| crypto::hash_password(pw, core.password_rounds))
        .transpose()
        .map_err(AccountError::from)
}

pub fn update_doctor_profile(
    conn: &mut Connection,
    core: &CoreState,
    user_id: i64,
    payload: &Payload,
) -> Result<DoctorProfile, AccountError> {
    let mut v = Validator::partial(payload);
    let info = rules::personal_info(&mut v, conn, Some(user_id))?;
    let fields = rules::doctor_fields(&mut v, conn, Some(user_id))?;
    v.finish()?;
    let hash = hash_if_present(&info, core)?;

    let tx = conn.transaction()?;
    let mut user = db::get_user(&tx, user_id)?.ok_or(AccountError::NotFound("User"))?;
    let mut doctor = db::get_doctor(&tx, user_id)?.ok_or(AccountError::NotFound("Doctor"))?;
    info.into_patch(hash).apply(&mut user);
    fields.apply(&mut doctor);
    db::update_user(&tx, &user)?;
    db::update_doctor(&tx, &doctor)?;
    tx.commit()?;
    tracing::info!(user_id, "Doctor profile updated");

    db::load_doctor_profile(conn, user_id)?.ok_or(AccountError::NotFound("Doctor"))
}

pub fn update_patient_profile(
    conn: &mut Connection,
    core: &CoreState,
    user_id: i64,
    payload: &Payload,
) -> Result<PatientProfile, AccountError> {
    let mut v = Validator::partial(payload);
    let info = rules::personal_info(&mut v, conn, Some(user_id))?;
    let fields = rules::patient_fields(&mut v, conn, Some(user_id))?;
    v.finish()?;
    let hash = hash_if_present(&info, core)?;

    let tx = conn.transaction()?;
    let mut user = db::get_user(&tx, user_id)?.ok_or(AccountError::NotFound("User"))?;
    let mut patient = db::get_patient(&tx, user_id)?.ok_or(AccountError::NotFound("Patient"))?;
    info.into_patch(hash).apply(&mut user);
    fields.apply(&mut patient);
    db::update_user(&tx, &user)?;
    db::update_patient(&tx, &patient)?;
    tx.commit()?;
    tracing::info!(user_id, "Patient profile updated");

    db::load_patient_profile(conn, user_id)?.ok_or(AccountError::NotFound("Patient"))
}

/// Remove the doctor row, then its user, atomically.
pub fn delete_doctor_profile(conn: &mut Connection, user_id: i64) -> Result<(), AccountError> {
    let tx = conn.transaction()?;
    if !db::delete_doctor(&tx, user_id)? {
        return Err(AccountError::NotFound("Doctor"));
    }
    db::delete_user(&tx, user_id)?;
    tx.commit()?;
    tracing::info!(user_id, "Doctor account deleted");
    Ok(())
}

/// Remove the patient row, then its user, atomically.
pub fn delete_patient_profile(conn: &mut Connection, user_id: i64) -> Result<(), AccountError> {
    let tx = conn.transaction()?;
    if !db::delete_patient(&tx, user_id)? {
        return Err(AccountError::NotFound("Patient"));
    }
    db::delete_user(&tx, user_id)?;
    tx.commit()?;
    tracing::info!(user_id, "Patient account deleted");
    Ok(())
}

// ═══════════════════════════════════════════════════════════
// Admin
// ═══════════════════════════════════════════════════════════

/// Admin edit of a user's personal information.
pub fn update_user_account(
    conn: &mut Connection,
    core: &CoreState,
    user_id: i64,
    payload: &Payload,
) -> Result<User, AccountError> {
    let mut v = Validator::partial(payload);
    let info = rules::personal_info(&mut v, conn, Some(user_id))?;
    v.finish()?;
    let hash = hash_if_present(&info, core)?;

    let tx = conn.transaction()?;
    let mut user = db::get_user(&tx, user_id)?.ok_or(AccountError::NotFound("User"))?;
    info.into_patch(hash).apply(&mut user);
    db::update_user(&tx, &user)?;
    tx.commit()?;
    tracing::info!(user_id, "User updated by admin");
    Ok(user)
}

/// Delete a user together with whichever role profile it has.
pub fn delete_user_account(conn: &mut Connection, user_id: i64) -> Result<(), AccountError> {
    let tx = conn.transaction()?;
    db::delete_doctor(&tx, user_id)?;
    db::delete_patient(&tx, user_id)?;
    if !db::delete_user(&tx, user_id)? {
        return Err(AccountError::NotFound("User"));
    }
    tx.commit()?;
    tracing::info!(user_id, "User deleted by admin");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;
    use crate::db::repository::{count_rows, fixtures};
    use crate::db::sqlite::open_memory_database;
    use crate::models::enums::Role;
    use serde_json::json;

    #[test]
    fn partial_update_touches_only_sent_fields() {
        let mut conn = open_memory_database().unwrap();
        let id = fixtures::make_doctor(&conn, "doc@example.com", "LIC-1");
        let before = db::load_doctor_profile(&conn, id).unwrap().unwrap();

        let data = payload(json!({ "education": "IPN", "phone": "5550009999" }));
        let after = update_doctor_profile(&mut conn, &core(), id, &data).unwrap();

        assert_eq!(after.doctor.education, "IPN");
        assert_eq!(after.user.phone.as_deref(), Some("5550009999"));
        assert_eq!(after.doctor.professional_license, before.doctor.professional_license);
        assert_eq!(after.doctor.consultation_cost, before.doctor.consultation_cost);
        assert_eq!(after.user.email, before.user.email);
        assert_eq!(after.user.name, before.user.name);
    }

    #[test]
    fn same_patch_twice_is_idempotent() {
        let mut conn = open_memory_database().unwrap();
        let id = fixtures::make_patient(&conn, "pat@example.com", "NSS-1");
        let data = payload(json!({ "weight": 80.0, "occupation": "Plumber" }));

        let once = update_patient_profile(&mut conn, &core(), id, &data).unwrap();
        let twice = update_patient_profile(&mut conn, &core(), id, &data).unwrap();
        assert_eq!(once.patient, twice.patient);
        assert_eq!(once.user, twice.user);
        assert_eq!(twice.patient.weight, 80.0);
    }

    #[test]
    fn null_fields_are_ignored() {
        let mut conn = open_memory_database().unwrap();
        let id = fixtures::make_patient(&conn, "pat@example.com", "NSS-1");
        let before = db::get_patient(&conn, id).unwrap().unwrap();
        let data = payload(json!({ "nss": null, "weight": null }));
        let after = update_patient_profile(&mut conn, &core(), id, &data).unwrap();
        assert_eq!(after.patient, before);
    }

    #[test]
    fn keeping_own_email_and_license_is_allowed() {
        let mut conn = open_memory_database().unwrap();
        let id = fixtures::make_doctor(&conn, "doc@example.com", "LIC-1");
        let data = payload(json!({
            "email": "doc@example.com",
            "professional_license": "LIC-1",
        }));
        update_doctor_profile(&mut conn, &core(), id, &data).unwrap();
    }

    #[test]
    fn taking_another_users_email_is_rejected() {
        let mut conn = open_memory_database().unwrap();
        fixtures::make_doctor(&conn, "first@example.com", "LIC-1");
        let id = fixtures::make_doctor(&conn, "second@example.com", "LIC-2");
        let data = payload(json!({ "email": "first@example.com" }));
        let err = update_doctor_profile(&mut conn, &core(), id, &data).unwrap_err();
        let errors = match err {
            AccountError::Invalid(errors) => errors,
            other => panic!("expected validation failure, got {other:?}"),
        };
        assert!(errors.contains_key("email"));
        let user = db::get_user(&conn, id).unwrap().unwrap();
        assert_eq!(user.email, "second@example.com");
    }

    #[test]
    fn password_change_is_hashed() {
        let mut conn = open_memory_database().unwrap();
        let id = fixtures::make_patient(&conn, "pat@example.com", "NSS-1");
        let data = payload(json!({ "password": "a-new-password" }));
        let profile = update_patient_profile(&mut conn, &core(), id, &data).unwrap();
        let stored = profile.user.password_hash.unwrap();
        assert!(crypto::verify_password("a-new-password", &stored).unwrap());
    }

    #[test]
    fn deleting_doctor_removes_profile_user_and_schedules() {
        let mut conn = open_memory_database().unwrap();
        let id = fixtures::make_doctor(&conn, "doc@example.com", "LIC-1");
        db::insert_schedule(
            &conn,
            &NewSchedule {
                doctor_id: id,
                start_time: None,
                end_time: None,
                day_of_week: crate::models::enums::DayOfWeek::Monday,
            },
        )
        .unwrap();

        delete_doctor_profile(&mut conn, id).unwrap();
        assert_eq!(count_rows(&conn, "doctors").unwrap(), 0);
        assert_eq!(count_rows(&conn, "users").unwrap(), 0);
        assert_eq!(count_rows(&conn, "schedules").unwrap(), 0);
    }

    #[test]
    fn deleting_missing_patient_is_not_found() {
        let mut conn = open_memory_database().unwrap();
        let id = db::insert_user(&conn, &fixtures::new_user("u@example.com", None)).unwrap();
        let err = delete_patient_profile(&mut conn, id).unwrap_err();
        assert!(matches!(err, AccountError::NotFound("Patient")));
        assert_eq!(count_rows(&conn, "users").unwrap(), 1);
    }

    #[test]
    fn admin_deletes_user_with_profile() {
        let mut conn = open_memory_database().unwrap();
        let id = fixtures::make_patient(&conn, "pat@example.com", "NSS-1");
        delete_user_account(&mut conn, id).unwrap();
        assert_eq!(count_rows(&conn, "patients").unwrap(), 0);
        assert_eq!(count_rows(&conn, "users").unwrap(), 0);

        let err = delete_user_account(&mut conn, id).unwrap_err();
        assert!(matches!(err, AccountError::NotFound("User")));
    }

    #[test]
    fn admin_update_keeps_role() {
        let mut conn = open_memory_database().unwrap();
        let id = db::insert_user(
            &conn,
            &fixtures::new_user("u@example.com", Some(Role::Patient)),
        )
        .unwrap();
        let user =
            update_user_account(&mut conn, &core(), id, &payload(json!({ "name": "Zed" })))
                .unwrap();
        assert_eq!(user.name, "Zed");
        assert_eq!(user.role, Some(Role::Patient));
    }
}
