//! Per-entity rule sets.
//!
//! Each `*_fields` function validates one entity's fields into its patch
//! type. In create mode the caller turns the patch into a full row with
//! the matching `new_*` function once `Validator::finish` succeeded.

use rusqlite::Connection;

use super::{FieldErrors, Unique, ValidationError, Validator};
use crate::db::DatabaseError;
use crate::models::enums::{AppointmentStatus, DayOfWeek, Role, Sex};
use crate::models::*;

const NAME_MAX: usize = 255;
const PHONE_MAX: usize = 20;
const TEXT_MAX: usize = 65_535;
const PHOTO_MAX: usize = 2048;

const SEXES: &[&str] = &["male", "female", "other"];
const STATUSES: &[&str] = &["scheduled", "cancelled", "completed"];
const DAYS: &[&str] = &[
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

pub const PASSWORD_MIN: usize = 8;

/// Unwrap a field that create-mode validation already proved present.
fn present<T>(value: Option<T>, field: &str) -> Result<T, ValidationError> {
    value.ok_or_else(|| {
        let mut errors = FieldErrors::new();
        errors.insert(
            field.to_string(),
            vec![format!("The {} field is required.", field.replace('_', " "))],
        );
        ValidationError::Invalid(errors)
    })
}

// ═══════════════════════════════════════════════════════════
// Users
// ═══════════════════════════════════════════════════════════

/// Personal information shared by every registration and user update.
/// `password` is the plaintext, hashed by the caller.
#[derive(Debug, Clone, Default)]
pub struct PersonalInfo {
    pub name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub phone: Option<String>,
    pub sex: Option<Sex>,
    pub age: Option<u8>,
    pub date_of_birth: Option<chrono::NaiveDate>,
    pub link_photo: Option<String>,
}

impl PersonalInfo {
    pub fn into_new_user(
        self,
        role: Option<Role>,
        password_hash: String,
    ) -> Result<NewUser, ValidationError> {
        Ok(NewUser {
            role,
            name: present(self.name, "name")?,
            last_name: present(self.last_name, "last_name")?,
            email: present(self.email, "email")?,
            password_hash: Some(password_hash),
            phone: self.phone,
            sex: self.sex,
            age: self.age,
            date_of_birth: self.date_of_birth,
            link_photo: self.link_photo,
            external_id: None,
            external_auth: None,
        })
    }

    pub fn into_patch(self, password_hash: Option<String>) -> UserPatch {
        UserPatch {
            role: None,
            name: self.name,
            last_name: self.last_name,
            email: self.email,
            password_hash,
            phone: self.phone,
            sex: self.sex,
            age: self.age,
            date_of_birth: self.date_of_birth,
            link_photo: self.link_photo,
        }
    }
}

/// `ignore_user` exempts the caller's own row from the email uniqueness rule.
pub fn personal_info(
    v: &mut Validator<'_>,
    conn: &Connection,
    ignore_user: Option<i64>,
) -> Result<PersonalInfo, DatabaseError> {
    let info = PersonalInfo {
        name: v.required_string("name", NAME_MAX),
        last_name: v.required_string("last_name", NAME_MAX),
        email: v.required_email("email"),
        password: v.required_secret("password", PASSWORD_MIN),
        phone: v.required_string("phone", PHONE_MAX),
        sex: v.required_enum("sex", SEXES),
        age: v
            .required_integer("age", 0, i64::from(u8::MAX))
            .and_then(|n| u8::try_from(n).ok()),
        date_of_birth: v.required_date("date_of_birth"),
        link_photo: v.optional_string("link_photo", PHOTO_MAX),
    };
    v.unique(
        conn,
        "email",
        info.email.as_deref(),
        Unique {
            table: "users",
            column: "email",
            ignore: ignore_user.map(|id| ("id", id)),
        },
    )?;
    Ok(info)
}

/// Login credentials; only presence is checked.
pub fn credentials(v: &mut Validator<'_>) -> (Option<String>, Option<String>) {
    let email = v.required_string("email", NAME_MAX).map(|e| e.to_lowercase());
    let password = v.required_secret("password", 1);
    (email, password)
}

// ═══════════════════════════════════════════════════════════
// Role profiles
// ═══════════════════════════════════════════════════════════

pub fn doctor_fields(
    v: &mut Validator<'_>,
    conn: &Connection,
    ignore_user: Option<i64>,
) -> Result<DoctorPatch, DatabaseError> {
    let patch = DoctorPatch {
        professional_license: v.required_string("professional_license", NAME_MAX),
        education: v.required_string("education", NAME_MAX),
        consultation_cost: v.required_number("consultation_cost", 0.0),
    };
    v.unique(
        conn,
        "professional_license",
        patch.professional_license.as_deref(),
        Unique {
            table: "doctors",
            column: "professional_license",
            ignore: ignore_user.map(|id| ("user_id", id)),
        },
    )?;
    Ok(patch)
}

pub fn new_doctor(user_id: i64, patch: DoctorPatch) -> Result<Doctor, ValidationError> {
    Ok(Doctor {
        user_id,
        professional_license: present(patch.professional_license, "professional_license")?,
        education: present(patch.education, "education")?,
        consultation_cost: present(patch.consultation_cost, "consultation_cost")?,
    })
}

pub fn patient_fields(
    v: &mut Validator<'_>,
    conn: &Connection,
    ignore_user: Option<i64>,
) -> Result<PatientPatch, DatabaseError> {
    let patch = PatientPatch {
        weight: v.required_number("weight", 0.0),
        height: v.required_number("height", 0.0),
        nss: v.required_string("nss", NAME_MAX),
        occupation: v.optional_string("occupation", NAME_MAX),
        blood_type: v.optional_string("blood_type", NAME_MAX),
        emergency_contact_phone: v.optional_string("emergency_contact_phone", PHONE_MAX),
    };
    v.unique(
        conn,
        "nss",
        patch.nss.as_deref(),
        Unique {
            table: "patients",
            column: "nss",
            ignore: ignore_user.map(|id| ("user_id", id)),
        },
    )?;
    Ok(patch)
}

pub fn new_patient(user_id: i64, patch: PatientPatch) -> Result<Patient, ValidationError> {
    Ok(Patient {
        user_id,
        weight: present(patch.weight, "weight")?,
        height: present(patch.height, "height")?,
        nss: present(patch.nss, "nss")?,
        occupation: patch.occupation,
        blood_type: patch.blood_type,
        emergency_contact_phone: patch.emergency_contact_phone,
    })
}

// ═══════════════════════════════════════════════════════════
// Appointments, summaries, medicines
// ═══════════════════════════════════════════════════════════

pub fn appointment_fields(
    v: &mut Validator<'_>,
    conn: &Connection,
) -> Result<AppointmentPatch, DatabaseError> {
    let patch = AppointmentPatch {
        doctor_id: v.required_id("doctor_id"),
        patient_id: v.required_id("patient_id"),
        appointment_datetime: v.required_datetime("appointment_datetime"),
        link: v.optional_url("link"),
        status: v.required_enum::<AppointmentStatus>("status", STATUSES),
        reason: v.required_string("reason", TEXT_MAX),
        consultation_cost: v.required_number("consultation_cost", 0.0),
    };
    v.exists(conn, "doctor_id", patch.doctor_id, "doctors", "user_id")?;
    v.exists(conn, "patient_id", patch.patient_id, "patients", "user_id")?;
    Ok(patch)
}

pub fn new_appointment(patch: AppointmentPatch) -> Result<NewAppointment, ValidationError> {
    Ok(NewAppointment {
        doctor_id: present(patch.doctor_id, "doctor_id")?,
        patient_id: present(patch.patient_id, "patient_id")?,
        appointment_datetime: present(patch.appointment_datetime, "appointment_datetime")?,
        link: patch.link,
        status: present(patch.status, "status")?,
        reason: present(patch.reason, "reason")?,
        consultation_cost: present(patch.consultation_cost, "consultation_cost")?,
    })
}

pub fn summary_fields(
    v: &mut Validator<'_>,
    conn: &Connection,
) -> Result<SummaryPatch, DatabaseError> {
    let patch = SummaryPatch {
        appointment_id: v.required_id("appointment_id"),
        diagnosis: v.required_string("diagnosis", TEXT_MAX),
    };
    v.exists(conn, "appointment_id", patch.appointment_id, "appointments", "id")?;
    Ok(patch)
}

/// `(appointment_id, diagnosis)` of a new summary.
pub fn new_summary(patch: SummaryPatch) -> Result<(i64, String), ValidationError> {
    Ok((
        present(patch.appointment_id, "appointment_id")?,
        present(patch.diagnosis, "diagnosis")?,
    ))
}

pub fn medicine_fields(
    v: &mut Validator<'_>,
    conn: &Connection,
) -> Result<MedicinePatch, DatabaseError> {
    let patch = MedicinePatch {
        summary_id: v.required_id("summary_id"),
        medicine_name: v.required_string("medicine_name", NAME_MAX),
        dosage: v.required_string("dosage", NAME_MAX),
        frequency: v.required_string("frequency", NAME_MAX),
        duration: v.required_string("duration", NAME_MAX),
        notes: v.optional_string("notes", TEXT_MAX),
    };
    v.exists(conn, "summary_id", patch.summary_id, "summaries", "id")?;
    Ok(patch)
}

pub fn new_medicine(patch: MedicinePatch) -> Result<NewMedicine, ValidationError> {
    Ok(NewMedicine {
        summary_id: present(patch.summary_id, "summary_id")?,
        medicine_name: present(patch.medicine_name, "medicine_name")?,
        dosage: present(patch.dosage, "dosage")?,
        frequency: present(patch.frequency, "frequency")?,
        duration: present(patch.duration, "duration")?,
        notes: patch.notes,
    })
}

// ═══════════════════════════════════════════════════════════
// Schedules
// ═══════════════════════════════════════════════════════════

/// `current` is the stored row on update, so the end-after-start rule is
/// checked against the merged result.
pub fn schedule_fields(v: &mut Validator<'_>, current: Option<&Schedule>) -> SchedulePatch {
    let patch = SchedulePatch {
        start_time: v.required_time("start_time"),
        end_time: v.required_time("end_time"),
        day_of_week: v.required_choice("day_of_week", DAYS, DayOfWeek::parse_loose),
    };
    if v.has_error("start_time") || v.has_error("end_time") {
        return patch;
    }
    let start = patch.start_time.or(current.and_then(|s| s.start_time));
    let end = patch.end_time.or(current.and_then(|s| s.end_time));
    if let (Some(start), Some(end)) = (start, end) {
        if end <= start {
            v.add("end_time", "The end time field must be a date after start time.");
        }
    }
    patch
}

pub fn new_schedule(doctor_id: i64, patch: SchedulePatch) -> Result<NewSchedule, ValidationError> {
    Ok(NewSchedule {
        doctor_id,
        start_time: Some(present(patch.start_time, "start_time")?),
        end_time: Some(present(patch.end_time, "end_time")?),
        day_of_week: present(patch.day_of_week, "day_of_week")?,
    })
}

// ═══════════════════════════════════════════════════════════
// Catalogs, places, links
// ═══════════════════════════════════════════════════════════

pub fn catalog_fields(v: &mut Validator<'_>, kind: CatalogKind) -> CatalogPatch {
    CatalogPatch {
        name: v.required_string(kind.name_column(), NAME_MAX),
        description: v.optional_string("description", TEXT_MAX),
    }
}

pub fn new_catalog_entry(
    kind: CatalogKind,
    patch: CatalogPatch,
) -> Result<NewCatalogEntry, ValidationError> {
    Ok(NewCatalogEntry {
        name: present(patch.name, kind.name_column())?,
        description: patch.description,
    })
}

pub fn address_fields(v: &mut Validator<'_>) -> AddressPatch {
    AddressPatch {
        street: v.required_string("street", NAME_MAX),
        interior_number: v.optional_string("interior_number", PHONE_MAX),
        exterior_number: v.required_string("exterior_number", PHONE_MAX),
        neighborhood: v.required_string("neighborhood", NAME_MAX),
        zip_code: v.required_string("zip_code", PHONE_MAX),
        city: v.required_string("city", NAME_MAX),
        country: v.required_string("country", NAME_MAX),
    }
}

pub fn new_address(patch: AddressPatch) -> Result<NewAddress, ValidationError> {
    Ok(NewAddress {
        street: present(patch.street, "street")?,
        interior_number: patch.interior_number,
        exterior_number: present(patch.exterior_number, "exterior_number")?,
        neighborhood: present(patch.neighborhood, "neighborhood")?,
        zip_code: present(patch.zip_code, "zip_code")?,
        city: present(patch.city, "city")?,
        country: present(patch.country, "country")?,
    })
}

pub fn establishment_fields(
    v: &mut Validator<'_>,
    conn: &Connection,
) -> Result<EstablishmentPatch, DatabaseError> {
    let patch = EstablishmentPatch {
        establishment_name: v.required_string("establishment_name", NAME_MAX),
        establishment_type: v.required_string("establishment_type", NAME_MAX),
        website_url: v.optional_url("website_url"),
        address_id: v.optional_id("address_id"),
    };
    v.exists(conn, "address_id", patch.address_id, "addresses", "id")?;
    Ok(patch)
}

pub fn new_establishment(patch: EstablishmentPatch) -> Result<NewEstablishment, ValidationError> {
    Ok(NewEstablishment {
        establishment_name: present(patch.establishment_name, "establishment_name")?,
        establishment_type: present(patch.establishment_type, "establishment_type")?,
        website_url: patch.website_url,
        address_id: patch.address_id,
    })
}

/// Only the target side comes from the client; the owner is the caller.
pub fn association_fields(
    v: &mut Validator<'_>,
    conn: &Connection,
    link: LinkKind,
) -> Result<AssociationPatch, DatabaseError> {
    let field = link.target_column();
    let patch = AssociationPatch {
        target_id: v.required_id(field),
    };
    v.exists(conn, field, patch.target_id, link.target_table(), "id")?;
    Ok(patch)
}

pub fn association_target(patch: AssociationPatch, link: LinkKind) -> Result<i64, ValidationError> {
    present(patch.target_id, link.target_column())
}
