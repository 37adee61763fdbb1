//! Response shapes: one pure formatter per entity.
//!
//! Each takes the loaded entity (with whatever relations were fetched)
//! and returns the JSON object clients see. Temporal values use the
//! storage formats (`YYYY-MM-DD`, `HH:MM`, `YYYY-MM-DD HH:MM:SS`).

use serde_json::{json, Map, Value};

use crate::db::repository::{fmt_date, fmt_datetime, fmt_time};
use crate::models::*;

pub fn user(user: &User) -> Value {
    json!({
        "id": user.id,
        "role": user.role,
        "name": user.name,
        "last_name": user.last_name,
        "email": user.email,
        "phone": user.phone,
        "sex": user.sex,
        "age": user.age,
        "date_of_birth": fmt_date(user.date_of_birth),
        "link_photo": user.link_photo,
    })
}

/// Only what anonymous visitors may see of a doctor's user row.
fn public_user(user: &User) -> Value {
    json!({
        "name": user.name,
        "last_name": user.last_name,
        "link_photo": user.link_photo,
    })
}

pub fn catalog_entry(kind: CatalogKind, entry: &CatalogEntry) -> Value {
    let mut map = Map::new();
    map.insert("id".into(), entry.id.into());
    map.insert(kind.name_column().into(), entry.name.clone().into());
    map.insert("description".into(), json!(entry.description));
    Value::Object(map)
}

fn catalog_list(kind: CatalogKind, entries: &[CatalogEntry]) -> Vec<Value> {
    entries.iter().map(|e| catalog_entry(kind, e)).collect()
}

pub fn schedule(schedule: &Schedule) -> Value {
    json!({
        "id": schedule.id,
        "doctor_id": schedule.doctor_id,
        "start_time": fmt_time(schedule.start_time),
        "end_time": fmt_time(schedule.end_time),
        "day_of_week": schedule.day_of_week,
    })
}

pub fn address(address: &Address) -> Value {
    json!({
        "id": address.id,
        "street": address.street,
        "interior_number": address.interior_number,
        "exterior_number": address.exterior_number,
        "neighborhood": address.neighborhood,
        "zip_code": address.zip_code,
        "city": address.city,
        "country": address.country,
    })
}

pub fn establishment(item: &EstablishmentWithAddress) -> Value {
    let e = &item.establishment;
    json!({
        "id": e.id,
        "establishment_name": e.establishment_name,
        "establishment_type": e.establishment_type,
        "website_url": e.website_url,
        "address_id": e.address_id,
        "address": item.address.as_ref().map(address),
    })
}

fn doctor_fields(doctor: &Doctor) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("user_id".into(), doctor.user_id.into());
    map.insert(
        "professional_license".into(),
        doctor.professional_license.clone().into(),
    );
    map.insert("education".into(), doctor.education.clone().into());
    map.insert("consultation_cost".into(), json!(doctor.consultation_cost));
    map
}

fn doctor_relations(profile: &DoctorProfile, map: &mut Map<String, Value>) {
    map.insert(
        "specialties".into(),
        catalog_list(CatalogKind::Specialty, &profile.specialties).into(),
    );
    map.insert(
        "establishments".into(),
        profile.establishments.iter().map(establishment).collect(),
    );
    map.insert(
        "schedules".into(),
        profile.schedules.iter().map(schedule).collect(),
    );
}

pub fn doctor(profile: &DoctorProfile) -> Value {
    let mut map = doctor_fields(&profile.doctor);
    map.insert("personal_information".into(), user(&profile.user));
    doctor_relations(profile, &mut map);
    Value::Object(map)
}

/// Public directory entry: no contact details.
pub fn doctor_public(profile: &DoctorProfile) -> Value {
    let mut map = doctor_fields(&profile.doctor);
    map.insert("personal_information".into(), public_user(&profile.user));
    doctor_relations(profile, &mut map);
    Value::Object(map)
}

/// A bare doctor row, as embedded in appointments.
pub fn doctor_row(doctor: &Doctor) -> Value {
    Value::Object(doctor_fields(doctor))
}

pub fn patient_row(patient: &Patient) -> Value {
    json!({
        "user_id": patient.user_id,
        "weight": patient.weight,
        "height": patient.height,
        "nss": patient.nss,
        "occupation": patient.occupation,
        "blood_type": patient.blood_type,
        "emergency_contact_phone": patient.emergency_contact_phone,
    })
}

pub fn patient(profile: &PatientProfile) -> Value {
    let mut value = patient_row(&profile.patient);
    if let Value::Object(map) = &mut value {
        map.insert("personal_information".into(), user(&profile.user));
        map.insert(
            "allergies".into(),
            catalog_list(CatalogKind::Allergy, &profile.allergies).into(),
        );
        map.insert(
            "diseases".into(),
            catalog_list(CatalogKind::Disease, &profile.diseases).into(),
        );
        map.insert(
            "medications".into(),
            catalog_list(CatalogKind::Medication, &profile.medications).into(),
        );
    }
    value
}

pub fn medicine(medicine: &Medicine) -> Value {
    json!({
        "id": medicine.id,
        "summary_id": medicine.summary_id,
        "medicine_name": medicine.medicine_name,
        "dosage": medicine.dosage,
        "frequency": medicine.frequency,
        "duration": medicine.duration,
        "notes": medicine.notes,
    })
}

pub fn summary(item: &SummaryWithMedicines) -> Value {
    json!({
        "id": item.summary.id,
        "appointment_id": item.summary.appointment_id,
        "diagnosis": item.summary.diagnosis,
        "medicines": item.medicines.iter().map(medicine).collect::<Vec<_>>(),
    })
}

pub fn appointment(detail: &AppointmentDetail) -> Value {
    let a = &detail.appointment;
    json!({
        "id": a.id,
        "doctor_id": a.doctor_id,
        "patient_id": a.patient_id,
        "doctor": detail.doctor.as_ref().map(doctor_row),
        "patient": detail.patient.as_ref().map(patient_row),
        "appointment_datetime": fmt_datetime(a.appointment_datetime),
        "link": a.link,
        "status": a.status,
        "reason": a.reason,
        "consultation_cost": a.consultation_cost,
        "summary": detail.summary.as_ref().map(summary),
    })
}

pub fn association(link: LinkKind, association: &Association) -> Value {
    let mut map = Map::new();
    map.insert("id".into(), association.id.into());
    map.insert(link.owner_column().into(), association.owner_id.into());
    map.insert(link.target_column().into(), association.target_id.into());
    Value::Object(map)
}
