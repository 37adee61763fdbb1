use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::enums::AppointmentStatus;
use super::{Doctor, Patient, SummaryWithMedicines};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    pub id: i64,
    pub doctor_id: i64,
    pub patient_id: i64,
    pub appointment_datetime: NaiveDateTime,
    pub link: Option<String>,
    pub status: AppointmentStatus,
    pub reason: String,
    pub consultation_cost: f64,
}

#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub doctor_id: i64,
    pub patient_id: i64,
    pub appointment_datetime: NaiveDateTime,
    pub link: Option<String>,
    pub status: AppointmentStatus,
    pub reason: String,
    pub consultation_cost: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppointmentPatch {
    pub doctor_id: Option<i64>,
    pub patient_id: Option<i64>,
    pub appointment_datetime: Option<NaiveDateTime>,
    pub link: Option<String>,
    pub status: Option<AppointmentStatus>,
    pub reason: Option<String>,
    pub consultation_cost: Option<f64>,
}

impl AppointmentPatch {
    pub fn apply(&self, appt: &mut Appointment) {
        if let Some(doctor_id) = self.doctor_id {
            appt.doctor_id = doctor_id;
        }
        if let Some(patient_id) = self.patient_id {
            appt.patient_id = patient_id;
        }
        if let Some(at) = self.appointment_datetime {
            appt.appointment_datetime = at;
        }
        if let Some(link) = &self.link {
            appt.link = Some(link.clone());
        }
        if let Some(status) = self.status {
            appt.status = status;
        }
        if let Some(reason) = &self.reason {
            appt.reason = reason.clone();
        }
        if let Some(cost) = self.consultation_cost {
            appt.consultation_cost = cost;
        }
    }
}

/// Appointment plus both parties and its summary, if one was written.
#[derive(Debug, Clone)]
pub struct AppointmentDetail {
    pub appointment: Appointment,
    pub doctor: Option<Doctor>,
    pub patient: Option<Patient>,
    pub summary: Option<SummaryWithMedicines>,
}
