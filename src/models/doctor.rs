use serde::{Deserialize, Serialize};

use super::{CatalogEntry, EstablishmentWithAddress, Schedule, User};

/// Doctor profile, keyed by its user id (1:1 with `User`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Doctor {
    pub user_id: i64,
    pub professional_license: String,
    pub education: String,
    pub consultation_cost: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DoctorPatch {
    pub professional_license: Option<String>,
    pub education: Option<String>,
    pub consultation_cost: Option<f64>,
}

impl DoctorPatch {
    pub fn apply(&self, doctor: &mut Doctor) {
        if let Some(license) = &self.professional_license {
            doctor.professional_license = license.clone();
        }
        if let Some(education) = &self.education {
            doctor.education = education.clone();
        }
        if let Some(cost) = self.consultation_cost {
            doctor.consultation_cost = cost;
        }
    }
}

/// A doctor with every relation the doctor resources render.
#[derive(Debug, Clone)]
pub struct DoctorProfile {
    pub doctor: Doctor,
    pub user: User,
    pub specialties: Vec<CatalogEntry>,
    pub establishments: Vec<EstablishmentWithAddress>,
    pub schedules: Vec<Schedule>,
}
