use serde::{Deserialize, Serialize};

use super::{CatalogEntry, User};

/// Patient profile, keyed by its user id (1:1 with `User`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    pub user_id: i64,
    pub weight: f64,
    pub height: f64,
    pub nss: String,
    pub occupation: Option<String>,
    pub blood_type: Option<String>,
    pub emergency_contact_phone: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatientPatch {
    pub weight: Option<f64>,
    pub height: Option<f64>,
    pub nss: Option<String>,
    pub occupation: Option<String>,
    pub blood_type: Option<String>,
    pub emergency_contact_phone: Option<String>,
}

impl PatientPatch {
    pub fn apply(&self, patient: &mut Patient) {
        if let Some(weight) = self.weight {
            patient.weight = weight;
        }
        if let Some(height) = self.height {
            patient.height = height;
        }
        if let Some(nss) = &self.nss {
            patient.nss = nss.clone();
        }
        if let Some(occupation) = &self.occupation {
            patient.occupation = Some(occupation.clone());
        }
        if let Some(blood_type) = &self.blood_type {
            patient.blood_type = Some(blood_type.clone());
        }
        if let Some(phone) = &self.emergency_contact_phone {
            patient.emergency_contact_phone = Some(phone.clone());
        }
    }
}

/// A patient with the clinical history the patient resource renders.
#[derive(Debug, Clone)]
pub struct PatientProfile {
    pub patient: Patient,
    pub user: User,
    pub allergies: Vec<CatalogEntry>,
    pub diseases: Vec<CatalogEntry>,
    pub medications: Vec<CatalogEntry>,
}
