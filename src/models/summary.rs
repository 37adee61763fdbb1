use serde::{Deserialize, Serialize};

/// Post-consultation summary attached to an appointment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Summary {
    pub id: i64,
    pub appointment_id: i64,
    pub diagnosis: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SummaryPatch {
    pub appointment_id: Option<i64>,
    pub diagnosis: Option<String>,
}

impl SummaryPatch {
    pub fn apply(&self, summary: &mut Summary) {
        if let Some(appointment_id) = self.appointment_id {
            summary.appointment_id = appointment_id;
        }
        if let Some(diagnosis) = &self.diagnosis {
            summary.diagnosis = diagnosis.clone();
        }
    }
}

/// Prescribed medicine line of a summary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Medicine {
    pub id: i64,
    pub summary_id: i64,
    pub medicine_name: String,
    pub dosage: String,
    pub frequency: String,
    pub duration: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewMedicine {
    pub summary_id: i64,
    pub medicine_name: String,
    pub dosage: String,
    pub frequency: String,
    pub duration: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MedicinePatch {
    pub summary_id: Option<i64>,
    pub medicine_name: Option<String>,
    pub dosage: Option<String>,
    pub frequency: Option<String>,
    pub duration: Option<String>,
    pub notes: Option<String>,
}

impl MedicinePatch {
    pub fn apply(&self, medicine: &mut Medicine) {
        if let Some(summary_id) = self.summary_id {
            medicine.summary_id = summary_id;
        }
        if let Some(name) = &self.medicine_name {
            medicine.medicine_name = name.clone();
        }
        if let Some(dosage) = &self.dosage {
            medicine.dosage = dosage.clone();
        }
        if let Some(frequency) = &self.frequency {
            medicine.frequency = frequency.clone();
        }
        if let Some(duration) = &self.duration {
            medicine.duration = duration.clone();
        }
        if let Some(notes) = &self.notes {
            medicine.notes = Some(notes.clone());
        }
    }
}

#[derive(Debug, Clone)]
pub struct SummaryWithMedicines {
    pub summary: Summary,
    pub medicines: Vec<Medicine>,
}
