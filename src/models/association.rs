use serde::{Deserialize, Serialize};

use super::CatalogKind;

/// What the target side of a link points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkTarget {
    Catalog(CatalogKind),
    Establishment,
}

/// Many-to-many links between a role profile and a catalog row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    DoctorSpecialty,
    DoctorEstablishment,
    AllergyPatient,
    DiseasePatient,
    MedicationPatient,
}

impl LinkKind {
    pub fn table(&self) -> &'static str {
        match self {
            Self::DoctorSpecialty => "doctor_specialty",
            Self::DoctorEstablishment => "doctor_establishment",
            Self::AllergyPatient => "allergy_patient",
            Self::DiseasePatient => "disease_patient",
            Self::MedicationPatient => "medication_patient",
        }
    }

    pub fn owner_column(&self) -> &'static str {
        match self {
            Self::DoctorSpecialty | Self::DoctorEstablishment => "doctor_user_id",
            _ => "patient_user_id",
        }
    }

    /// Profile table the owner id must exist in.
    pub fn owner_table(&self) -> &'static str {
        match self {
            Self::DoctorSpecialty | Self::DoctorEstablishment => "doctors",
            _ => "patients",
        }
    }

    pub fn target_column(&self) -> &'static str {
        match self {
            Self::DoctorSpecialty => "specialty_id",
            Self::DoctorEstablishment => "establishment_id",
            Self::AllergyPatient => "allergy_id",
            Self::DiseasePatient => "disease_id",
            Self::MedicationPatient => "medication_id",
        }
    }

    pub fn target(&self) -> LinkTarget {
        match self {
            Self::DoctorSpecialty => LinkTarget::Catalog(CatalogKind::Specialty),
            Self::DoctorEstablishment => LinkTarget::Establishment,
            Self::AllergyPatient => LinkTarget::Catalog(CatalogKind::Allergy),
            Self::DiseasePatient => LinkTarget::Catalog(CatalogKind::Disease),
            Self::MedicationPatient => LinkTarget::Catalog(CatalogKind::Medication),
        }
    }

    pub fn target_table(&self) -> &'static str {
        match self.target() {
            LinkTarget::Catalog(kind) => kind.table(),
            LinkTarget::Establishment => "establishments",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::DoctorSpecialty => "DoctorSpecialty",
            Self::DoctorEstablishment => "DoctorEstablishment",
            Self::AllergyPatient => "AllergyPatient",
            Self::DiseasePatient => "DiseasePatient",
            Self::MedicationPatient => "MedicationPatient",
        }
    }
}

/// One join row: owner profile id + target id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Association {
    pub id: i64,
    pub owner_id: i64,
    pub target_id: i64,
}

/// Re-point a link at another target. The owner never changes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssociationPatch {
    pub target_id: Option<i64>,
}

impl AssociationPatch {
    pub fn apply(&self, association: &mut Association) {
        if let Some(target_id) = self.target_id {
            association.target_id = target_id;
        }
    }
}
