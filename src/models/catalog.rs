use serde::{Deserialize, Serialize};

/// The four name+description catalogs. They only differ by table and
/// by the name column, so they share one row type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogKind {
    Specialty,
    Allergy,
    Disease,
    Medication,
}

impl CatalogKind {
    pub fn table(&self) -> &'static str {
        match self {
            Self::Specialty => "specialties",
            Self::Allergy => "allergies",
            Self::Disease => "diseases",
            Self::Medication => "medications",
        }
    }

    /// Column (and JSON field) holding the entry's name.
    pub fn name_column(&self) -> &'static str {
        match self {
            Self::Specialty => "specialty_name",
            Self::Allergy => "allergy_name",
            Self::Disease => "disease_name",
            Self::Medication => "medication_name",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Specialty => "Specialty",
            Self::Allergy => "Allergy",
            Self::Disease => "Disease",
            Self::Medication => "Medication",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogEntry {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewCatalogEntry {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogPatch {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl CatalogPatch {
    pub fn apply(&self, entry: &mut CatalogEntry) {
        if let Some(name) = &self.name {
            entry.name = name.clone();
        }
        if let Some(description) = &self.description {
            entry.description = Some(description.clone());
        }
    }
}
