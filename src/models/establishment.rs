use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Address {
    pub id: i64,
    pub street: String,
    pub interior_number: Option<String>,
    pub exterior_number: String,
    pub neighborhood: String,
    pub zip_code: String,
    pub city: String,
    pub country: String,
}

#[derive(Debug, Clone)]
pub struct NewAddress {
    pub street: String,
    pub interior_number: Option<String>,
    pub exterior_number: String,
    pub neighborhood: String,
    pub zip_code: String,
    pub city: String,
    pub country: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AddressPatch {
    pub street: Option<String>,
    pub interior_number: Option<String>,
    pub exterior_number: Option<String>,
    pub neighborhood: Option<String>,
    pub zip_code: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
}

impl AddressPatch {
    pub fn apply(&self, address: &mut Address) {
        let set = |slot: &mut String, value: &Option<String>| {
            if let Some(v) = value {
                *slot = v.clone();
            }
        };
        set(&mut address.street, &self.street);
        set(&mut address.exterior_number, &self.exterior_number);
        set(&mut address.neighborhood, &self.neighborhood);
        set(&mut address.zip_code, &self.zip_code);
        set(&mut address.city, &self.city);
        set(&mut address.country, &self.country);
        if let Some(interior) = &self.interior_number {
            address.interior_number = Some(interior.clone());
        }
    }
}

/// Hospital, clinic or practice where doctors attend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Establishment {
    pub id: i64,
    pub establishment_name: String,
    pub establishment_type: String,
    pub website_url: Option<String>,
    pub address_id: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct NewEstablishment {
    pub establishment_name: String,
    pub establishment_type: String,
    pub website_url: Option<String>,
    pub address_id: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EstablishmentPatch {
    pub establishment_name: Option<String>,
    pub establishment_type: Option<String>,
    pub website_url: Option<String>,
    pub address_id: Option<i64>,
}

impl EstablishmentPatch {
    pub fn apply(&self, establishment: &mut Establishment) {
        if let Some(name) = &self.establishment_name {
            establishment.establishment_name = name.clone();
        }
        if let Some(kind) = &self.establishment_type {
            establishment.establishment_type = kind.clone();
        }
        if let Some(url) = &self.website_url {
            establishment.website_url = Some(url.clone());
        }
        if let Some(address_id) = self.address_id {
            establishment.address_id = Some(address_id);
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EstablishmentWithAddress {
    pub establishment: Establishment,
    pub address: Option<Address>,
}
