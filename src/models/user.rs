use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::enums::{Role, Sex};

/// Base account row. Doctor and patient profiles share its id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: i64,
    pub role: Option<Role>,
    pub name: String,
    pub last_name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub phone: Option<String>,
    pub sex: Option<Sex>,
    pub age: Option<u8>,
    pub date_of_birth: Option<NaiveDate>,
    pub link_photo: Option<String>,
    pub external_id: Option<String>,
    pub external_auth: Option<String>,
}

/// Fields for a new account. The role is never taken from the client.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub role: Option<Role>,
    pub name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: Option<String>,
    pub phone: Option<String>,
    pub sex: Option<Sex>,
    pub age: Option<u8>,
    pub date_of_birth: Option<NaiveDate>,
    pub link_photo: Option<String>,
    pub external_id: Option<String>,
    pub external_auth: Option<String>,
}

/// Partial update: `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserPatch {
    pub role: Option<Role>,
    pub name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub phone: Option<String>,
    pub sex: Option<Sex>,
    pub age: Option<u8>,
    pub date_of_birth: Option<NaiveDate>,
    pub link_photo: Option<String>,
}

impl UserPatch {
    pub fn apply(&self, user: &mut User) {
        if let Some(role) = self.role {
            user.role = Some(role);
        }
        if let Some(name) = &self.name {
            user.name = name.clone();
        }
        if let Some(last_name) = &self.last_name {
            user.last_name = last_name.clone();
        }
        if let Some(email) = &self.email {
            user.email = email.clone();
        }
        if let Some(hash) = &self.password_hash {
            user.password_hash = Some(hash.clone());
        }
        if let Some(phone) = &self.phone {
            user.phone = Some(phone.clone());
        }
        if let Some(sex) = self.sex {
            user.sex = Some(sex);
        }
        if let Some(age) = self.age {
            user.age = Some(age);
        }
        if let Some(dob) = self.date_of_birth {
            user.date_of_birth = Some(dob);
        }
        if let Some(photo) = &self.link_photo {
            user.link_photo = Some(photo.clone());
        }
    }
}
