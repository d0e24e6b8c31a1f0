//! Patient records and authorization roles.
//!
//! `Patient` is the persisted principal: login identity, one-way hashed
//! credential, role, and the clinical profile fields. The request-scoped
//! authenticated view derived from it lives in the `auth` module.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Patient identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PatientId(pub Uuid);

impl PatientId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for PatientId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PatientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Authorization role, a closed set.
///
/// Serialized as `"PATIENT"` / `"ADMIN"` both in the database and on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Patient,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Patient => "PATIENT",
            Role::Admin => "ADMIN",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::Patient
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PATIENT" => Ok(Role::Patient),
            "ADMIN" => Ok(Role::Admin),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// Error for role strings outside the closed set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

/// Persisted patient record.
///
/// `password_hash` is a PHC-format string and deliberately has no serde
/// derive on this type; API responses are built from a separate DTO so the
/// hash can never leave the store boundary.
#[derive(Debug, Clone)]
pub struct Patient {
    pub id: PatientId,
    /// Login identifier, stored normalized (trimmed, lowercase). Unique.
    pub email: String,
    /// One-way hashed secret (PHC string).
    pub password_hash: String,
    pub role: Role,
    pub name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub gender: Option<String>,
    pub age: Option<i32>,
    pub weight: Option<f64>,
    pub height: Option<f64>,
    pub blood_type: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Patient {
    /// Create a new patient record with a fresh id and empty profile.
    pub fn new(
        email: impl Into<String>,
        password_hash: impl Into<String>,
        role: Role,
        name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        Self {
            id: PatientId::new(),
            email: email.into(),
            password_hash: password_hash.into(),
            role,
            name: name.into(),
            last_name: last_name.into(),
            phone: None,
            address: None,
            gender: None,
            age: None,
            weight: None,
            height: None,
            blood_type: None,
            created_at: Utc::now(),
        }
    }
}

/// Partial update of the mutable profile fields.
///
/// Identity fields (email, role, password hash) are not part of this set;
/// absent fields leave the stored value untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blood_type: Option<String>,
}

impl ProfileUpdate {
    /// Apply the present fields onto a patient record.
    pub fn apply(&self, patient: &mut Patient) {
        if let Some(phone) = &self.phone {
            patient.phone = Some(phone.clone());
        }
        if let Some(address) = &self.address {
            patient.address = Some(address.clone());
        }
        if let Some(gender) = &self.gender {
            patient.gender = Some(gender.clone());
        }
        if let Some(age) = self.age {
            patient.age = Some(age);
        }
        if let Some(weight) = self.weight {
            patient.weight = Some(weight);
        }
        if let Some(height) = self.height {
            patient.height = Some(height);
        }
        if let Some(blood_type) = &self.blood_type {
            patient.blood_type = Some(blood_type.clone());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.phone.is_none()
            && self.address.is_none()
            && self.gender.is_none()
            && self.age.is_none()
            && self.weight.is_none()
            && self.height.is_none()
            && self.blood_type.is_none()
    }
}
