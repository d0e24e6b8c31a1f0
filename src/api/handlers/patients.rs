//! Patient record handlers.
//!
//! All routes here sit behind the request gate. Record access is
//! owner-or-admin; the collection listing is admin only.

use axum::extract::{Extension, Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::auth_helpers::{ensure_admin, ensure_self_or_admin, require_user};
use crate::api::{ApiError, ErrorCode};
use crate::auth::RequestIdentity;
use crate::domain::{Patient, PatientId, ProfileUpdate, Role};
use crate::metrics::metric_names;
use crate::server::AppState;

/// Public view of a patient record.
///
/// Built from [`Patient`] field by field; the credential hash has no
/// counterpart here and cannot be serialized by accident.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientResponse {
    pub patient_id: PatientId,
    pub email: String,
    pub role: Role,
    pub name: String,
    pub last_name: String,
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
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<&Patient> for PatientResponse {
    fn from(patient: &Patient) -> Self {
        Self {
            patient_id: patient.id,
            email: patient.email.clone(),
            role: patient.role,
            name: patient.name.clone(),
            last_name: patient.last_name.clone(),
            phone: patient.phone.clone(),
            address: patient.address.clone(),
            gender: patient.gender.clone(),
            age: patient.age,
            weight: patient.weight,
            height: patient.height,
            blood_type: patient.blood_type.clone(),
            created_at: patient.created_at,
        }
    }
}

/// Fetch one patient record. Owner or admin.
pub async fn get_patient(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    identity: Option<Extension<RequestIdentity>>,
) -> Result<Json<PatientResponse>, ApiError> {
    let user = require_user(identity)?;
    let patient_id = PatientId::from_uuid(id);
    // Authorization runs before the lookup so a non-owner probing ids
    // cannot learn which ones exist.
    ensure_self_or_admin(&user, &patient_id)?;

    let patient = state
        .store
        .find_by_id(&patient_id)
        .await?
        .ok_or_else(|| ApiError::new(ErrorCode::PatientNotFound, "patient not found"))?;

    Ok(Json(PatientResponse::from(&patient)))
}

/// Partially update a patient's profile fields. Owner or admin.
///
/// Only profile fields are updatable here. Identity fields in the body
/// (email, role) have no mapping in [`ProfileUpdate`] and are ignored.
pub async fn update_patient(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    identity: Option<Extension<RequestIdentity>>,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<PatientResponse>, ApiError> {
    let user = require_user(identity)?;
    let patient_id = PatientId::from_uuid(id);
    ensure_self_or_admin(&user, &patient_id)?;

    let patient = state.store.update_profile(&patient_id, &update).await?;
    state
        .metrics
        .inc_counter(metric_names::PROFILE_UPDATES)
        .await;

    Ok(Json(PatientResponse::from(&patient)))
}

/// List all patient records. Admin only.
pub async fn list_patients(
    State(state): State<AppState>,
    identity: Option<Extension<RequestIdentity>>,
) -> Result<Json<Vec<PatientResponse>>, ApiError> {
    let user = require_user(identity)?;
    ensure_admin(&user)?;

    let patients = state.store.list().await?;
    Ok(Json(patients.iter().map(PatientResponse::from).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_omits_empty_profile_fields() {
        let patient = Patient::new("a@b.com", "hash", Role::Patient, "Ana", "Diaz");
        let json = serde_json::to_value(PatientResponse::from(&patient)).unwrap();

        assert_eq!(json["patientId"], patient.id.to_string());
        assert_eq!(json["lastName"], "Diaz");
        assert!(json.get("bloodType").is_none());
        assert!(json.get("phone").is_none());
    }

    #[test]
    fn test_response_never_carries_the_hash() {
        let patient = Patient::new("a@b.com", "s3cret-hash", Role::Patient, "Ana", "Diaz");
        let json = serde_json::to_string(&PatientResponse::from(&patient)).unwrap();
        assert!(!json.contains("s3cret-hash"));
    }

    #[test]
    fn test_populated_profile_serializes_camel_case() {
        let mut patient = Patient::new("a@b.com", "hash", Role::Patient, "Ana", "Diaz");
        patient.blood_type = Some("O+".to_string());
        patient.age = Some(44);

        let json = serde_json::to_value(PatientResponse::from(&patient)).unwrap();
        assert_eq!(json["bloodType"], "O+");
        assert_eq!(json["age"], 44);
    }
}
