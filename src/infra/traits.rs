//! Trait definitions for the credential/patient store

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::domain::{Patient, PatientId, ProfileUpdate};

use super::Result;

/// Read/write interface over persisted patient records.
///
/// The authentication pipeline only ever reads through this trait; the single
/// write path is registration (plus the admin CLI). Email uniqueness is
/// enforced by the implementation.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait PatientStore: Send + Sync {
    /// Look up a patient by normalized email.
    async fn find_by_email(&self, email: &str) -> Result<Option<Patient>>;

    /// Look up a patient by id.
    async fn find_by_id(&self, id: &PatientId) -> Result<Option<Patient>>;

    /// Insert a new patient record.
    ///
    /// Fails with `StoreError::DuplicateEmail` if the email is taken.
    async fn insert(&self, patient: &Patient) -> Result<()>;

    /// Apply a partial profile update and return the updated record.
    ///
    /// Fails with `StoreError::PatientNotFound` for unknown ids.
    async fn update_profile(&self, id: &PatientId, update: &ProfileUpdate) -> Result<Patient>;

    /// List all patient records.
    async fn list(&self) -> Result<Vec<Patient>>;
}
