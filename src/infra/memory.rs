//! In-memory patient store
//!
//! Backs local development and tests; production uses the PostgreSQL store.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::domain::{Patient, PatientId, ProfileUpdate};

use super::{PatientStore, Result, StoreError};

/// In-memory implementation of [`PatientStore`].
pub struct MemoryPatientStore {
    patients: RwLock<HashMap<PatientId, Patient>>,
}

impl MemoryPatientStore {
    pub fn new() -> Self {
        Self {
            patients: RwLock::new(HashMap::new()),
        }
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.patients.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryPatientStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PatientStore for MemoryPatientStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Patient>> {
        let patients = self.patients.read().unwrap();
        Ok(patients.values().find(|p| p.email == email).cloned())
    }

    async fn find_by_id(&self, id: &PatientId) -> Result<Option<Patient>> {
        let patients = self.patients.read().unwrap();
        Ok(patients.get(id).cloned())
    }

    async fn insert(&self, patient: &Patient) -> Result<()> {
        let mut patients = self.patients.write().unwrap();
        if patients.values().any(|p| p.email == patient.email) {
            return Err(StoreError::DuplicateEmail(patient.email.clone()));
        }
        patients.insert(patient.id, patient.clone());
        Ok(())
    }

    async fn update_profile(&self, id: &PatientId, update: &ProfileUpdate) -> Result<Patient> {
        let mut patients = self.patients.write().unwrap();
        let patient = patients
            .get_mut(id)
            .ok_or(StoreError::PatientNotFound(*id))?;
        update.apply(patient);
        Ok(patient.clone())
    }

    async fn list(&self) -> Result<Vec<Patient>> {
        let patients = self.patients.read().unwrap();
        let mut all: Vec<Patient> = patients.values().cloned().collect();
        all.sort_by(|a, b| (a.created_at, &a.email).cmp(&(b.created_at, &b.email)));
        Ok(all)
    }
}
