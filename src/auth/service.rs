//! Authenticator: registration and login on top of the patient store
//!
//! Login failures are deliberately indistinguishable. An unknown email and a
//! wrong password both come back as [`AuthError::InvalidCredentials`], and
//! the unknown-email path burns a dummy hash verification so the two cost
//! roughly the same wall-clock time.

use std::fmt;
use std::sync::Arc;

use crate::auth::{password, AuthError, TokenCodec};
use crate::domain::{Patient, ProfileUpdate, Role};
use crate::infra::{PatientStore, StoreError};

/// Registration input.
///
/// `Debug` redacts the password so request logging cannot leak it.
#[derive(Clone, Default)]
pub struct NewPatient {
    pub email: String,
    pub password: String,
    pub name: String,
    pub last_name: String,
    /// Optional profile fields captured at registration time.
    pub profile: ProfileUpdate,
}

impl fmt::Debug for NewPatient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewPatient")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("name", &self.name)
            .field("last_name", &self.last_name)
            .field("profile", &self.profile)
            .finish()
    }
}

/// Result of a successful registration or login.
#[derive(Debug, Clone)]
pub struct AuthOutcome {
    pub patient: Patient,
    pub token: String,
}

/// Registration and login orchestration.
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn PatientStore>,
    codec: Arc<TokenCodec>,
}

impl AuthService {
    pub fn new(store: Arc<dyn PatientStore>, codec: Arc<TokenCodec>) -> Self {
        Self { store, codec }
    }

    /// Register a new patient account and log it in.
    pub async fn register(&self, new_patient: NewPatient) -> Result<AuthOutcome, AuthError> {
        self.create_account(new_patient, Role::Patient).await
    }

    /// Create an account with an explicit role.
    ///
    /// Public registration always passes [`Role::Patient`]; the admin CLI is
    /// the only caller that passes [`Role::Admin`].
    pub async fn create_account(
        &self,
        new_patient: NewPatient,
        role: Role,
    ) -> Result<AuthOutcome, AuthError> {
        let email = normalize_email(&new_patient.email);
        let hash = password::hash_password(&new_patient.password)?;
        let mut patient =
            Patient::new(&email, &hash, role, &new_patient.name, &new_patient.last_name);
        new_patient.profile.apply(&mut patient);

        match self.store.insert(&patient).await {
            Ok(()) => {}
            Err(StoreError::DuplicateEmail(email)) => {
                return Err(AuthError::DuplicateLogin(email));
            }
            Err(e) => return Err(e.into()),
        }

        let token = self.codec.issue(&patient.email, patient.role)?;
        tracing::info!(patient_id = %patient.id, "registered new account");
        Ok(AuthOutcome { patient, token })
    }

    /// Authenticate an email/password pair and issue a fresh token.
    pub async fn authenticate(&self, email: &str, pass: &str) -> Result<AuthOutcome, AuthError> {
        let email = normalize_email(email);

        let patient = match self.store.find_by_email(&email).await? {
            Some(p) => p,
            None => {
                password::burn_dummy_verification(pass);
                return Err(AuthError::InvalidCredentials);
            }
        };

        if !password::verify_password(pass, &patient.password_hash) {
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.codec.issue(&patient.email, patient.role)?;
        Ok(AuthOutcome { patient, token })
    }

    /// Issue a token for an existing account without a password check.
    ///
    /// Operator tooling only; never reachable from the HTTP surface.
    pub async fn issue_token(&self, email: &str) -> Result<String, AuthError> {
        let email = normalize_email(email);
        let patient = self
            .store
            .find_by_email(&email)
            .await?
            .ok_or_else(|| AuthError::PrincipalNotFound(email.clone()))?;
        Ok(self.codec.issue(&patient.email, patient.role)?)
    }
}

/// Canonical account email form: trimmed, ASCII-lowercased.
fn normalize_email(raw: &str) -> String {
    raw.trim().to_ascii_lowercase()
}
