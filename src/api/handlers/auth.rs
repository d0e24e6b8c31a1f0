//! Registration and login handlers.
//!
//! These sit on the public route prefix, so the gate never inspects their
//! requests; credential checking happens here through the authenticator.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::api::{ApiError, ErrorCode};
use crate::auth::{AuthError, NewPatient};
use crate::domain::{PatientId, ProfileUpdate};
use crate::metrics::metric_names;
use crate::server::AppState;

/// Minimum accepted password length.
const MIN_PASSWORD_CHARS: usize = 6;

/// Request body for `POST /api/v1/auth/register`
///
/// The optional profile fields (phone, bloodType, ...) ride along flattened
/// and land on the created record.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    #[serde(flatten)]
    pub profile: ProfileUpdate,
}

impl fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("name", &self.name)
            .field("last_name", &self.last_name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("profile", &self.profile)
            .finish()
    }
}

/// Request body for `POST /api/v1/auth/authenticate`
#[derive(Deserialize)]
pub struct AuthenticateRequest {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for AuthenticateRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthenticateRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Response for both auth endpoints: the account id plus a bearer token.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub patient_id: PatientId,
    pub token: String,
}

/// Register a new patient account.
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    require_field(&request.name, "name")?;
    require_field(&request.last_name, "lastName")?;
    require_field(&request.email, "email")?;
    require_field(&request.password, "password")?;

    if !request.email.contains('@') {
        return Err(ApiError::new(
            ErrorCode::InvalidFieldValue,
            "email is not a valid address",
        ));
    }
    if request.password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(ApiError::new(
            ErrorCode::InvalidFieldValue,
            format!("password must be at least {MIN_PASSWORD_CHARS} characters"),
        ));
    }

    let outcome = state
        .auth
        .register(NewPatient {
            email: request.email,
            password: request.password,
            name: request.name,
            last_name: request.last_name,
            profile: request.profile,
        })
        .await?;

    state.metrics.inc_counter(metric_names::REGISTRATIONS).await;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            patient_id: outcome.patient.id,
            token: outcome.token,
        }),
    ))
}

/// Authenticate an existing account and issue a fresh token.
pub async fn authenticate(
    State(state): State<AppState>,
    Json(request): Json<AuthenticateRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    require_field(&request.email, "email")?;
    require_field(&request.password, "password")?;

    match state
        .auth
        .authenticate(&request.email, &request.password)
        .await
    {
        Ok(outcome) => {
            state
                .metrics
                .inc_counter(metric_names::LOGINS_SUCCEEDED)
                .await;
            Ok(Json(AuthResponse {
                patient_id: outcome.patient.id,
                token: outcome.token,
            }))
        }
        Err(e @ AuthError::InvalidCredentials) => {
            state.metrics.inc_counter(metric_names::LOGINS_FAILED).await;
            Err(e.into())
        }
        Err(e) => Err(e.into()),
    }
}

fn require_field(value: &str, name: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::new(
            ErrorCode::MissingRequiredField,
            format!("{name} is required"),
        ));
    }
    Ok(())
}
