//! Authorization helper functions for REST API handlers.
//!
//! The gate only authenticates; these helpers are the access decision.
//! Handlers pull the identity out of request extensions and state their own
//! requirement (logged in, admin, owner-or-admin).

use axum::Extension;

use crate::api::{ApiError, ErrorCode};
use crate::auth::{AuthenticatedUser, RequestIdentity};
use crate::domain::PatientId;

/// Resolve the authenticated user attached by the request gate.
///
/// Rejects both an anonymous identity and a missing one. The latter means
/// the route was reached without passing the gate at all (a wiring mistake),
/// which must fail closed rather than proceed.
pub fn require_user(
    identity: Option<Extension<RequestIdentity>>,
) -> Result<AuthenticatedUser, ApiError> {
    identity
        .and_then(|Extension(identity)| identity.user)
        .ok_or_else(|| ApiError::new(ErrorCode::AuthRequired, "authentication required"))
}

/// Ensure the caller holds the admin role.
pub fn ensure_admin(user: &AuthenticatedUser) -> Result<(), ApiError> {
    if !user.is_admin() {
        return Err(ApiError::new(
            ErrorCode::InsufficientPermissions,
            "admin role required",
        ));
    }
    Ok(())
}

/// Ensure the caller owns the record or holds the admin role.
pub fn ensure_self_or_admin(
    user: &AuthenticatedUser,
    patient_id: &PatientId,
) -> Result<(), ApiError> {
    if !user.can_access_patient(patient_id) {
        return Err(ApiError::new(
            ErrorCode::InsufficientPermissions,
            "access limited to own record",
        ));
    }
    Ok(())
}
