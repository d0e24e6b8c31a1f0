//! Authentication and authorization for the clinic records backend
//!
//! The pipeline is stateless: a signed bearer token is issued at login and
//! every later request is authenticated from the token alone, with no
//! server-side session record.
//!
//! # Components
//!
//! - **Token codec** (`token`): signs a claim set into an opaque HS256 token
//!   and verifies tokens back into claims
//! - **Credential verifier** (`password`): one-way Argon2 hashing and
//!   constant-cost verification
//! - **Authenticator** (`service`): registration and login orchestration
//! - **Request gate** (`middleware`): per-request filter that reconstructs
//!   the authenticated identity and attaches it to the request
//!
//! # Configuration
//!
//! - `JWT_SECRET`: HMAC signing key (hex-encoded or raw, at least 32 bytes)
//! - `JWT_TTL_HOURS`: token validity window (default 24)
//! - `PUBLIC_ROUTE_PREFIXES`: path prefixes exempt from token inspection

pub mod middleware;
pub mod password;
pub mod service;
pub mod token;

pub use middleware::{auth_gate, AuthGateState, PublicRoutes};
pub use service::{AuthOutcome, AuthService, NewPatient};
pub use token::{Claims, TokenCodec};

use std::net::SocketAddr;

use crate::domain::{Patient, PatientId, Role};

/// Request-scoped view of an authenticated principal.
///
/// Deliberately separate from the persisted [`Patient`] record: this is the
/// security context handlers reason about, and it never carries the
/// credential hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub patient_id: PatientId,
    pub email: String,
    pub role: Role,
}

impl AuthenticatedUser {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Whether this user may act on the given patient record.
    pub fn can_access_patient(&self, patient_id: &PatientId) -> bool {
        self.is_admin() || self.patient_id == *patient_id
    }
}

impl From<&Patient> for AuthenticatedUser {
    fn from(patient: &Patient) -> Self {
        Self {
            patient_id: patient.id,
            email: patient.email.clone(),
            role: patient.role,
        }
    }
}

/// Auxiliary request metadata captured by the gate for audit use.
#[derive(Debug, Clone, Default)]
pub struct RequestMeta {
    /// Peer address, when the server exposes connect info.
    pub remote_addr: Option<SocketAddr>,
}

/// Identity attached to a request's extensions by the gate.
///
/// Present on every gated request: `user` is `None` for anonymous requests
/// so that the access decision stays with the handlers, not the gate.
#[derive(Debug, Clone)]
pub struct RequestIdentity {
    pub user: Option<AuthenticatedUser>,
    pub meta: RequestMeta,
}

impl RequestIdentity {
    pub fn anonymous(meta: RequestMeta) -> Self {
        Self { user: None, meta }
    }

    pub fn authenticated(user: AuthenticatedUser, meta: RequestMeta) -> Self {
        Self {
            user: Some(user),
            meta,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.meta.remote_addr
    }
}

/// Authentication error
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("missing authentication")]
    MissingAuth,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("duplicate login: {0}")]
    DuplicateLogin(String),

    #[error("malformed token: {0}")]
    MalformedToken(String),

    #[error("invalid token signature")]
    InvalidSignature,

    #[error("token expired")]
    TokenExpired,

    #[error("principal not found: {0}")]
    PrincipalNotFound(String),

    #[error("insufficient permissions")]
    InsufficientPermissions,

    #[error("signing key too short: {0} bytes")]
    KeyTooShort(usize),

    #[error("token issue failed: {0}")]
    Issue(String),

    #[error("credential hash error: {0}")]
    Hash(String),

    #[error("store error: {0}")]
    Store(#[from] crate::infra::StoreError),
}
