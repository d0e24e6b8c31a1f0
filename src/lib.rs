//! Clinic Records Library
//!
//! Multi-tenant clinic records backend: stateless bearer-token
//! authentication, patient accounts, and record access behind a
//! per-request gate.
//!
//! ## Modules
//!
//! - [`domain`] - Core domain types (patients, roles)
//! - [`infra`] - Infrastructure implementations (PostgreSQL, in-memory)
//! - [`auth`] - Authentication (token codec, authenticator, request gate)
//! - [`metrics`] - Observability and metrics
//! - [`api`] - REST API routes
//! - [`server`] - HTTP server bootstrap

pub mod api;
pub mod auth;
pub mod domain;
pub mod infra;
pub mod metrics;
pub mod server;

// Re-export commonly used types
pub use auth::{
    AuthError, AuthOutcome, AuthService, AuthenticatedUser, Claims, NewPatient, PublicRoutes,
    RequestIdentity, TokenCodec,
};
pub use domain::{Patient, PatientId, ProfileUpdate, Role};
pub use infra::{MemoryPatientStore, PatientStore, PgPatientStore, Result, StoreError};
