//! Domain models for the clinic records backend.
//!
//! The persisted principal (`Patient`) and its closed role set live here.
//! Request-scoped security context types are derived from these in `auth`.

mod patient;

pub use patient::*;
