//! API layer for the clinic records service
//!
//! REST endpoints for account auth, patient records, and operational probes.

pub mod auth_helpers;
mod error;
pub mod handlers;
mod rest;

pub use error::{ApiError, ErrorCode};
pub use rest::*;
