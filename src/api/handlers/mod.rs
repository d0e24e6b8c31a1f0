//! REST API handlers organized by domain.

pub mod auth;
pub mod health;
pub mod patients;

pub use auth::*;
pub use health::*;
pub use patients::*;
