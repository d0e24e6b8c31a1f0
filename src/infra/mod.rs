//! Infrastructure layer for the clinic records backend
//!
//! Contains the patient store trait and its implementations:
//! - PostgreSQL (production)
//! - In-memory (tests, local development)

mod error;
mod memory;
pub mod postgres;
mod traits;

pub use error::*;
pub use memory::MemoryPatientStore;
pub use postgres::PgPatientStore;
pub use traits::*;
