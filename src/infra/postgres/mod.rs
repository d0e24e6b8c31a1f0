//! PostgreSQL implementations for production storage

mod patients;

pub use patients::*;
