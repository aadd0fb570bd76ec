//! Shared types and models for the Abattoir Management Platform
//!
//! This crate contains the domain models, status enums, and pure
//! validation rules shared between the backend and other components of
//! the system.

pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
