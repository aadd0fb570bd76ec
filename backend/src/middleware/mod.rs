//! HTTP middleware for the Abattoir Management Platform

pub mod auth;

pub use auth::{auth_middleware, check_permission, AuthUser, CurrentUser};
