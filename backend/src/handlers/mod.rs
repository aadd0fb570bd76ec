//! HTTP handlers for the Abattoir Management Platform

pub mod animal;
pub mod health;
pub mod history;
pub mod order;
pub mod stabulation;

pub use animal::*;
pub use health::*;
pub use history::*;
pub use order::*;
pub use stabulation::*;
