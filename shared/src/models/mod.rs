//! Domain models for the Abattoir Management Platform

pub mod animal;
pub mod history;
pub mod order;
pub mod stabulation;

pub use animal::*;
pub use history::*;
pub use order::*;
pub use stabulation::*;
