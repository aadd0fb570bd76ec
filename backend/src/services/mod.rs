//! Business logic services for the Abattoir Management Platform

pub mod animal;
pub mod history;
pub mod order;
pub mod stabulation;

pub use animal::AnimalService;
pub use history::HistoryService;
pub use order::OrderService;
pub use stabulation::StabulationService;
