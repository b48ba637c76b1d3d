//! Project Domain
//!
//! Project tasks (`project.task`) linked to a customer.

pub mod model;
pub mod service;

pub use model::Task;
pub use service::ProjectService;
