pub mod api;
pub mod config;
pub mod constants;
pub mod core;
pub mod infrastructure;

pub use crate::core::errors::TripSplitError;
pub use crate::core::services::TripService;
pub use crate::infrastructure::{logging::in_memory::InMemoryLogging, storage::in_memory::InMemoryStorage};

#[cfg(test)]
mod tests;
