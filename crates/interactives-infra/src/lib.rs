//! Interactives Infrastructure Library
//!
//! Shared infrastructure for the importer service:
//! - Telemetry initialization (tracing)
//! - Health checks over the service's collaborators

pub mod health;
pub mod telemetry;

// Re-export commonly used types
pub use health::{HealthRegistry, HealthReport};
pub use telemetry::init_telemetry;
