pub mod config;
pub mod database;
pub mod errors;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod model_client;
pub mod models;
pub mod passwords;
pub mod repository;
pub mod validation;

// Re-exports for convenience
pub use errors::{ApiError, Result};
pub use repository::{AnalysisRepository, PgRepository, UserRepository};
