//! Error types for risk engine

use thiserror::Error;

/// Risk engine error
///
/// Scoring itself is total; errors only arise when building a scorer or a
/// classification boundary from caller-supplied configuration.
#[derive(Debug, Error, PartialEq)]
pub enum Error {
    /// Invalid scoring configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Classification threshold outside [0, 1]
    #[error("Invalid threshold: {0} (must be within [0, 1])")]
    InvalidThreshold(f64),
}

/// Result type
pub type Result<T> = std::result::Result<T, Error>;
