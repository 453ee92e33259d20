//! Risk Engine for transaction fraud scoring
//!
//! Deterministic, additive rule-based heuristic mapping a transaction to a
//! bounded fraud probability plus the factors that contributed to it.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod decision;
pub mod error;
pub mod features;
pub mod scoring;
pub mod types;

pub use decision::{FraudLabel, Prediction, Threshold, MODEL_TYPE};
pub use error::{Error, Result};
pub use features::BehavioralFeatures;
pub use scoring::{AmountTier, RiskScorer, ScoringConfig, VelocityTier};
pub use types::*;
