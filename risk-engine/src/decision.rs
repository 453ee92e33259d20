//! Classification boundary
//!
//! Turns a [`ScoreResult`] into the prediction reported to callers: the
//! probability rounded to 4 places and a binary label.

use crate::types::{round_to, Contribution, ScoreResult};
use crate::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Model identifier reported alongside heuristic predictions
pub const MODEL_TYPE: &str = "heuristic-v1";

/// Default fraud threshold
pub const DEFAULT_THRESHOLD: f64 = 0.5;

/// Decimal places of the reported probability
pub const PROBABILITY_PLACES: usize = 4;

/// Fraud threshold in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Threshold(f64);

impl Threshold {
    /// Create a threshold, rejecting values outside [0, 1]
    pub fn new(value: f64) -> Result<Self> {
        if (0.0..=1.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(Error::InvalidThreshold(value))
        }
    }

    /// Raw threshold
    pub fn value(&self) -> f64 {
        self.0
    }

    /// Label a probability; fraud only when strictly above the threshold
    pub fn label(&self, probability: f64) -> FraudLabel {
        if probability > self.0 {
            FraudLabel::Fraud
        } else {
            FraudLabel::Legitimate
        }
    }

    /// Build the caller-facing prediction for a score
    pub fn classify(&self, result: ScoreResult) -> Prediction {
        let probability = result.score.clamp(0.0, 1.0);

        Prediction {
            fraud_probability: round_to(probability, PROBABILITY_PLACES),
            fraud_label: self.label(probability),
            explanations: result.contributions,
            threshold: *self,
            model_type: MODEL_TYPE.to_string(),
        }
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Self(DEFAULT_THRESHOLD)
    }
}

impl TryFrom<f64> for Threshold {
    type Error = Error;

    fn try_from(value: f64) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Threshold> for f64 {
    fn from(threshold: Threshold) -> Self {
        threshold.0
    }
}

/// Binary fraud decision, serialized as 0 or 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FraudLabel {
    /// Not fraud (0)
    Legitimate,
    /// Fraud (1)
    Fraud,
}

impl FraudLabel {
    /// Numeric label
    pub fn as_u8(&self) -> u8 {
        match self {
            FraudLabel::Legitimate => 0,
            FraudLabel::Fraud => 1,
        }
    }

    /// Check if fraud
    pub fn is_fraud(&self) -> bool {
        matches!(self, FraudLabel::Fraud)
    }
}

impl Serialize for FraudLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.as_u8())
    }
}

impl<'de> Deserialize<'de> for FraudLabel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        match u8::deserialize(deserializer)? {
            0 => Ok(FraudLabel::Legitimate),
            1 => Ok(FraudLabel::Fraud),
            other => Err(serde::de::Error::custom(format!(
                "fraud label must be 0 or 1, got {}",
                other
            ))),
        }
    }
}

/// Prediction reported to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Probability in [0, 1], rounded to 4 places
    pub fraud_probability: f64,

    /// Thresholded label
    pub fraud_label: FraudLabel,

    /// Triggered rules in evaluation order
    pub explanations: Vec<Contribution>,

    /// Threshold used for the label
    pub threshold: Threshold,

    /// Model identifier
    pub model_type: String,
}
