//! Risk scoring engine

use crate::features::BehavioralFeatures;
use crate::types::{round_to, Contribution, Factor, ScoreResult, TransactionInput};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Rule weights and anomaly constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Weight for amounts above 1000
    pub amount_over_1000: f64,
    /// Weight for amounts in (200, 1000]
    pub amount_200_1000: f64,
    /// Weight for amounts in (50, 200]
    pub amount_50_200: f64,
    /// Weight for an explicit card-not-present flag
    pub card_not_present: f64,
    /// Weight for an explicit country mismatch
    pub country_mismatch: f64,
    /// Weight for six or more transactions in 5 minutes
    pub velocity_at_least_6: f64,
    /// Weight for three to five transactions in 5 minutes
    pub velocity_3_5: f64,
    /// Feature magnitude sum at which the anomaly saturates
    pub anomaly_divisor: f64,
    /// Weight applied to the saturated anomaly
    pub anomaly_weight: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            amount_over_1000: 0.45,
            amount_200_1000: 0.25,
            amount_50_200: 0.10,
            card_not_present: 0.25,
            country_mismatch: 0.20,
            velocity_at_least_6: 0.35,
            velocity_3_5: 0.20,
            anomaly_divisor: 50.0,
            anomaly_weight: 0.3,
        }
    }
}

impl ScoringConfig {
    /// Reject weights that are negative or non-finite and a non-positive divisor
    pub fn validate(&self) -> Result<()> {
        let weights = [
            ("amount_over_1000", self.amount_over_1000),
            ("amount_200_1000", self.amount_200_1000),
            ("amount_50_200", self.amount_50_200),
            ("card_not_present", self.card_not_present),
            ("country_mismatch", self.country_mismatch),
            ("velocity_at_least_6", self.velocity_at_least_6),
            ("velocity_3_5", self.velocity_3_5),
            ("anomaly_weight", self.anomaly_weight),
        ];

        for (name, weight) in weights {
            if !weight.is_finite() || weight < 0.0 {
                return Err(Error::InvalidConfig(format!(
                    "{} must be a finite non-negative number, got {}",
                    name, weight
                )));
            }
        }

        if !self.anomaly_divisor.is_finite() || self.anomaly_divisor <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "anomaly_divisor must be positive, got {}",
                self.anomaly_divisor
            )));
        }

        Ok(())
    }

    /// Weight of a factor
    pub fn weight(&self, factor: Factor) -> f64 {
        match factor {
            Factor::AmountOver1000 => self.amount_over_1000,
            Factor::Amount200To1000 => self.amount_200_1000,
            Factor::Amount50To200 => self.amount_50_200,
            Factor::CardNotPresent => self.card_not_present,
            Factor::CountryMismatch => self.country_mismatch,
            Factor::VelocityAtLeast6 => self.velocity_at_least_6,
            Factor::Velocity3To5 => self.velocity_3_5,
            Factor::PcaAnomaly => self.anomaly_weight,
        }
    }
}

/// Amount tier; the highest matching tier wins
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountTier {
    /// Above 1000
    High,
    /// Above 200, up to 1000
    Elevated,
    /// Above 50, up to 200
    Moderate,
    /// 50 or less
    Negligible,
}

impl AmountTier {
    /// Classify an amount
    pub fn classify(amount: f64) -> Self {
        match amount {
            a if a > 1000.0 => AmountTier::High,
            a if a > 200.0 => AmountTier::Elevated,
            a if a > 50.0 => AmountTier::Moderate,
            _ => AmountTier::Negligible,
        }
    }

    /// Factor emitted by this tier
    pub fn factor(self) -> Option<Factor> {
        match self {
            AmountTier::High => Some(Factor::AmountOver1000),
            AmountTier::Elevated => Some(Factor::Amount200To1000),
            AmountTier::Moderate => Some(Factor::Amount50To200),
            AmountTier::Negligible => None,
        }
    }
}

/// Velocity tier over the trailing 5-minute window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VelocityTier {
    /// Six or more
    Burst,
    /// Three to five
    Elevated,
    /// Fewer than three
    Normal,
}

impl VelocityTier {
    /// Classify a 5-minute transaction count
    pub fn classify(count: u32) -> Self {
        match count {
            6.. => VelocityTier::Burst,
            3..=5 => VelocityTier::Elevated,
            _ => VelocityTier::Normal,
        }
    }

    /// Factor emitted by this tier
    pub fn factor(self) -> Option<Factor> {
        match self {
            VelocityTier::Burst => Some(Factor::VelocityAtLeast6),
            VelocityTier::Elevated => Some(Factor::Velocity3To5),
            VelocityTier::Normal => None,
        }
    }
}

/// Risk scorer
///
/// Holds only immutable configuration; safe to share across threads.
#[derive(Debug, Clone, Default)]
pub struct RiskScorer {
    config: ScoringConfig,
}

impl RiskScorer {
    /// Create new risk scorer with the default weights
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a risk scorer with custom weights
    pub fn with_config(config: ScoringConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Active configuration
    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Score a transaction
    pub fn score(&self, tx: &TransactionInput) -> ScoreResult {
        let mut contributions = Vec::new();

        if let Some(factor) = AmountTier::classify(tx.amount).factor() {
            contributions.push(Contribution::new(factor, self.config.weight(factor)));
        }

        if tx.card_present == Some(false) {
            contributions.push(Contribution::new(
                Factor::CardNotPresent,
                self.config.card_not_present,
            ));
        }

        if tx.country_mismatch == Some(true) {
            contributions.push(Contribution::new(
                Factor::CountryMismatch,
                self.config.country_mismatch,
            ));
        }

        if let Some(factor) = tx
            .velocity_5m
            .and_then(|count| VelocityTier::classify(count).factor())
        {
            contributions.push(Contribution::new(factor, self.config.weight(factor)));
        }

        if let Some(anomaly) = tx.v.as_ref().and_then(|v| self.anomaly_contribution(v)) {
            contributions.push(Contribution::new(Factor::PcaAnomaly, anomaly));
        }

        let total: f64 = contributions.iter().map(|c| c.contribution).sum();

        ScoreResult {
            score: total.clamp(0.0, 1.0),
            contributions,
        }
    }

    /// Anomaly contribution rounded to 3 places; None when nothing to add
    fn anomaly_contribution(&self, features: &BehavioralFeatures) -> Option<f64> {
        if features.is_empty() {
            return None;
        }

        let anomaly = (features.absolute_sum() / self.config.anomaly_divisor).min(1.0);
        let contribution = round_to(self.config.anomaly_weight * anomaly, 3);

        (contribution > 0.0).then_some(contribution)
    }
}
