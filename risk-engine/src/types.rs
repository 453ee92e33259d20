//! Core types for risk engine

use crate::features::BehavioralFeatures;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Transaction attributes consumed by the scorer
///
/// Callers guarantee `amount` is finite and non-negative. Optional flags are
/// tri-state: an absent value never triggers a rule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionInput {
    /// Transaction amount in currency units
    pub amount: f64,

    /// Seconds since a reference epoch (informational only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<u64>,

    /// Whether the card was physically present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_present: Option<bool>,

    /// Whether card country and transaction country differ
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_mismatch: Option<bool>,

    /// Transactions by the same actor in the preceding 5 minutes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub velocity_5m: Option<u32>,

    /// Anonymized behavioral features V1..V28
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub v: Option<BehavioralFeatures>,
}

impl TransactionInput {
    /// Create a transaction with only an amount set
    pub fn with_amount(amount: f64) -> Self {
        Self {
            amount,
            ..Self::default()
        }
    }
}

/// Named rule that can contribute to a score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Factor {
    /// Amount above 1000
    #[serde(rename = "amount_>1000")]
    AmountOver1000,
    /// Amount in (200, 1000]
    #[serde(rename = "amount_200_1000")]
    Amount200To1000,
    /// Amount in (50, 200]
    #[serde(rename = "amount_50_200")]
    Amount50To200,
    /// Card explicitly not present
    #[serde(rename = "card_not_present")]
    CardNotPresent,
    /// Country mismatch explicitly reported
    #[serde(rename = "country_mismatch")]
    CountryMismatch,
    /// Six or more transactions in 5 minutes
    #[serde(rename = "velocity_>=6")]
    VelocityAtLeast6,
    /// Three to five transactions in 5 minutes
    #[serde(rename = "velocity_3_5")]
    Velocity3To5,
    /// Behavioral feature magnitude anomaly
    #[serde(rename = "pca_anomaly")]
    PcaAnomaly,
}

impl Factor {
    /// Every factor in evaluation order
    pub const ALL: [Factor; 8] = [
        Factor::AmountOver1000,
        Factor::Amount200To1000,
        Factor::Amount50To200,
        Factor::CardNotPresent,
        Factor::CountryMismatch,
        Factor::VelocityAtLeast6,
        Factor::Velocity3To5,
        Factor::PcaAnomaly,
    ];

    /// Wire label of the factor
    pub fn label(&self) -> &'static str {
        match self {
            Factor::AmountOver1000 => "amount_>1000",
            Factor::Amount200To1000 => "amount_200_1000",
            Factor::Amount50To200 => "amount_50_200",
            Factor::CardNotPresent => "card_not_present",
            Factor::CountryMismatch => "country_mismatch",
            Factor::VelocityAtLeast6 => "velocity_>=6",
            Factor::Velocity3To5 => "velocity_3_5",
            Factor::PcaAnomaly => "pca_anomaly",
        }
    }
}

impl fmt::Display for Factor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A triggered rule and the amount it added to the score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    /// Rule that fired
    pub factor: Factor,
    /// Amount added to the aggregate score
    pub contribution: f64,
}

impl Contribution {
    /// Create new contribution
    pub fn new(factor: Factor, contribution: f64) -> Self {
        Self {
            factor,
            contribution,
        }
    }
}

/// Scorer output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    /// Clamped aggregate score in [0, 1]
    pub score: f64,

    /// Triggered rules in evaluation order
    pub contributions: Vec<Contribution>,
}

impl ScoreResult {
    /// Check whether a factor fired
    pub fn has_factor(&self, factor: Factor) -> bool {
        self.contributions.iter().any(|c| c.factor == factor)
    }

    /// Contribution of a factor, if it fired
    pub fn contribution_of(&self, factor: Factor) -> Option<f64> {
        self.contributions
            .iter()
            .find(|c| c.factor == factor)
            .map(|c| c.contribution)
    }
}

/// Digits needed to print any f64 fraction exactly
const EXACT_FRACTION_DIGITS: usize = 1100;

/// Round to a fixed number of decimal places
///
/// Rounds the exact stored binary value, so `0.0045` (stored just below the
/// halfway point) becomes `0.004`. Exact halfway values round away from zero.
pub fn round_to(value: f64, places: usize) -> f64 {
    if !value.is_finite() {
        return value;
    }

    let magnitude = value.abs();
    let nearest = || -> f64 {
        format!("{:.*}", places, magnitude)
            .parse()
            .unwrap_or(magnitude)
    };

    let exact = format!("{:.*}", EXACT_FRACTION_DIGITS, magnitude);
    let rounded = match exact.split_once('.') {
        Some((whole, fraction)) if places < EXACT_FRACTION_DIGITS => {
            let (kept, rest) = fraction.split_at(places);
            if is_exact_half(rest) {
                // Formatting breaks exact ties to even; step the kept digits up instead
                match format!("{}{}", whole, kept).parse::<u64>() {
                    Ok(units) => (units + 1) as f64 / 10f64.powi(places as i32),
                    Err(_) => nearest(),
                }
            } else {
                nearest()
            }
        }
        _ => nearest(),
    };

    rounded.copysign(value)
}

fn is_exact_half(digits: &str) -> bool {
    digits
        .strip_prefix('5')
        .map_or(false, |tail| tail.bytes().all(|b| b == b'0'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factor_labels_serialize() {
        let contribution = Contribution::new(Factor::VelocityAtLeast6, 0.35);
        let json = serde_json::to_value(contribution).unwrap();

        assert_eq!(json["factor"], "velocity_>=6");
        assert_eq!(json["contribution"], 0.35);
        assert_eq!(Factor::AmountOver1000.to_string(), "amount_>1000");
    }

    #[test]
    fn test_factor_label_matches_serde_name() {
        for factor in Factor::ALL {
            assert_eq!(
                serde_json::to_value(factor).unwrap(),
                serde_json::Value::from(factor.label())
            );
            let back: Factor = serde_json::from_value(factor.label().into()).unwrap();
            assert_eq!(back, factor);
        }
    }

    #[test]
    fn test_absent_flags_stay_absent() {
        let tx: TransactionInput = serde_json::from_str(r#"{"amount": 12.5}"#).unwrap();

        assert_eq!(tx.card_present, None);
        assert_eq!(tx.country_mismatch, None);
        assert_eq!(tx.velocity_5m, None);
        assert!(tx.v.is_none());

        let back = serde_json::to_value(&tx).unwrap();
        assert_eq!(back, serde_json::json!({"amount": 12.5}));
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(0.123456, 4), 0.1235);
        assert_eq!(round_to(0.0996, 3), 0.1);
        assert_eq!(round_to(1.0, 4), 1.0);
    }

    #[test]
    fn test_round_to_uses_stored_value() {
        // 0.3 * 0.75 / 50 is stored as 0.0044999...
        assert_eq!(round_to(0.3 * (0.75 / 50.0), 3), 0.004);
        assert_eq!(round_to(0.3 * (2.25 / 50.0), 3), 0.013);
        assert_eq!(round_to(0.3 * (3.75 / 50.0), 3), 0.022);
    }

    #[test]
    fn test_round_to_exact_halves_away_from_zero() {
        assert_eq!(round_to(0.125, 2), 0.13);
        assert_eq!(round_to(0.5, 0), 1.0);
        assert_eq!(round_to(2.5, 0), 3.0);
        assert_eq!(round_to(-0.125, 2), -0.13);
        assert_eq!(round_to(0.0, 3), 0.0);
    }
}
