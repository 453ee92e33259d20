//! Property-based tests for scorer invariants
//!
//! - Boundedness: score always within [0, 1]
//! - Determinism: same input, same output
//! - Tier exclusivity: at most one amount and one velocity factor
//! - Rounding: anomaly to 3 places, reported probability to 4

use proptest::prelude::*;
use risk_engine::{
    BehavioralFeatures, Factor, FraudLabel, RiskScorer, Threshold, TransactionInput,
};

/// Strategy for generating amounts, biased around the tier boundaries
fn amount_strategy() -> impl Strategy<Value = f64> {
    prop_oneof![
        0.0f64..100_000.0,
        Just(50.0),
        Just(200.0),
        Just(1000.0),
        (0u32..3000).prop_map(|cents| cents as f64 / 2.0),
    ]
}

/// Strategy for generating sparse behavioral features
fn features_strategy() -> impl Strategy<Value = BehavioralFeatures> {
    prop::collection::vec((1usize..=28, -100.0f64..100.0), 0..28).prop_map(|entries| {
        entries
            .into_iter()
            .fold(BehavioralFeatures::new(), |features, (index, value)| {
                features.with(index, value)
            })
    })
}

/// Strategy for generating transactions
fn transaction_strategy() -> impl Strategy<Value = TransactionInput> {
    (
        amount_strategy(),
        prop::option::of(0u64..200_000),
        prop::option::of(any::<bool>()),
        prop::option::of(any::<bool>()),
        prop::option::of(0u32..20),
        prop::option::of(features_strategy()),
    )
        .prop_map(
            |(amount, time, card_present, country_mismatch, velocity_5m, v)| TransactionInput {
                amount,
                time,
                card_present,
                country_mismatch,
                velocity_5m,
                v,
            },
        )
}

fn is_rounded(value: f64, places: i32) -> bool {
    let scaled = value * 10f64.powi(places);
    (scaled - scaled.round()).abs() < 1e-6
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Property: Score is always within [0, 1]
    #[test]
    fn prop_score_bounded(tx in transaction_strategy()) {
        let result = RiskScorer::new().score(&tx);
        prop_assert!((0.0..=1.0).contains(&result.score));
    }

    /// Property: Scoring is a pure function
    #[test]
    fn prop_deterministic(tx in transaction_strategy()) {
        let scorer = RiskScorer::new();
        prop_assert_eq!(scorer.score(&tx), scorer.score(&tx));
        prop_assert_eq!(scorer.score(&tx), RiskScorer::new().score(&tx));
    }

    /// Property: Tiers never stack and no factor repeats
    #[test]
    fn prop_tiers_exclusive(tx in transaction_strategy()) {
        let result = RiskScorer::new().score(&tx);

        let amount_factors = result.contributions.iter().filter(|c| matches!(
            c.factor,
            Factor::AmountOver1000 | Factor::Amount200To1000 | Factor::Amount50To200
        )).count();
        let velocity_factors = result.contributions.iter().filter(|c| matches!(
            c.factor,
            Factor::VelocityAtLeast6 | Factor::Velocity3To5
        )).count();

        prop_assert!(amount_factors <= 1);
        prop_assert!(velocity_factors <= 1);
        prop_assert!(result.contributions.len() <= 5);
    }

    /// Property: Unclamped score is the sum of the reported contributions
    #[test]
    fn prop_score_is_clamped_sum(tx in transaction_strategy()) {
        let result = RiskScorer::new().score(&tx);
        let sum: f64 = result.contributions.iter().map(|c| c.contribution).sum();
        prop_assert_eq!(result.score, sum.clamp(0.0, 1.0));
    }

    /// Property: Absent optional fields never emit their factors
    #[test]
    fn prop_absent_fields_silent(amount in amount_strategy()) {
        let result = RiskScorer::new().score(&TransactionInput::with_amount(amount));

        prop_assert!(!result.has_factor(Factor::CardNotPresent));
        prop_assert!(!result.has_factor(Factor::CountryMismatch));
        prop_assert!(!result.has_factor(Factor::VelocityAtLeast6));
        prop_assert!(!result.has_factor(Factor::Velocity3To5));
        prop_assert!(!result.has_factor(Factor::PcaAnomaly));
    }

    /// Property: Anomaly contribution is positive, at most the weight, 3 places
    #[test]
    fn prop_anomaly_rounded(features in features_strategy()) {
        let tx = TransactionInput { v: Some(features), ..TransactionInput::with_amount(0.0) };

        if let Some(c) = RiskScorer::new().score(&tx).contribution_of(Factor::PcaAnomaly) {
            prop_assert!(c > 0.0 && c <= 0.3);
            prop_assert!(is_rounded(c, 3));
        }
    }

    /// Property: Reported probability has 4 places and the label follows it
    #[test]
    fn prop_prediction_consistent(tx in transaction_strategy()) {
        let result = RiskScorer::new().score(&tx);
        let score = result.score;
        let prediction = Threshold::default().classify(result);

        prop_assert!(is_rounded(prediction.fraud_probability, 4));
        prop_assert_eq!(prediction.fraud_label == FraudLabel::Fraud, score > 0.5);
    }
}
