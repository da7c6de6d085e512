use proptest::prelude::*;

use clausewise_core::{
    clamp_score, performance_grade, risk_points, weighted_average, ComplianceStatus,
    ConfidenceLevel, RiskLevel, WeightedSample, COMPLIANCE_EMPTY_SCORE, RISK_EMPTY_SCORE,
};

proptest! {
    #[test]
    fn weighted_average_is_bounded(samples in sample_vec()) {
        let score = weighted_average(&samples, COMPLIANCE_EMPTY_SCORE);
        prop_assert!((0.0..=100.0).contains(&score));
    }

    #[test]
    fn risk_points_are_bounded(
        risks in 0usize..50,
        protections in 0usize..50,
        missing in 0usize..50,
    ) {
        let score = risk_points(risks, protections, missing);
        prop_assert!((0.0..=100.0).contains(&score));
    }

    #[test]
    fn risk_points_grow_with_risks(risks in 0usize..6, protections in 0usize..6) {
        let lower = risk_points(risks, protections, 0);
        let higher = risk_points(risks + 1, protections, 0);
        prop_assert!(higher >= lower);
    }

    #[test]
    fn classification_is_total(score in 0.0f32..=100.0) {
        // Every in-range score maps to exactly one label per table.
        let _ = ConfidenceLevel::from_score(score);
        let _ = ComplianceStatus::from_score(score);
        let _ = RiskLevel::from_score(score);
        prop_assert!(!performance_grade(score).is_empty());
    }

    #[test]
    fn classification_is_monotonic(a in 0.0f32..=100.0, b in 0.0f32..=100.0) {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(ConfidenceLevel::from_score(low) <= ConfidenceLevel::from_score(high));
        prop_assert!(RiskLevel::from_score(low) <= RiskLevel::from_score(high));
    }

    #[test]
    fn clamp_never_leaves_range(raw in -1.0e6f32..1.0e6) {
        let clamped = clamp_score(raw);
        prop_assert!((0.0..=100.0).contains(&clamped));
    }
}

#[test]
fn empty_inputs_use_variant_defaults() {
    assert_eq!(weighted_average(&[], COMPLIANCE_EMPTY_SCORE), 100.0);
    assert_eq!(weighted_average(&[], RISK_EMPTY_SCORE), 0.0);
    assert_eq!(risk_points(0, 0, 0), 0.0);
}

fn sample_vec() -> impl Strategy<Value = Vec<WeightedSample>> {
    prop::collection::vec(
        (0.0f32..=100.0, 0.0f32..=10.0).prop_map(|(score, weight)| WeightedSample::new(score, weight)),
        0..20,
    )
}
