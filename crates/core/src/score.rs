use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::classify::ConfidenceLevel;
use crate::error::{AnalysisError, Result};
use crate::finding::{Finding, Severity};
use crate::weights::WeightTable;

// Contractual point values for the contract risk model. Kept bit-exact for
// compatibility with downstream consumers.
pub const RISK_FINDING_POINTS: f32 = 15.0;
pub const PROTECTION_POINTS: f32 = 5.0;
pub const MISSING_CLAUSE_POINTS: f32 = 10.0;

pub const COMPLIANCE_EMPTY_SCORE: f32 = 100.0;
pub const RISK_EMPTY_SCORE: f32 = 0.0;

const ON_TIME_WEIGHT: f32 = 0.25;
const QUALITY_WEIGHT: f32 = 0.25;
const RESPONSE_WEIGHT: f32 = 0.15;
const COST_WEIGHT: f32 = 0.15;
const COMPLIANCE_WEIGHT: f32 = 0.20;

pub fn clamp_score(score: f32) -> f32 {
    if !score.is_finite() {
        return 0.0;
    }
    score.clamp(0.0, 100.0)
}

/// Per-finding contribution to an aggregate:
/// `base_weight(category) * severity_multiplier * confidence`.
pub fn contribution(finding: &Finding, weights: &WeightTable) -> f32 {
    weights.weight(finding.category) * finding.severity.multiplier() * finding.confidence
}

/// Per-finding penalty for the vendor overall score.
pub fn severity_penalty(severity: Severity) -> f32 {
    match severity {
        Severity::Critical => 10.0,
        Severity::High => 5.0,
        Severity::Medium => 2.0,
        Severity::Low => 0.0,
    }
}

#[derive(Debug, Clone, Copy)]
pub struct WeightedSample {
    pub score: f32,
    pub weight: f32,
}

impl WeightedSample {
    pub fn new(score: f32, weight: f32) -> Self {
        Self { score, weight }
    }
}

/// `sum(score_i * weight_i) / sum(weight_i)`, total over every input.
/// Zero total weight (including the empty list) yields `empty_default`.
pub fn weighted_average(samples: &[WeightedSample], empty_default: f32) -> f32 {
    let total_weight: f32 = samples.iter().map(|s| s.weight.max(0.0)).sum();
    if total_weight <= 0.0 {
        return clamp_score(empty_default);
    }
    let total: f32 = samples
        .iter()
        .map(|s| clamp_score(s.score) * s.weight.max(0.0))
        .sum();
    clamp_score(total / total_weight)
}

/// Heuristic point model for contract risk:
/// `risks*15 - protections*5 + missing_clauses*10`, clamped to [0, 100].
pub fn risk_points(risks: usize, protections: usize, missing_clauses: usize) -> f32 {
    let raw = risks as f32 * RISK_FINDING_POINTS - protections as f32 * PROTECTION_POINTS
        + missing_clauses as f32 * MISSING_CLAUSE_POINTS;
    clamp_score(raw)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VendorMetrics {
    pub on_time_delivery: f32,
    pub quality: f32,
    pub response_time: f32,
    pub cost_efficiency: f32,
    pub compliance: f32,
}

impl VendorMetrics {
    pub fn validate(&self) -> Result<()> {
        for (name, value) in self.named() {
            if !value.is_finite() || !(0.0..=100.0).contains(&value) {
                return Err(AnalysisError::Validation(format!(
                    "vendor metric {name} must be within 0-100"
                )));
            }
        }
        Ok(())
    }

    pub fn named(&self) -> [(&'static str, f32); 5] {
        [
            ("on_time_delivery", self.on_time_delivery),
            ("quality", self.quality),
            ("response_time", self.response_time),
            ("cost_efficiency", self.cost_efficiency),
            ("compliance", self.compliance),
        ]
    }

    /// Metric baseline with the fixed weights 0.25/0.25/0.15/0.15/0.20.
    pub fn baseline(&self) -> f32 {
        self.on_time_delivery * ON_TIME_WEIGHT
            + self.quality * QUALITY_WEIGHT
            + self.response_time * RESPONSE_WEIGHT
            + self.cost_efficiency * COST_WEIGHT
            + self.compliance * COMPLIANCE_WEIGHT
    }
}

/// Vendor overall score: metric baseline minus per-finding risk penalties,
/// clamped to [0, 100].
pub fn vendor_overall(metrics: &VendorMetrics, findings: &[Finding]) -> f32 {
    let penalty: f32 = findings.iter().map(|f| severity_penalty(f.severity)).sum();
    clamp_score(metrics.baseline() - penalty)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreResult {
    pub total_score: f32,
    pub component_scores: IndexMap<String, f32>,
    pub confidence: ConfidenceLevel,
}

impl ScoreResult {
    pub fn new(
        total_score: f32,
        component_scores: IndexMap<String, f32>,
        confidence: ConfidenceLevel,
    ) -> Result<Self> {
        if !total_score.is_finite() || !(0.0..=100.0).contains(&total_score) {
            return Err(AnalysisError::Aggregation("total score out of range"));
        }
        Ok(Self {
            total_score,
            component_scores,
            confidence,
        })
    }
}

/// Discrete confidence derived from evidence volume: the mean per-finding
/// confidence scaled by how much evidence backs it, saturating at five
/// pieces. A degraded stage drops the result one band.
pub fn evidence_confidence(
    evidence_count: usize,
    mean_confidence: f32,
    degraded: bool,
) -> ConfidenceLevel {
    let volume = (evidence_count as f32 / 5.0).min(1.0);
    let score = clamp_score(mean_confidence.clamp(0.0, 1.0) * 100.0 * (0.5 + 0.5 * volume));
    let level = ConfidenceLevel::from_score(score);
    if degraded {
        level.degraded()
    } else {
        level
    }
}

pub fn mean_confidence(findings: &[Finding]) -> f32 {
    if findings.is_empty() {
        return 0.0;
    }
    findings.iter().map(|f| f.confidence).sum::<f32>() / findings.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::performance_grade;
    use crate::finding::Category;

    fn finding(severity: Severity) -> Finding {
        Finding::new(Category::Legal, severity, 1.0, "f")
    }

    #[test]
    fn weighted_average_of_empty_input_uses_default() {
        assert_eq!(weighted_average(&[], COMPLIANCE_EMPTY_SCORE), 100.0);
        assert_eq!(weighted_average(&[], RISK_EMPTY_SCORE), 0.0);
    }

    #[test]
    fn weighted_average_guards_zero_total_weight() {
        let samples = [WeightedSample::new(90.0, 0.0)];
        assert_eq!(weighted_average(&samples, 100.0), 100.0);
    }

    #[test]
    fn weighted_average_stays_in_range() {
        let samples = [
            WeightedSample::new(250.0, 1.0),
            WeightedSample::new(-40.0, 2.0),
        ];
        let score = weighted_average(&samples, 0.0);
        assert!((0.0..=100.0).contains(&score));
    }

    #[test]
    fn risk_points_formula_is_exact() {
        // 2 risks + 1 protection + 1 missing clause = 2*15 - 5 + 10 = 35.
        assert_eq!(risk_points(2, 1, 1), 35.0);
        assert_eq!(risk_points(0, 0, 0), 0.0);
        assert_eq!(risk_points(0, 4, 0), 0.0);
        assert_eq!(risk_points(20, 0, 0), 100.0);
    }

    #[test]
    fn contribution_multiplies_weight_severity_confidence() {
        let weights = WeightTable::from_pairs(&[(Category::Legal, 2.0)]);
        let f = Finding::new(Category::Legal, Severity::High, 0.5, "f");
        assert_eq!(contribution(&f, &weights), 2.0 * 2.0 * 0.5);
    }

    #[test]
    fn vendor_scenario_matches_reference() {
        let metrics = VendorMetrics {
            on_time_delivery: 90.0,
            quality: 85.0,
            response_time: 80.0,
            cost_efficiency: 75.0,
            compliance: 95.0,
        };
        assert!((metrics.baseline() - 85.5).abs() < 1e-4);
        let overall = vendor_overall(&metrics, &[finding(Severity::High)]);
        assert!((overall - 80.5).abs() < 1e-4);
        assert_eq!(performance_grade(overall), "B+");
    }

    #[test]
    fn vendor_penalties_clamp_at_zero() {
        let metrics = VendorMetrics {
            on_time_delivery: 10.0,
            quality: 10.0,
            response_time: 10.0,
            cost_efficiency: 10.0,
            compliance: 10.0,
        };
        let findings: Vec<Finding> = (0..5).map(|_| finding(Severity::Critical)).collect();
        assert_eq!(vendor_overall(&metrics, &findings), 0.0);
    }

    #[test]
    fn vendor_metrics_validation_rejects_out_of_range() {
        let metrics = VendorMetrics {
            on_time_delivery: 101.0,
            quality: 85.0,
            response_time: 80.0,
            cost_efficiency: 75.0,
            compliance: 95.0,
        };
        assert!(metrics.validate().is_err());
    }

    #[test]
    fn score_result_rejects_out_of_range_totals() {
        let result = ScoreResult::new(
            f32::NAN,
            IndexMap::new(),
            ConfidenceLevel::Medium,
        );
        assert!(matches!(result, Err(AnalysisError::Aggregation(_))));
    }

    #[test]
    fn evidence_confidence_rises_with_volume() {
        let sparse = evidence_confidence(1, 0.9, false);
        let dense = evidence_confidence(10, 0.9, false);
        assert!(dense > sparse);
        assert_eq!(dense, ConfidenceLevel::VeryHigh);
    }

    #[test]
    fn degraded_stage_lowers_confidence() {
        let normal = evidence_confidence(10, 0.9, false);
        let degraded = evidence_confidence(10, 0.9, true);
        assert!(degraded < normal);
    }
}
