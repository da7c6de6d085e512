use serde::{Deserialize, Serialize};

use crate::score::clamp_score;

/// Ordered (lower_bound, label) pairs covering [0, 100]. Bands are evaluated
/// top-down; the first band whose bound is <= score wins. The final bound
/// must be 0.0 so classification is total.
#[derive(Debug, Clone, Copy)]
pub struct BandTable {
    bands: &'static [(f32, &'static str)],
}

impl BandTable {
    pub const fn new(bands: &'static [(f32, &'static str)]) -> Self {
        Self { bands }
    }

    pub fn classify(&self, score: f32) -> &'static str {
        let score = clamp_score(score);
        for &(bound, label) in self.bands {
            if score >= bound {
                return label;
            }
        }
        // Unreachable for a total table; the last band catches 0.0.
        self.bands.last().map(|&(_, label)| label).unwrap_or("")
    }

    /// True when bounds strictly descend and the lowest bound is 0.0.
    pub fn is_total(&self) -> bool {
        if self.bands.last().map(|(bound, _)| *bound) != Some(0.0) {
            return false;
        }
        self.bands
            .windows(2)
            .all(|pair| pair[0].0 > pair[1].0)
    }

    pub fn labels(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.bands.iter().map(|&(_, label)| label)
    }
}

pub const CONFIDENCE_BANDS: BandTable = BandTable::new(&[
    (85.0, "very_high"),
    (75.0, "high"),
    (60.0, "medium"),
    (40.0, "low"),
    (0.0, "very_low"),
]);

pub const COMPLIANCE_STATUS_BANDS: BandTable = BandTable::new(&[
    (95.0, "fully_compliant"),
    (80.0, "mostly_compliant"),
    (60.0, "partially_compliant"),
    (40.0, "non_compliant"),
    (0.0, "severely_non_compliant"),
]);

pub const RISK_LEVEL_BANDS: BandTable = BandTable::new(&[
    (75.0, "critical"),
    (50.0, "high"),
    (25.0, "medium"),
    (0.0, "low"),
]);

pub const GRADE_BANDS: BandTable = BandTable::new(&[
    (90.0, "A"),
    (80.0, "B+"),
    (70.0, "B"),
    (60.0, "C+"),
    (50.0, "C"),
    (0.0, "D"),
]);

pub fn performance_grade(score: f32) -> &'static str {
    GRADE_BANDS.classify(score)
}

/// Discrete evidence-strength label, distinct from per-finding confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfidenceLevel {
    VeryLow,
    Low,
    Medium,
    High,
    VeryHigh,
}

impl ConfidenceLevel {
    pub fn from_score(score: f32) -> Self {
        match CONFIDENCE_BANDS.classify(score) {
            "very_high" => ConfidenceLevel::VeryHigh,
            "high" => ConfidenceLevel::High,
            "medium" => ConfidenceLevel::Medium,
            "low" => ConfidenceLevel::Low,
            _ => ConfidenceLevel::VeryLow,
        }
    }

    /// One band lower, saturating at the bottom. Applied when a pipeline
    /// stage degraded instead of aborting.
    pub fn degraded(self) -> Self {
        match self {
            ConfidenceLevel::VeryHigh => ConfidenceLevel::High,
            ConfidenceLevel::High => ConfidenceLevel::Medium,
            ConfidenceLevel::Medium => ConfidenceLevel::Low,
            ConfidenceLevel::Low | ConfidenceLevel::VeryLow => ConfidenceLevel::VeryLow,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceLevel::VeryHigh => "VERY_HIGH",
            ConfidenceLevel::High => "HIGH",
            ConfidenceLevel::Medium => "MEDIUM",
            ConfidenceLevel::Low => "LOW",
            ConfidenceLevel::VeryLow => "VERY_LOW",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceStatus {
    FullyCompliant,
    MostlyCompliant,
    PartiallyCompliant,
    NonCompliant,
    SeverelyNonCompliant,
}

impl ComplianceStatus {
    pub fn from_score(score: f32) -> Self {
        match COMPLIANCE_STATUS_BANDS.classify(score) {
            "fully_compliant" => ComplianceStatus::FullyCompliant,
            "mostly_compliant" => ComplianceStatus::MostlyCompliant,
            "partially_compliant" => ComplianceStatus::PartiallyCompliant,
            "non_compliant" => ComplianceStatus::NonCompliant,
            _ => ComplianceStatus::SeverelyNonCompliant,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ComplianceStatus::FullyCompliant => "fully_compliant",
            ComplianceStatus::MostlyCompliant => "mostly_compliant",
            ComplianceStatus::PartiallyCompliant => "partially_compliant",
            ComplianceStatus::NonCompliant => "non_compliant",
            ComplianceStatus::SeverelyNonCompliant => "severely_non_compliant",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn from_score(score: f32) -> Self {
        match RISK_LEVEL_BANDS.classify(score) {
            "critical" => RiskLevel::Critical,
            "high" => RiskLevel::High,
            "medium" => RiskLevel::Medium,
            _ => RiskLevel::Low,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Critical => "CRITICAL",
            RiskLevel::High => "HIGH",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::Low => "LOW",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exported_tables_are_total() {
        for table in [
            CONFIDENCE_BANDS,
            COMPLIANCE_STATUS_BANDS,
            RISK_LEVEL_BANDS,
            GRADE_BANDS,
        ] {
            assert!(table.is_total());
        }
    }

    #[test]
    fn confidence_boundaries_are_inclusive() {
        assert_eq!(ConfidenceLevel::from_score(85.0), ConfidenceLevel::VeryHigh);
        assert_eq!(ConfidenceLevel::from_score(84.999), ConfidenceLevel::High);
        assert_eq!(ConfidenceLevel::from_score(75.0), ConfidenceLevel::High);
        assert_eq!(ConfidenceLevel::from_score(60.0), ConfidenceLevel::Medium);
        assert_eq!(ConfidenceLevel::from_score(40.0), ConfidenceLevel::Low);
        assert_eq!(ConfidenceLevel::from_score(39.9), ConfidenceLevel::VeryLow);
    }

    #[test]
    fn compliance_status_bands_match_thresholds() {
        assert_eq!(
            ComplianceStatus::from_score(95.0),
            ComplianceStatus::FullyCompliant
        );
        assert_eq!(
            ComplianceStatus::from_score(80.0),
            ComplianceStatus::MostlyCompliant
        );
        assert_eq!(
            ComplianceStatus::from_score(60.0),
            ComplianceStatus::PartiallyCompliant
        );
        assert_eq!(
            ComplianceStatus::from_score(40.0),
            ComplianceStatus::NonCompliant
        );
        assert_eq!(
            ComplianceStatus::from_score(39.99),
            ComplianceStatus::SeverelyNonCompliant
        );
    }

    #[test]
    fn risk_level_bands_match_thresholds() {
        assert_eq!(RiskLevel::from_score(75.0), RiskLevel::Critical);
        assert_eq!(RiskLevel::from_score(74.9), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(50.0), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(25.0), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(24.9), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(0.0), RiskLevel::Low);
    }

    #[test]
    fn grades_cover_the_whole_range() {
        assert_eq!(performance_grade(93.0), "A");
        assert_eq!(performance_grade(80.5), "B+");
        assert_eq!(performance_grade(70.0), "B");
        assert_eq!(performance_grade(65.0), "C+");
        assert_eq!(performance_grade(50.0), "C");
        assert_eq!(performance_grade(12.0), "D");
    }

    #[test]
    fn degraded_drops_one_band_and_saturates() {
        assert_eq!(
            ConfidenceLevel::VeryHigh.degraded(),
            ConfidenceLevel::High
        );
        assert_eq!(ConfidenceLevel::VeryLow.degraded(), ConfidenceLevel::VeryLow);
    }
}
