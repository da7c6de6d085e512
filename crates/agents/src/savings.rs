use std::time::Instant;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use clausewise_core::{
    dedupe, evidence_confidence, AnalysisError, ConfidenceLevel, Result, MAX_RECOMMENDATIONS,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavingsRecord {
    pub category: String,
    pub baseline_cost: f64,
    pub negotiated_cost: f64,
    /// Realized means the negotiated price is already in effect; otherwise
    /// the saving is projected.
    #[serde(default)]
    pub realized: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SavingsRequest {
    pub records: Vec<SavingsRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SavingsReport {
    pub total_baseline: f64,
    pub total_negotiated: f64,
    pub realized_savings: f64,
    pub projected_savings: f64,
    /// Total savings as a percentage of baseline spend.
    pub savings_rate: f32,
    pub by_category: IndexMap<String, f64>,
    pub recommendations: Vec<String>,
    pub confidence: ConfidenceLevel,
    pub generated_at: DateTime<Utc>,
    pub processing_time_ms: u64,
}

#[derive(Debug, Clone, Default)]
pub struct SavingsTracker;

impl SavingsTracker {
    pub fn new() -> Self {
        Self
    }

    pub fn report(&self, request: &SavingsRequest) -> Result<SavingsReport> {
        let started = Instant::now();
        if request.records.is_empty() {
            return Err(AnalysisError::Validation(
                "at least one savings record is required".to_string(),
            ));
        }
        for record in &request.records {
            if record.category.trim().is_empty() {
                return Err(AnalysisError::Validation(
                    "savings record category must not be empty".to_string(),
                ));
            }
            for (name, value) in [
                ("baseline_cost", record.baseline_cost),
                ("negotiated_cost", record.negotiated_cost),
            ] {
                if !value.is_finite() || value < 0.0 {
                    return Err(AnalysisError::Validation(format!(
                        "{name} must be a non-negative number"
                    )));
                }
            }
        }

        let mut total_baseline = 0.0;
        let mut total_negotiated = 0.0;
        let mut realized_savings = 0.0;
        let mut projected_savings = 0.0;
        let mut by_category: IndexMap<String, f64> = IndexMap::new();
        for record in &request.records {
            let saving = record.baseline_cost - record.negotiated_cost;
            total_baseline += record.baseline_cost;
            total_negotiated += record.negotiated_cost;
            if record.realized {
                realized_savings += saving;
            } else {
                projected_savings += saving;
            }
            *by_category.entry(record.category.clone()).or_insert(0.0) += saving;
        }
        let total_savings = realized_savings + projected_savings;
        let savings_rate = if total_baseline > 0.0 {
            ((total_savings / total_baseline) * 100.0) as f32
        } else {
            0.0
        };

        let mut recommendations = Vec::new();
        for (category, saving) in &by_category {
            if *saving < 0.0 {
                recommendations.push(format!(
                    "Renegotiate {category}; spend grew by {:.2}",
                    saving.abs()
                ));
            }
        }
        if projected_savings > 0.0 {
            recommendations.push(format!(
                "Convert {projected_savings:.2} of projected savings into signed amendments"
            ));
        }
        let mut recommendations = dedupe(recommendations);
        recommendations.truncate(MAX_RECOMMENDATIONS);

        Ok(SavingsReport {
            total_baseline,
            total_negotiated,
            realized_savings,
            projected_savings,
            savings_rate,
            by_category,
            recommendations,
            confidence: evidence_confidence(request.records.len(), 1.0, false),
            generated_at: Utc::now(),
            processing_time_ms: started.elapsed().as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(category: &str, baseline: f64, negotiated: f64, realized: bool) -> SavingsRecord {
        SavingsRecord {
            category: category.to_string(),
            baseline_cost: baseline,
            negotiated_cost: negotiated,
            realized,
        }
    }

    #[test]
    fn totals_and_rate_add_up() {
        let tracker = SavingsTracker::new();
        let report = tracker
            .report(&SavingsRequest {
                records: vec![
                    record("logistics", 100_000.0, 90_000.0, true),
                    record("software", 50_000.0, 45_000.0, false),
                ],
            })
            .unwrap();
        assert_eq!(report.total_baseline, 150_000.0);
        assert_eq!(report.realized_savings, 10_000.0);
        assert_eq!(report.projected_savings, 5_000.0);
        assert!((report.savings_rate - 10.0).abs() < 1e-4);
    }

    #[test]
    fn overspend_categories_are_flagged() {
        let tracker = SavingsTracker::new();
        let report = tracker
            .report(&SavingsRequest {
                records: vec![record("cloud", 10_000.0, 12_500.0, true)],
            })
            .unwrap();
        assert!(report
            .recommendations
            .iter()
            .any(|r| r.starts_with("Renegotiate cloud")));
    }

    #[test]
    fn categories_accumulate() {
        let tracker = SavingsTracker::new();
        let report = tracker
            .report(&SavingsRequest {
                records: vec![
                    record("fleet", 10_000.0, 9_000.0, true),
                    record("fleet", 20_000.0, 18_000.0, false),
                ],
            })
            .unwrap();
        assert_eq!(report.by_category["fleet"], 3_000.0);
    }

    #[test]
    fn negative_costs_are_rejected() {
        let tracker = SavingsTracker::new();
        let err = tracker
            .report(&SavingsRequest {
                records: vec![record("x", -1.0, 0.0, true)],
            })
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Validation(_)));
    }

    #[test]
    fn empty_records_are_rejected() {
        let tracker = SavingsTracker::new();
        assert!(tracker
            .report(&SavingsRequest { records: vec![] })
            .is_err());
    }
}
