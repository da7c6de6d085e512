use std::time::Instant;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use clausewise_core::{
    dedupe, derive_recommendations, evidence_confidence, performance_grade, severity_penalty,
    truncate_findings, vendor_overall, AnalysisError, Finding, Result, ScoreResult,
    VendorMetrics, MAX_ISSUES, MAX_RECOMMENDATIONS,
};

const WEAK_METRIC_FLOOR: f32 = 60.0;

#[derive(Debug, Clone, Deserialize)]
pub struct VendorRequest {
    pub vendor: String,
    pub metrics: VendorMetrics,
    #[serde(default)]
    pub risk_findings: Vec<Finding>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VendorReport {
    pub vendor: String,
    pub score: ScoreResult,
    pub grade: &'static str,
    pub baseline: f32,
    pub risk_penalty: f32,
    pub risk_findings: Vec<Finding>,
    pub recommendations: Vec<String>,
    pub generated_at: DateTime<Utc>,
    pub processing_time_ms: u64,
}

#[derive(Debug, Clone, Default)]
pub struct VendorRiskAgent;

impl VendorRiskAgent {
    pub fn new() -> Self {
        Self
    }

    pub fn evaluate(&self, request: &VendorRequest) -> Result<VendorReport> {
        let started = Instant::now();
        if request.vendor.trim().is_empty() {
            return Err(AnalysisError::Validation(
                "vendor name must not be empty".to_string(),
            ));
        }
        request.metrics.validate()?;

        let baseline = request.metrics.baseline();
        let risk_penalty: f32 = request
            .risk_findings
            .iter()
            .map(|f| severity_penalty(f.severity))
            .sum();
        let overall = vendor_overall(&request.metrics, &request.risk_findings);
        let grade = performance_grade(overall);

        let mut components = IndexMap::new();
        for (name, value) in request.metrics.named() {
            components.insert(name.to_string(), value);
        }
        let confidence =
            evidence_confidence(5 + request.risk_findings.len(), 0.9, false);
        let score = ScoreResult::new(overall, components, confidence)?;

        let mut recommendations = Vec::new();
        for (name, value) in request.metrics.named() {
            if value < WEAK_METRIC_FLOOR {
                recommendations.push(format!(
                    "Improve {} (currently {:.0})",
                    name.replace('_', " "),
                    value
                ));
            }
        }
        recommendations.extend(derive_recommendations(
            &request.risk_findings,
            "vendor",
            MAX_RECOMMENDATIONS,
        ));
        let mut recommendations = dedupe(recommendations);
        recommendations.truncate(MAX_RECOMMENDATIONS);

        Ok(VendorReport {
            vendor: request.vendor.clone(),
            score,
            grade,
            baseline,
            risk_penalty,
            risk_findings: truncate_findings(request.risk_findings.clone(), MAX_ISSUES),
            recommendations,
            generated_at: Utc::now(),
            processing_time_ms: started.elapsed().as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clausewise_core::{Category, Severity};

    fn reference_request() -> VendorRequest {
        VendorRequest {
            vendor: "Acme Logistics".to_string(),
            metrics: VendorMetrics {
                on_time_delivery: 90.0,
                quality: 85.0,
                response_time: 80.0,
                cost_efficiency: 75.0,
                compliance: 95.0,
            },
            risk_findings: vec![Finding::new(
                Category::Operational,
                Severity::High,
                0.9,
                "repeated shipment delays",
            )],
        }
    }

    #[test]
    fn reference_scenario_grades_b_plus() {
        let agent = VendorRiskAgent::new();
        let report = agent.evaluate(&reference_request()).unwrap();
        assert!((report.baseline - 85.5).abs() < 1e-4);
        assert_eq!(report.risk_penalty, 5.0);
        assert!((report.score.total_score - 80.5).abs() < 1e-4);
        assert_eq!(report.grade, "B+");
    }

    #[test]
    fn weak_metrics_generate_improvement_recommendations() {
        let mut request = reference_request();
        request.metrics.response_time = 40.0;
        let agent = VendorRiskAgent::new();
        let report = agent.evaluate(&request).unwrap();
        assert!(report
            .recommendations
            .iter()
            .any(|r| r.contains("response time")));
    }

    #[test]
    fn out_of_range_metrics_are_rejected() {
        let mut request = reference_request();
        request.metrics.quality = 130.0;
        let agent = VendorRiskAgent::new();
        assert!(matches!(
            agent.evaluate(&request),
            Err(AnalysisError::Validation(_))
        ));
    }

    #[test]
    fn component_scores_keep_metric_order() {
        let agent = VendorRiskAgent::new();
        let report = agent.evaluate(&reference_request()).unwrap();
        let keys: Vec<&String> = report.score.component_scores.keys().collect();
        assert_eq!(keys[0], "on_time_delivery");
        assert_eq!(keys[4], "compliance");
    }
}
