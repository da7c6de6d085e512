use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use clausewise_core::{
    dedupe, derive_recommendations, evidence_confidence, extract_risks, AnalysisError,
    ConfidenceLevel, ExtractionConfig, Finding, Result, RiskLevel, Severity, MAX_ISSUES,
    MAX_RECOMMENDATIONS,
};
use clausewise_llm::{AnalysisOutcome, AnalysisTask};

use crate::context::AgentContext;

const WEAK_VENDOR_FLOOR: f32 = 60.0;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NegotiationRequest {
    #[serde(default)]
    pub contract_text: Option<String>,
    #[serde(default)]
    pub findings: Vec<Finding>,
    #[serde(default)]
    pub vendor_score: Option<f32>,
    #[serde(default)]
    pub objectives: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Posture {
    Collaborative,
    Balanced,
    Aggressive,
}

#[derive(Debug, Clone, Serialize)]
pub struct NegotiationReport {
    pub posture: Posture,
    pub risk_level: RiskLevel,
    pub leverage_points: Vec<String>,
    pub objectives: Vec<String>,
    pub recommendations: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub confidence: ConfidenceLevel,
    pub degraded: bool,
    pub generated_at: DateTime<Utc>,
    pub processing_time_ms: u64,
}

#[derive(Clone)]
pub struct NegotiationAdvisor {
    ctx: Arc<AgentContext>,
}

impl NegotiationAdvisor {
    pub fn new(ctx: Arc<AgentContext>) -> Self {
        Self { ctx }
    }

    pub async fn prepare(&self, request: &NegotiationRequest) -> Result<NegotiationReport> {
        let started = Instant::now();
        validate(request)?;

        let mut findings = request.findings.clone();
        if let Some(text) = &request.contract_text {
            for finding in extract_risks(text, &ExtractionConfig::default()) {
                if !findings.iter().any(|f| f.description == finding.description) {
                    findings.push(finding);
                }
            }
        }

        let (brief, degraded) = match self.brief(request).await {
            Ok(brief) => (brief, false),
            Err(err) => {
                warn!(error = %err, "negotiation brief failed, continuing degraded");
                (None, true)
            }
        };

        let weighted: f32 = findings
            .iter()
            .map(|f| f.severity.multiplier() * 10.0)
            .sum();
        let risk_level = RiskLevel::from_score(weighted.min(100.0));
        let posture = posture_for(risk_level, request.vendor_score);

        let mut leverage = Vec::new();
        for finding in findings
            .iter()
            .filter(|f| f.severity >= Severity::High)
        {
            leverage.push(format!("Counterparty exposure: {}", finding.description));
        }
        if let Some(score) = request.vendor_score {
            if score < WEAK_VENDOR_FLOOR {
                leverage.push(format!(
                    "Vendor scorecard is weak ({score:.1}); use it to press for concessions"
                ));
            }
        }
        let mut leverage = dedupe(leverage);
        leverage.truncate(MAX_ISSUES);

        let mut objectives = request.objectives.clone();
        for finding in &findings {
            if let Some(mitigation) = &finding.mitigation {
                objectives.push(mitigation.clone());
            }
        }
        if let Some(brief) = &brief {
            objectives.extend(brief.objectives.iter().cloned());
        }
        let mut objectives = dedupe(objectives);
        objectives.truncate(MAX_ISSUES);

        let recommendations =
            derive_recommendations(&findings, "negotiation", MAX_RECOMMENDATIONS);
        let mean = if findings.is_empty() {
            0.0
        } else {
            findings.iter().map(|f| f.confidence).sum::<f32>() / findings.len() as f32
        };
        let confidence = evidence_confidence(findings.len(), mean, degraded);

        Ok(NegotiationReport {
            posture,
            risk_level,
            leverage_points: leverage,
            objectives,
            recommendations,
            summary: brief.and_then(|b| b.summary),
            confidence,
            degraded,
            generated_at: Utc::now(),
            processing_time_ms: started.elapsed().as_millis() as u64,
        })
    }

    async fn brief(&self, request: &NegotiationRequest) -> anyhow::Result<Option<Brief>> {
        let (Some(llm), Some(text)) = (&self.ctx.llm, &request.contract_text) else {
            return Ok(None);
        };
        let outcome = llm.analyze(text, AnalysisTask::NegotiationBrief).await?;
        Ok(Some(Brief::from_outcome(outcome)))
    }
}

struct Brief {
    summary: Option<String>,
    objectives: Vec<String>,
}

impl Brief {
    fn from_outcome(outcome: AnalysisOutcome) -> Self {
        let summary = outcome.summary();
        let objectives = match &outcome {
            AnalysisOutcome::Structured(value) => value
                .get("objectives")
                .and_then(|v| v.as_array())
                .map(|items| {
                    items
                        .iter()
                        .filter_map(|item| item.as_str().map(str::to_string))
                        .collect()
                })
                .unwrap_or_default(),
            AnalysisOutcome::Raw(text) => clausewise_llm::scrape_strings(text),
        };
        Self {
            summary,
            objectives,
        }
    }
}

fn validate(request: &NegotiationRequest) -> Result<()> {
    let has_text = request
        .contract_text
        .as_deref()
        .map(|t| !t.trim().is_empty())
        .unwrap_or(false);
    if !has_text && request.findings.is_empty() {
        return Err(AnalysisError::Validation(
            "either contract_text or findings must be provided".to_string(),
        ));
    }
    if let Some(score) = request.vendor_score {
        if !score.is_finite() || !(0.0..=100.0).contains(&score) {
            return Err(AnalysisError::Validation(
                "vendor_score must be within 0-100".to_string(),
            ));
        }
    }
    Ok(())
}

fn posture_for(risk_level: RiskLevel, vendor_score: Option<f32>) -> Posture {
    let mut posture = match risk_level {
        RiskLevel::Critical | RiskLevel::High => Posture::Aggressive,
        RiskLevel::Medium => Posture::Balanced,
        RiskLevel::Low => Posture::Collaborative,
    };
    if posture == Posture::Collaborative
        && vendor_score.map(|s| s < WEAK_VENDOR_FLOOR).unwrap_or(false)
    {
        posture = Posture::Balanced;
    }
    posture
}

#[cfg(test)]
mod tests {
    use super::*;
    use clausewise_core::Category;

    fn finding(severity: Severity, description: &str) -> Finding {
        Finding::new(Category::Legal, severity, 0.9, description)
    }

    #[tokio::test]
    async fn high_risk_findings_set_an_aggressive_posture() {
        let advisor = NegotiationAdvisor::new(AgentContext::offline());
        let report = advisor
            .prepare(&NegotiationRequest {
                findings: vec![
                    finding(Severity::Critical, "unlimited liability"),
                    finding(Severity::High, "unilateral amendment"),
                ],
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(report.posture, Posture::Aggressive);
        assert!(report
            .leverage_points
            .iter()
            .any(|l| l.contains("unlimited liability")));
    }

    #[tokio::test]
    async fn weak_vendor_score_is_leverage() {
        let advisor = NegotiationAdvisor::new(AgentContext::offline());
        let report = advisor
            .prepare(&NegotiationRequest {
                findings: vec![finding(Severity::Low, "minor wording")],
                vendor_score: Some(42.0),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(report
            .leverage_points
            .iter()
            .any(|l| l.contains("scorecard is weak")));
        assert_eq!(report.posture, Posture::Balanced);
    }

    #[tokio::test]
    async fn contract_text_contributes_extracted_risks() {
        let advisor = NegotiationAdvisor::new(AgentContext::offline());
        let report = advisor
            .prepare(&NegotiationRequest {
                contract_text: Some(
                    "Supplier accepts unlimited liability; the term auto-renews.".to_string(),
                ),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(report
            .leverage_points
            .iter()
            .any(|l| l.contains("unlimited liability")));
        assert!(report
            .objectives
            .iter()
            .any(|o| o.contains("liability cap")));
    }

    #[tokio::test]
    async fn empty_request_is_rejected() {
        let advisor = NegotiationAdvisor::new(AgentContext::offline());
        let err = advisor
            .prepare(&NegotiationRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Validation(_)));
    }

    #[tokio::test]
    async fn caller_objectives_survive_dedup() {
        let advisor = NegotiationAdvisor::new(AgentContext::with_local_llm());
        let report = advisor
            .prepare(&NegotiationRequest {
                contract_text: Some("Payment terms are net 90 with penalties.".to_string()),
                objectives: vec!["Shorten payment terms to net 30".to_string()],
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(report
            .objectives
            .contains(&"Shorten payment terms to net 30".to_string()));
        assert!(!report.degraded);
    }
}
