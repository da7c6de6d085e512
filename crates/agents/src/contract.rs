use std::sync::Arc;
use std::time::Instant;

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use clausewise_core::{
    derive_recommendations, evidence_confidence, extract_clauses, extract_entities,
    extract_protections, extract_risks, missing_clauses, risk_points, truncate_findings,
    AnalysisDepth, AnalysisError, AnalysisRequest, Category, ConfidenceLevel, ContractEntities,
    ExtractionConfig, Finding, Result, RiskLevel, Severity, MAX_CLAUSES, MAX_ISSUES,
    MAX_RECOMMENDATIONS,
};
use clausewise_llm::{AnalysisOutcome, AnalysisTask, LlmTimeout};

use crate::context::AgentContext;

#[derive(Debug, Clone, Serialize)]
pub struct ContractReport {
    pub risk_score: f32,
    pub risk_level: RiskLevel,
    pub clauses: Vec<Finding>,
    pub risks: Vec<Finding>,
    pub protections: Vec<Finding>,
    pub missing_clauses: Vec<String>,
    pub entities: ContractEntities,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub recommendations: Vec<String>,
    pub confidence: ConfidenceLevel,
    pub degraded: bool,
    pub generated_at: DateTime<Utc>,
    pub processing_time_ms: u64,
}

#[derive(Clone)]
pub struct ContractAnalyzer {
    ctx: Arc<AgentContext>,
}

struct Enrichment {
    summary: Option<String>,
    findings: Vec<Finding>,
}

impl Enrichment {
    fn from_outcome(outcome: AnalysisOutcome) -> Self {
        let summary = outcome.summary();
        let findings = match &outcome {
            AnalysisOutcome::Structured(value) => parse_findings(value),
            AnalysisOutcome::Raw(_) => Vec::new(),
        };
        Self { summary, findings }
    }
}

impl ContractAnalyzer {
    pub fn new(ctx: Arc<AgentContext>) -> Self {
        Self { ctx }
    }

    pub async fn analyze(&self, request: &AnalysisRequest) -> Result<ContractReport> {
        let started = Instant::now();
        request.validate()?;
        let config = ExtractionConfig {
            categories: request.options.categories.clone(),
        };
        let depth = request.options.depth;
        let text = request.text.as_str();

        // Clause and risk extraction fan out with the LLM enrichment call;
        // nothing is shared until the join.
        let (clause_pass, risk_pass, enrichment) = tokio::join!(
            async { (extract_clauses(text, &config), missing_clauses(text)) },
            async {
                (
                    extract_risks(text, &config),
                    extract_protections(text, &config),
                    extract_entities(text),
                )
            },
            self.enrich(text, depth),
        );
        let (clauses, missing) = clause_pass;
        let (mut risks, protections, entities) = risk_pass;
        let (enrichment, degraded) = match enrichment {
            Ok(outcome) => (outcome, false),
            Err(err) => {
                if depth == AnalysisDepth::Deep {
                    return Err(map_llm_error(err));
                }
                warn!(error = %err, "llm enrichment failed, continuing degraded");
                (None, true)
            }
        };
        if let Some(enrichment) = &enrichment {
            for finding in &enrichment.findings {
                if !risks.iter().any(|r| r.description == finding.description) {
                    risks.push(finding.clone());
                }
            }
        }

        let risk_score = risk_points(risks.len(), protections.len(), missing.len());
        let risk_level = RiskLevel::from_score(risk_score);
        let recommendations = derive_recommendations(&risks, "contract", MAX_RECOMMENDATIONS);

        let evidence: Vec<&Finding> = clauses.iter().chain(&risks).chain(&protections).collect();
        let mean = if evidence.is_empty() {
            0.0
        } else {
            evidence.iter().map(|f| f.confidence).sum::<f32>() / evidence.len() as f32
        };
        let confidence = evidence_confidence(evidence.len(), mean, degraded);

        Ok(ContractReport {
            risk_score,
            risk_level,
            clauses: truncate_findings(clauses, MAX_CLAUSES),
            risks: truncate_findings(risks, MAX_ISSUES),
            protections: truncate_findings(protections, MAX_ISSUES),
            missing_clauses: missing.into_iter().map(str::to_string).collect(),
            entities,
            summary: enrichment.and_then(|e| e.summary),
            recommendations,
            confidence,
            degraded,
            generated_at: Utc::now(),
            processing_time_ms: started.elapsed().as_millis() as u64,
        })
    }

    async fn enrich(
        &self,
        text: &str,
        depth: AnalysisDepth,
    ) -> anyhow::Result<Option<Enrichment>> {
        if depth == AnalysisDepth::Quick {
            return Ok(None);
        }
        let Some(llm) = &self.ctx.llm else {
            if depth == AnalysisDepth::Deep {
                return Err(anyhow!("deep analysis requires an llm provider"));
            }
            return Ok(None);
        };
        let outcome = llm.analyze(text, AnalysisTask::ContractReview).await?;
        Ok(Some(Enrichment::from_outcome(outcome)))
    }
}

fn map_llm_error(err: anyhow::Error) -> AnalysisError {
    if let Some(timeout) = err.downcast_ref::<LlmTimeout>() {
        AnalysisError::Timeout {
            stage: "llm",
            waited_ms: timeout.0,
        }
    } else {
        AnalysisError::Extraction(err.to_string())
    }
}

fn parse_findings(value: &Value) -> Vec<Finding> {
    let Some(items) = value.get("findings").and_then(|v| v.as_array()) else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| {
            let category = Category::from_str(item.get("category")?.as_str()?)?;
            let severity = Severity::from_str(item.get("severity")?.as_str()?)?;
            let confidence = item
                .get("confidence")
                .and_then(|c| c.as_f64())
                .unwrap_or(0.6) as f32;
            let description = item.get("description")?.as_str()?.to_string();
            Some(Finding::new(category, severity, confidence, description))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clausewise_core::AnalysisOptions;

    const RISKY: &str = "This Agreement is made between Acme Corp and Widget LLC, \
        effective 2026-01-05. Supplier accepts unlimited liability. The term is \
        non-cancelable and auto-renews each year at the provider's sole discretion. \
        Late delivery incurs penalties of $5,000 per day.";

    fn request(depth: AnalysisDepth) -> AnalysisRequest {
        AnalysisRequest {
            text: RISKY.to_string(),
            options: AnalysisOptions {
                depth,
                ..Default::default()
            },
        }
    }

    #[tokio::test]
    async fn scores_follow_the_point_model() {
        let analyzer = ContractAnalyzer::new(AgentContext::offline());
        let report = analyzer.analyze(&request(AnalysisDepth::Quick)).await.unwrap();
        assert!(!report.risks.is_empty());
        let expected = risk_points(
            report.risks.len(),
            report.protections.len(),
            report.missing_clauses.len(),
        );
        assert_eq!(report.risk_score, expected);
        assert_eq!(report.risk_level, RiskLevel::from_score(report.risk_score));
        assert!(!report.degraded);
    }

    #[tokio::test]
    async fn critical_risks_drive_a_summary_recommendation() {
        let analyzer = ContractAnalyzer::new(AgentContext::offline());
        let report = analyzer.analyze(&request(AnalysisDepth::Quick)).await.unwrap();
        assert!(report
            .recommendations
            .iter()
            .any(|r| r.contains("critical contract")));
        assert!(report.recommendations.len() <= MAX_RECOMMENDATIONS);
    }

    #[tokio::test]
    async fn local_llm_supplies_a_summary() {
        let analyzer = ContractAnalyzer::new(AgentContext::with_local_llm());
        let report = analyzer
            .analyze(&request(AnalysisDepth::Standard))
            .await
            .unwrap();
        assert!(report.summary.is_some());
        assert!(!report.degraded);
    }

    #[tokio::test]
    async fn deep_analysis_without_llm_fails() {
        let analyzer = ContractAnalyzer::new(AgentContext::offline());
        let err = analyzer
            .analyze(&request(AnalysisDepth::Deep))
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Extraction(_)));
    }

    #[tokio::test]
    async fn blank_text_is_rejected_up_front() {
        let analyzer = ContractAnalyzer::new(AgentContext::offline());
        let err = analyzer
            .analyze(&AnalysisRequest::new("  "))
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Validation(_)));
    }

    #[test]
    fn llm_findings_parse_from_structured_value() {
        let value = serde_json::json!({
            "findings": [
                {
                    "category": "financial",
                    "severity": "high",
                    "confidence": 0.8,
                    "description": "uncapped price escalation"
                },
                { "category": "bogus", "severity": "high", "description": "dropped" }
            ]
        });
        let findings = parse_findings(&value);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].description, "uncapped price escalation");
    }
}
