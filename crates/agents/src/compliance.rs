use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use clausewise_core::{
    derive_recommendations, evidence_confidence, truncate_findings, weighted_average,
    AnalysisError, AnalysisRequest, Category, ComplianceStatus, ConfidenceLevel, Finding,
    Result, Severity, WeightedSample, COMPLIANCE_EMPTY_SCORE, MAX_CHECKS, MAX_ISSUES,
    MAX_RECOMMENDATIONS,
};

use crate::context::AgentContext;

const CHECK_CONFIDENCE: f32 = 0.85;

struct Requirement {
    regulation: &'static str,
    requirement: &'static str,
    category: Category,
    severity: Severity,
    pattern: &'static str,
    mitigation: &'static str,
}

static REQUIREMENTS: [Requirement; 16] = [
    Requirement {
        regulation: "gdpr",
        requirement: "data processing agreement",
        category: Category::DataProtection,
        severity: Severity::High,
        pattern: r"(?i)data\s+processing\s+agreement|\bDPA\b",
        mitigation: "Attach a data processing agreement covering processor duties",
    },
    Requirement {
        regulation: "gdpr",
        requirement: "breach notification",
        category: Category::DataProtection,
        severity: Severity::High,
        pattern: r"(?i)breach\s+notification|notify.{0,60}breach|72\s+hours",
        mitigation: "Add a 72-hour personal data breach notification duty",
    },
    Requirement {
        regulation: "gdpr",
        requirement: "right to erasure",
        category: Category::DataProtection,
        severity: Severity::Medium,
        pattern: r"(?i)right\s+to\s+(?:erasure|be\s+forgotten)|delet(?:e|ion)\s+of?\s*personal\s+data",
        mitigation: "Commit to deletion of personal data on request or termination",
    },
    Requirement {
        regulation: "gdpr",
        requirement: "sub-processor disclosure",
        category: Category::DataProtection,
        severity: Severity::Medium,
        pattern: r"(?i)sub-?processor",
        mitigation: "Require notice and approval of sub-processors",
    },
    Requirement {
        regulation: "hipaa",
        requirement: "phi safeguards",
        category: Category::DataProtection,
        severity: Severity::Critical,
        pattern: r"(?i)safeguard.{0,60}(?:\bphi\b|health\s+information)|administrative,\s+physical,?\s+and\s+technical\s+safeguards",
        mitigation: "Specify administrative, physical, and technical safeguards for PHI",
    },
    Requirement {
        regulation: "hipaa",
        requirement: "business associate agreement",
        category: Category::Compliance,
        severity: Severity::High,
        pattern: r"(?i)business\s+associate\s+agreement|\bBAA\b",
        mitigation: "Execute a business associate agreement before PHI changes hands",
    },
    Requirement {
        regulation: "hipaa",
        requirement: "phi encryption",
        category: Category::DataProtection,
        severity: Severity::High,
        pattern: r"(?i)encrypt",
        mitigation: "Require encryption of PHI at rest and in transit",
    },
    Requirement {
        regulation: "sox",
        requirement: "audit trail",
        category: Category::Compliance,
        severity: Severity::High,
        pattern: r"(?i)audit\s+(?:trail|log)",
        mitigation: "Require tamper-evident audit trails for financial records",
    },
    Requirement {
        regulation: "sox",
        requirement: "internal controls",
        category: Category::Compliance,
        severity: Severity::High,
        pattern: r"(?i)internal\s+controls?",
        mitigation: "Reference internal controls over financial reporting",
    },
    Requirement {
        regulation: "sox",
        requirement: "records retention",
        category: Category::Compliance,
        severity: Severity::Medium,
        pattern: r"(?i)retention\s+(?:period|policy|schedule)|retain\s+(?:all\s+)?records",
        mitigation: "Define a records retention period for audit-relevant documents",
    },
    Requirement {
        regulation: "pci_dss",
        requirement: "cardholder data protection",
        category: Category::DataProtection,
        severity: Severity::High,
        pattern: r"(?i)cardholder\s+data|\bPAN\b",
        mitigation: "State how cardholder data is stored and protected",
    },
    Requirement {
        regulation: "pci_dss",
        requirement: "encryption in transit",
        category: Category::DataProtection,
        severity: Severity::High,
        pattern: r"(?i)encrypt.{0,60}transit|\bTLS\b|\bSSL\b",
        mitigation: "Mandate TLS for cardholder data in transit",
    },
    Requirement {
        regulation: "pci_dss",
        requirement: "access restriction",
        category: Category::Operational,
        severity: Severity::Medium,
        pattern: r"(?i)need[-\s]to[-\s]know|least\s+privilege|access\s+controls?",
        mitigation: "Restrict cardholder data access to need-to-know personnel",
    },
    Requirement {
        regulation: "ccpa",
        requirement: "right to opt out",
        category: Category::DataProtection,
        severity: Severity::High,
        pattern: r"(?i)opt[-\s]?out|do\s+not\s+sell",
        mitigation: "Honor consumer opt-out of personal information sale",
    },
    Requirement {
        regulation: "ccpa",
        requirement: "consumer disclosure",
        category: Category::DataProtection,
        severity: Severity::Medium,
        pattern: r"(?i)categories\s+of\s+personal\s+information|consumer\s+rights",
        mitigation: "Disclose the categories of personal information collected",
    },
    Requirement {
        regulation: "ccpa",
        requirement: "non-discrimination",
        category: Category::Legal,
        severity: Severity::Medium,
        pattern: r"(?i)non[-\s]?discriminat",
        mitigation: "Add a non-discrimination commitment for consumers exercising rights",
    },
];

struct CompiledRequirement {
    rule: &'static Requirement,
    regex: Regex,
}

static COMPILED: Lazy<Vec<CompiledRequirement>> = Lazy::new(|| {
    REQUIREMENTS
        .iter()
        .map(|rule| CompiledRequirement {
            rule,
            regex: Regex::new(rule.pattern).expect("valid requirement pattern"),
        })
        .collect()
});

#[derive(Debug, Clone, Serialize)]
pub struct ComplianceCheck {
    pub regulation: String,
    pub requirement: String,
    pub passed: bool,
    pub severity: Severity,
    pub category: Category,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComplianceReport {
    pub compliance_score: f32,
    pub status: ComplianceStatus,
    pub checks: Vec<ComplianceCheck>,
    pub findings: Vec<Finding>,
    pub recommendations: Vec<String>,
    pub confidence: ConfidenceLevel,
    pub generated_at: DateTime<Utc>,
    pub processing_time_ms: u64,
}

#[derive(Clone)]
pub struct ComplianceChecker {
    ctx: Arc<AgentContext>,
}

impl ComplianceChecker {
    pub fn new(ctx: Arc<AgentContext>) -> Self {
        Self { ctx }
    }

    pub fn known_regulations() -> Vec<&'static str> {
        let mut names: Vec<&'static str> = REQUIREMENTS.iter().map(|r| r.regulation).collect();
        names.dedup();
        names
    }

    pub fn check(&self, request: &AnalysisRequest) -> Result<ComplianceReport> {
        let started = Instant::now();
        request.validate()?;
        let requested = normalize_regulations(&request.options.regulations)?;
        let weights = &self.ctx.weights.compliance;

        let mut checks = Vec::new();
        let mut samples = Vec::new();
        let mut findings = Vec::new();
        for compiled in COMPILED
            .iter()
            .filter(|c| requested.contains(&c.rule.regulation))
        {
            let rule = compiled.rule;
            let hit = compiled.regex.find(&request.text);
            let passed = hit.is_some();
            let weight = weights.weight(rule.category) * rule.severity.multiplier();
            samples.push(WeightedSample::new(
                if passed { 100.0 } else { 0.0 },
                weight,
            ));
            if !passed {
                findings.push(
                    Finding::new(
                        rule.category,
                        rule.severity,
                        CHECK_CONFIDENCE,
                        format!("{}: {} not addressed", rule.regulation, rule.requirement),
                    )
                    .with_mitigation(rule.mitigation),
                );
            }
            checks.push(ComplianceCheck {
                regulation: rule.regulation.to_string(),
                requirement: rule.requirement.to_string(),
                passed,
                severity: rule.severity,
                category: rule.category,
                location: hit.map(|m| m.start()),
            });
        }

        let compliance_score = weighted_average(&samples, COMPLIANCE_EMPTY_SCORE);
        let status = ComplianceStatus::from_score(compliance_score);
        // Failed checks first, worst severity first; order is stable so
        // truncation is reproducible.
        checks.sort_by(|a, b| a.passed.cmp(&b.passed).then(b.severity.cmp(&a.severity)));
        checks.truncate(MAX_CHECKS);
        let confidence = evidence_confidence(samples.len(), CHECK_CONFIDENCE, false);
        let recommendations =
            derive_recommendations(&findings, "compliance", MAX_RECOMMENDATIONS);
        let findings = truncate_findings(findings, MAX_ISSUES);

        Ok(ComplianceReport {
            compliance_score,
            status,
            checks,
            findings,
            recommendations,
            confidence,
            generated_at: Utc::now(),
            processing_time_ms: started.elapsed().as_millis() as u64,
        })
    }
}

fn normalize_regulations(requested: &[String]) -> Result<Vec<&'static str>> {
    if requested.is_empty() {
        return Ok(ComplianceChecker::known_regulations());
    }
    let mut out = Vec::new();
    for name in requested {
        let normalized = name.trim().to_lowercase().replace('-', "_");
        let known = ComplianceChecker::known_regulations()
            .into_iter()
            .find(|r| *r == normalized);
        match known {
            Some(regulation) => {
                if !out.contains(&regulation) {
                    out.push(regulation);
                }
            }
            None => {
                return Err(AnalysisError::Validation(format!(
                    "unknown regulation {name}"
                )))
            }
        }
    }
    Ok(out)
}
