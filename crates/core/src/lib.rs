mod classify;
mod error;
mod extract;
mod finding;
mod recommend;
mod report;
mod score;
mod weights;

pub use classify::{
    performance_grade, BandTable, ComplianceStatus, ConfidenceLevel, RiskLevel,
    COMPLIANCE_STATUS_BANDS, CONFIDENCE_BANDS, GRADE_BANDS, RISK_LEVEL_BANDS,
};
pub use error::{AnalysisError, Result};
pub use extract::{
    extract_clauses, extract_entities, extract_protections, extract_risks, missing_clauses,
    ContractEntities, ExtractionConfig,
};
pub use finding::{Category, Finding, Severity};
pub use recommend::{
    dedupe, derive_recommendations, sort_by_severity, truncate_findings, MAX_CHECKS, MAX_CLAUSES,
    MAX_ISSUES, MAX_RECOMMENDATIONS,
};
pub use report::{AnalysisDepth, AnalysisOptions, AnalysisRequest};
pub use score::{
    clamp_score, contribution, evidence_confidence, mean_confidence, risk_points,
    severity_penalty, vendor_overall, weighted_average, ScoreResult, VendorMetrics,
    WeightedSample, COMPLIANCE_EMPTY_SCORE, MISSING_CLAUSE_POINTS, PROTECTION_POINTS,
    RISK_EMPTY_SCORE, RISK_FINDING_POINTS,
};
pub use weights::{WeightTable, DEFAULT_WEIGHT};
