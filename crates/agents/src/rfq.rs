use std::cmp::Ordering;
use std::time::Instant;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use clausewise_core::{
    clamp_score, dedupe, evidence_confidence, performance_grade, weighted_average,
    AnalysisError, Result, ScoreResult, WeightedSample, MAX_RECOMMENDATIONS, RISK_EMPTY_SCORE,
};

#[derive(Debug, Clone, Deserialize)]
pub struct Criterion {
    pub name: String,
    pub weight: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Proposal {
    pub vendor: String,
    /// Criterion name -> score on the 0-100 scale. A criterion the vendor
    /// did not address scores 0.
    pub scores: IndexMap<String, f32>,
    #[serde(default)]
    pub price: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RfqRequest {
    pub title: String,
    pub criteria: Vec<Criterion>,
    pub proposals: Vec<Proposal>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProposalScore {
    pub vendor: String,
    pub score: ScoreResult,
    pub grade: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RfqReport {
    pub title: String,
    pub rankings: Vec<ProposalScore>,
    pub winner: Option<String>,
    pub recommendations: Vec<String>,
    pub generated_at: DateTime<Utc>,
    pub processing_time_ms: u64,
}

#[derive(Debug, Clone, Default)]
pub struct RfqEvaluator;

impl RfqEvaluator {
    pub fn new() -> Self {
        Self
    }

    pub fn evaluate(&self, request: &RfqRequest) -> Result<RfqReport> {
        let started = Instant::now();
        validate(request)?;

        let mut rankings = Vec::with_capacity(request.proposals.len());
        for proposal in &request.proposals {
            let mut components = IndexMap::new();
            let samples: Vec<WeightedSample> = request
                .criteria
                .iter()
                .map(|criterion| {
                    let raw = proposal
                        .scores
                        .get(&criterion.name)
                        .copied()
                        .unwrap_or(0.0);
                    let score = clamp_score(raw);
                    components.insert(criterion.name.clone(), score);
                    WeightedSample::new(score, criterion.weight)
                })
                .collect();
            let total = weighted_average(&samples, RISK_EMPTY_SCORE);
            let confidence = evidence_confidence(request.criteria.len(), 0.9, false);
            rankings.push(ProposalScore {
                vendor: proposal.vendor.clone(),
                score: ScoreResult::new(total, components, confidence)?,
                grade: performance_grade(total),
                price: proposal.price,
            });
        }

        // Score descending; vendor name breaks ties so repeated runs rank
        // identically.
        rankings.sort_by(|a, b| {
            b.score
                .total_score
                .partial_cmp(&a.score.total_score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.vendor.cmp(&b.vendor))
        });
        let winner = rankings.first().map(|p| p.vendor.clone());

        let mut recommendations = Vec::new();
        if let Some(best) = rankings.first() {
            recommendations.push(format!(
                "Award {} to {} (score {:.1}, grade {})",
                request.title, best.vendor, best.score.total_score, best.grade
            ));
            if let Some(cheapest) = request
                .proposals
                .iter()
                .filter(|p| p.price.is_some())
                .min_by(|a, b| {
                    a.price
                        .partial_cmp(&b.price)
                        .unwrap_or(Ordering::Equal)
                })
            {
                if cheapest.vendor != best.vendor {
                    recommendations.push(format!(
                        "Negotiate price with {}; {} bid lower",
                        best.vendor, cheapest.vendor
                    ));
                }
            }
        }
        for trailing in rankings.iter().filter(|p| p.score.total_score < 50.0) {
            recommendations.push(format!(
                "Decline {} unless the proposal is materially revised",
                trailing.vendor
            ));
        }
        let mut recommendations = dedupe(recommendations);
        recommendations.truncate(MAX_RECOMMENDATIONS);

        Ok(RfqReport {
            title: request.title.clone(),
            rankings,
            winner,
            recommendations,
            generated_at: Utc::now(),
            processing_time_ms: started.elapsed().as_millis() as u64,
        })
    }
}

fn validate(request: &RfqRequest) -> Result<()> {
    if request.title.trim().is_empty() {
        return Err(AnalysisError::Validation(
            "rfq title must not be empty".to_string(),
        ));
    }
    if request.criteria.is_empty() {
        return Err(AnalysisError::Validation(
            "at least one evaluation criterion is required".to_string(),
        ));
    }
    for criterion in &request.criteria {
        if !criterion.weight.is_finite() || criterion.weight <= 0.0 {
            return Err(AnalysisError::Validation(format!(
                "criterion {} must have a positive weight",
                criterion.name
            )));
        }
    }
    let duplicate = request
        .criteria
        .iter()
        .map(|c| c.name.as_str())
        .duplicates()
        .next();
    if let Some(name) = duplicate {
        return Err(AnalysisError::Validation(format!(
            "criterion {name} appears more than once"
        )));
    }
    if request.proposals.is_empty() {
        return Err(AnalysisError::Validation(
            "at least one proposal is required".to_string(),
        ));
    }
    for proposal in &request.proposals {
        for (criterion, score) in &proposal.scores {
            if !score.is_finite() || !(0.0..=100.0).contains(score) {
                return Err(AnalysisError::Validation(format!(
                    "proposal {} scores {criterion} outside 0-100",
                    proposal.vendor
                )));
            }
        }
    }
    Ok(())
}
