use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};

use crate::{LlmClient, LlmRequest, LlmResponse};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisTask {
    ContractReview,
    ComplianceCheck,
    VendorAssessment,
    NegotiationBrief,
}

impl AnalysisTask {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisTask::ContractReview => "contract_review",
            AnalysisTask::ComplianceCheck => "compliance_check",
            AnalysisTask::VendorAssessment => "vendor_assessment",
            AnalysisTask::NegotiationBrief => "negotiation_brief",
        }
    }

    fn system_prompt(&self) -> &'static str {
        match self {
            AnalysisTask::ContractReview => {
                "You are a contract analyst. Reply with a JSON object containing \
                 \"summary\" (string) and \"findings\" (array of objects with \
                 category, severity, confidence, description)."
            }
            AnalysisTask::ComplianceCheck => {
                "You are a regulatory compliance analyst. Reply with a JSON object \
                 containing \"summary\" (string) and \"findings\" (array of objects \
                 with category, severity, confidence, description)."
            }
            AnalysisTask::VendorAssessment => {
                "You are a vendor risk analyst. Reply with a JSON object containing \
                 \"summary\" (string) and \"findings\" (array of objects with \
                 category, severity, confidence, description)."
            }
            AnalysisTask::NegotiationBrief => {
                "You are a procurement negotiator. Reply with a JSON object \
                 containing \"summary\" (string) and \"objectives\" (array of strings)."
            }
        }
    }
}

/// What came back from the intelligence collaborator: parsed JSON when the
/// reply was (or contained) a JSON object, the raw text otherwise.
#[derive(Debug, Clone)]
pub enum AnalysisOutcome {
    Structured(Value),
    Raw(String),
}

impl AnalysisOutcome {
    pub fn summary(&self) -> Option<String> {
        match self {
            AnalysisOutcome::Structured(value) => value
                .get("summary")
                .and_then(|s| s.as_str())
                .map(str::to_string),
            AnalysisOutcome::Raw(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(first_words(trimmed, 60))
                }
            }
        }
    }
}

impl LlmClient {
    /// Run one analysis task over the text. Non-JSON replies degrade to
    /// `AnalysisOutcome::Raw`; the caller scrapes what it can from them.
    pub async fn analyze(&self, text: &str, task: AnalysisTask) -> Result<AnalysisOutcome> {
        let request = LlmRequest {
            system: Some(task.system_prompt().to_string()),
            user: format!("Analyze the following document.\n\n{text}"),
        };
        let response = self.chat(&request).await?;
        Ok(parse_outcome(&response.content))
    }
}

static FENCE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```(?:json)?\s*(\{.*?\})\s*```").expect("valid fence pattern")
});

/// Parse a model reply into a structured outcome. Tries, in order: the whole
/// reply as JSON, a fenced ```json block, the outermost brace window. Falls
/// back to the raw text.
pub fn parse_outcome(raw: &str) -> AnalysisOutcome {
    let trimmed = raw.trim();
    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        if value.is_object() || value.is_array() {
            return AnalysisOutcome::Structured(value);
        }
    }
    if let Some(caps) = FENCE_RE.captures(raw) {
        if let Some(block) = caps.get(1) {
            if let Ok(value) = serde_json::from_str::<Value>(block.as_str()) {
                return AnalysisOutcome::Structured(value);
            }
        }
    }
    if let (Some(start), Some(end)) = (raw.find('{'), raw.rfind('}')) {
        if start < end {
            if let Ok(value) = serde_json::from_str::<Value>(&raw[start..=end]) {
                return AnalysisOutcome::Structured(value);
            }
        }
    }
    AnalysisOutcome::Raw(raw.to_string())
}

/// Scrape `key: 42`-style numeric fields out of a free-text reply.
pub fn scrape_number(raw: &str, key: &str) -> Option<f64> {
    let pattern = format!(r"(?i){}\s*[:=]\s*([0-9]+(?:\.[0-9]+)?)", regex::escape(key));
    Regex::new(&pattern)
        .ok()?
        .captures(raw)?
        .get(1)?
        .as_str()
        .parse()
        .ok()
}

/// Scrape bullet-list items out of a free-text reply.
pub fn scrape_strings(raw: &str) -> Vec<String> {
    raw.lines()
        .filter_map(|line| {
            let trimmed = line.trim();
            trimmed
                .strip_prefix("- ")
                .or_else(|| trimmed.strip_prefix("* "))
                .map(|item| item.trim().to_string())
        })
        .filter(|item| !item.is_empty())
        .collect()
}

pub(crate) fn local_reply(req: &LlmRequest) -> LlmResponse {
    let body = req.user.splitn(2, "\n\n").nth(1).unwrap_or(&req.user);
    let summary = first_words(body, 40);
    let system = req.system.as_deref().unwrap_or("");
    let content = if system.contains("negotiator") {
        json!({ "summary": summary, "objectives": [] }).to_string()
    } else {
        json!({ "summary": summary, "findings": [] }).to_string()
    };
    LlmResponse {
        content,
        prompt_tokens: 0,
        completion_tokens: 0,
    }
}

fn first_words(text: &str, max_words: usize) -> String {
    let cleaned = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<&str>>()
        .join(" ");
    cleaned
        .split_whitespace()
        .take(max_words)
        .collect::<Vec<&str>>()
        .join(" ")
}
