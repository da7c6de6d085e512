use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};
use crate::finding::Category;

const MAX_TEXT_CHARS: usize = 2_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisDepth {
    /// Pattern extraction only; no external intelligence call.
    Quick,
    /// Pattern extraction plus best-effort LLM enrichment.
    #[default]
    Standard,
    /// LLM enrichment is mandatory; its failure fails the analysis.
    Deep,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisOptions {
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub regulations: Vec<String>,
    #[serde(default)]
    pub depth: AnalysisDepth,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub text: String,
    #[serde(default)]
    pub options: AnalysisOptions,
}

impl AnalysisRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            options: AnalysisOptions::default(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.text.trim().is_empty() {
            return Err(AnalysisError::Validation(
                "text must not be empty".to_string(),
            ));
        }
        if self.text.chars().count() > MAX_TEXT_CHARS {
            return Err(AnalysisError::Validation(format!(
                "text exceeds {MAX_TEXT_CHARS} characters"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_text_is_rejected() {
        let request = AnalysisRequest::new("   \n ");
        assert!(matches!(
            request.validate(),
            Err(AnalysisError::Validation(_))
        ));
    }

    #[test]
    fn default_depth_is_standard() {
        let request: AnalysisRequest = serde_json::from_str(r#"{"text":"hello"}"#).unwrap();
        assert_eq!(request.options.depth, AnalysisDepth::Standard);
        assert!(request.validate().is_ok());
    }
}
