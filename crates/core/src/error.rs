use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("invalid request: {0}")]
    Validation(String),
    #[error("extraction failed: {0}")]
    Extraction(String),
    #[error("{stage} timed out after {waited_ms}ms")]
    Timeout { stage: &'static str, waited_ms: u64 },
    #[error("aggregation invariant violated: {0}")]
    Aggregation(&'static str),
    #[error("other: {0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;

impl From<anyhow::Error> for AnalysisError {
    fn from(value: anyhow::Error) -> Self {
        Self::Other(value.to_string())
    }
}

impl AnalysisError {
    pub fn code(&self) -> &'static str {
        match self {
            AnalysisError::Validation(_) => "validation_failure",
            AnalysisError::Extraction(_) => "extraction_failure",
            AnalysisError::Timeout { .. } => "timeout_failure",
            AnalysisError::Aggregation(_) => "aggregation_failure",
            AnalysisError::Other(_) => "internal_error",
        }
    }
}
