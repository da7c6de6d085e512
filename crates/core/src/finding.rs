use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Legal,
    Financial,
    Operational,
    Compliance,
    DataProtection,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Legal,
        Category::Financial,
        Category::Operational,
        Category::Compliance,
        Category::DataProtection,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Legal => "legal",
            Category::Financial => "financial",
            Category::Operational => "operational",
            Category::Compliance => "compliance",
            Category::DataProtection => "data_protection",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "legal" => Some(Category::Legal),
            "financial" => Some(Category::Financial),
            "operational" => Some(Category::Operational),
            "compliance" => Some(Category::Compliance),
            "data_protection" | "data-protection" => Some(Category::DataProtection),
            _ => None,
        }
    }
}

/// Ordinal severity; the derived order puts `Critical` highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Fixed contractual multipliers used by every scoring variant.
    pub fn multiplier(&self) -> f32 {
        match self {
            Severity::Critical => 3.0,
            Severity::High => 2.0,
            Severity::Medium => 1.5,
            Severity::Low => 1.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "critical" => Some(Severity::Critical),
            "high" => Some(Severity::High),
            "medium" => Some(Severity::Medium),
            "low" => Some(Severity::Low),
            _ => None,
        }
    }
}

/// A single detected fact: clause, risk factor, compliance gap, or vendor
/// risk. Immutable once produced by extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub category: Category,
    pub severity: Severity,
    pub confidence: f32,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mitigation: Option<String>,
}

impl Finding {
    pub fn new(
        category: Category,
        severity: Severity,
        confidence: f32,
        description: impl Into<String>,
    ) -> Self {
        Self {
            category,
            severity,
            confidence: confidence.clamp(0.0, 1.0),
            description: description.into(),
            location: None,
            mitigation: None,
        }
    }

    pub fn at(mut self, location: usize) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_mitigation(mut self, text: impl Into<String>) -> Self {
        self.mitigation = Some(text.into());
        self
    }
}
