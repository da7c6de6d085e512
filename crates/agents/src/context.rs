use std::sync::Arc;

use serde::Deserialize;

use clausewise_core::WeightTable;
use clausewise_llm::LlmClient;

/// Category weight tables, one per analysis flavor. Loaded once at startup
/// (optionally from `clausewise.toml`) and never mutated per request.
#[derive(Debug, Clone, Deserialize)]
pub struct WeightSettings {
    #[serde(default = "WeightTable::contract_default")]
    pub contract: WeightTable,
    #[serde(default = "WeightTable::compliance_default")]
    pub compliance: WeightTable,
}

impl Default for WeightSettings {
    fn default() -> Self {
        Self {
            contract: WeightTable::contract_default(),
            compliance: WeightTable::compliance_default(),
        }
    }
}

/// Shared analyzer state, built once in `main` and injected into every
/// agent. Replaces per-service module singletons.
pub struct AgentContext {
    pub llm: Option<LlmClient>,
    pub weights: WeightSettings,
}

impl AgentContext {
    pub fn new(llm: Option<LlmClient>, weights: WeightSettings) -> Arc<Self> {
        Arc::new(Self { llm, weights })
    }

    /// Pure pattern extraction, no intelligence collaborator.
    pub fn offline() -> Arc<Self> {
        Self::new(None, WeightSettings::default())
    }

    /// Deterministic local provider; useful for tests and offline runs.
    pub fn with_local_llm() -> Arc<Self> {
        Self::new(Some(LlmClient::local()), WeightSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clausewise_core::Category;

    #[test]
    fn weight_settings_default_when_fields_absent() {
        let settings: WeightSettings = toml::from_str("").unwrap();
        assert_eq!(settings.contract.weight(Category::Legal), 1.2);
        assert_eq!(settings.compliance.weight(Category::Compliance), 1.2);
    }

    #[test]
    fn weight_settings_accept_partial_overrides() {
        let settings: WeightSettings =
            toml::from_str("[contract]\nlegal = 2.0\n").unwrap();
        assert_eq!(settings.contract.weight(Category::Legal), 2.0);
        assert_eq!(settings.compliance.weight(Category::Compliance), 1.2);
    }
}
