use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{anyhow, Result};
use serde::Deserialize;

use clausewise_agents::WeightSettings;
use clausewise_llm::{LlmClient, LlmProvider, DEFAULT_TIMEOUT_MS};

#[derive(Debug, Clone)]
pub struct CliConfig {
    pub provider: LlmProvider,
    pub model: String,
    pub timeout_ms: u64,
}

impl CliConfig {
    pub fn from_env() -> Result<Self> {
        let provider_name =
            env::var("CLAUSEWISE_PROVIDER").unwrap_or_else(|_| "local".to_string());
        let provider = LlmProvider::from_str(&provider_name)
            .ok_or_else(|| anyhow!(format!("unknown provider {provider_name}")))?;
        let model = env::var("CLAUSEWISE_MODEL")
            .unwrap_or_else(|_| provider.default_model().to_string());
        let timeout_ms = env::var("CLAUSEWISE_LLM_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_MS);
        Ok(Self {
            provider,
            model,
            timeout_ms,
        })
    }

    pub fn build_client(&self) -> Result<LlmClient> {
        Ok(LlmClient::new(self.provider, self.model.clone())?
            .with_timeout(Duration::from_millis(self.timeout_ms)))
    }
}

/// Weight overrides from `clausewise.toml` (or `CLAUSEWISE_CONFIG`), falling
/// back silently to the built-in defaults.
pub fn load_weight_settings() -> WeightSettings {
    let config_path =
        env::var("CLAUSEWISE_CONFIG").unwrap_or_else(|_| "clausewise.toml".to_string());
    let path = Path::new(&config_path);
    if !path.exists() {
        return WeightSettings::default();
    }
    match fs::read_to_string(path) {
        Ok(contents) => toml::from_str::<CliFileConfig>(&contents)
            .map(|cfg| cfg.weights)
            .unwrap_or_default(),
        Err(_) => WeightSettings::default(),
    }
}

#[derive(Debug, Default, Deserialize)]
struct CliFileConfig {
    #[serde(default)]
    weights: WeightSettings,
}
