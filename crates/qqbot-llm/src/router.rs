use std::sync::Arc;

use crate::error::{LlmError, Result};
use crate::gemini::GeminiProvider;
use crate::provider::LlmProvider;

/// The subset of `AgentConfig` this crate needs, kept decoupled from
/// `qqbot-core` so `qqbot-llm` doesn't depend on the deployment-config
/// crate for a handful of strings.
pub struct ProvidersConfig {
    pub provider: Option<String>,
    pub gemini_base_url: Option<String>,
    pub gemini_api_key: Option<String>,
    pub gemini_model: Option<String>,
}

/// Builds the configured [`LlmProvider`] by name, failing explicitly on an
/// unrecognized one rather than silently defaulting.
pub fn from_name(cfg: &ProvidersConfig) -> Result<Arc<dyn LlmProvider>> {
    let name = cfg.provider.as_deref().unwrap_or("gemini");
    match name {
        "gemini" => {
            let base_url = cfg
                .gemini_base_url
                .clone()
                .ok_or(LlmError::MissingConfig { provider: "gemini", field: "gemini_base_url" })?;
            let api_key = cfg
                .gemini_api_key
                .clone()
                .ok_or(LlmError::MissingConfig { provider: "gemini", field: "gemini_api_key" })?;
            let model = cfg.gemini_model.clone().unwrap_or_else(|| "gemini-1.5-flash".to_string());
            Ok(Arc::new(GeminiProvider::new(base_url, api_key, model)))
        }
        other => Err(LlmError::UnknownProvider(other.to_string())),
    }
}
