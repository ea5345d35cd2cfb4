//! LLM backend configuration loaded from environment variables.
//!
//! Defaults target a local Ollama instance, so the simulation runs out of
//! the box with no keys configured.

use crate::error::ProviderError;

/// Which API shape the backend speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendType {
    /// OpenAI-compatible chat completions (OpenAI, DeepSeek, Ollama).
    OpenAi,
    /// Anthropic Messages API.
    Anthropic,
}

/// Connection settings for one LLM backend.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Which API shape to speak.
    pub backend_type: BackendType,
    /// Base URL of the API, without the endpoint path.
    pub api_url: String,
    /// API key; may be blank for local endpoints.
    pub api_key: String,
    /// Model identifier passed through in the request body.
    pub model: String,
}

impl LlmConfig {
    /// Load backend settings from environment variables.
    ///
    /// Environment variables (all optional):
    /// - `PALAVER_LLM_BACKEND` -- `openai` or `anthropic` (default `openai`)
    /// - `PALAVER_LLM_API_URL` -- base URL (default `http://localhost:11434/v1`)
    /// - `PALAVER_LLM_API_KEY` -- API key (default blank)
    /// - `PALAVER_LLM_MODEL` -- model name (default `llama3.1`)
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Config`] if `PALAVER_LLM_BACKEND` is set to
    /// an unrecognized value.
    pub fn from_env() -> Result<Self, ProviderError> {
        let backend_str = std::env::var("PALAVER_LLM_BACKEND")
            .unwrap_or_else(|_| "openai".to_owned());
        let backend_type = match backend_str.to_lowercase().as_str() {
            "openai" => BackendType::OpenAi,
            "anthropic" => BackendType::Anthropic,
            other => {
                return Err(ProviderError::Config(format!(
                    "unknown PALAVER_LLM_BACKEND '{other}' (expected 'openai' or 'anthropic')"
                )));
            }
        };

        let api_url = std::env::var("PALAVER_LLM_API_URL")
            .unwrap_or_else(|_| "http://localhost:11434/v1".to_owned());
        let api_key = std::env::var("PALAVER_LLM_API_KEY").unwrap_or_default();
        let model =
            std::env::var("PALAVER_LLM_MODEL").unwrap_or_else(|_| "llama3.1".to_owned());

        Ok(Self {
            backend_type,
            api_url,
            api_key,
            model,
        })
    }
}
