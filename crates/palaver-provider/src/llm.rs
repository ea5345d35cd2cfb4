//! LLM backend abstraction and implementations.
//!
//! Defines an enum-based dispatch for LLM backends, avoiding the
//! dyn-compatibility issues with async trait methods. Concrete
//! implementations exist for OpenAI-compatible APIs and the Anthropic
//! Messages API. All backends communicate over HTTP via `reqwest`.
//!
//! Backends take the conversation context as a slice of [`ChatEntry`]
//! values and return the model's text reply; what the text means (a name,
//! a chat line) is the caller's concern.

use palaver_types::{ChatEntry, Role};

use crate::config::{BackendType, LlmConfig};
use crate::error::ProviderError;

// ---------------------------------------------------------------------------
// Unified backend enum (dyn-compatible alternative to async trait)
// ---------------------------------------------------------------------------

/// An LLM backend that can complete a conversation context.
///
/// Uses enum dispatch instead of trait objects because async methods
/// are not dyn-compatible in Rust.
pub enum LlmBackend {
    /// OpenAI-compatible chat completions API.
    OpenAi(OpenAiBackend),
    /// Anthropic Messages API.
    Anthropic(AnthropicBackend),
}

impl LlmBackend {
    /// Build the backend the configuration selects.
    pub fn from_config(config: &LlmConfig) -> Self {
        match config.backend_type {
            BackendType::OpenAi => Self::OpenAi(OpenAiBackend::new(config)),
            BackendType::Anthropic => Self::Anthropic(AnthropicBackend::new(config)),
        }
    }

    /// Send the context to the model and return the response text.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::LlmBackend`] if the HTTP call fails or the
    /// response cannot be extracted.
    pub async fn complete(&self, context: &[ChatEntry]) -> Result<String, ProviderError> {
        match self {
            Self::OpenAi(backend) => backend.complete(context).await,
            Self::Anthropic(backend) => backend.complete(context).await,
        }
    }

    /// Human-readable name for logging.
    pub const fn name(&self) -> &str {
        match self {
            Self::OpenAi(_) => "openai-compatible",
            Self::Anthropic(_) => "anthropic",
        }
    }
}

// ---------------------------------------------------------------------------
// OpenAI-compatible backend
// ---------------------------------------------------------------------------

/// Backend for OpenAI-compatible chat completions APIs.
///
/// Works with `OpenAI`, `DeepSeek`, and Ollama endpoints.
/// Sends requests to `{api_url}/chat/completions`.
pub struct OpenAiBackend {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl OpenAiBackend {
    /// Create a new `OpenAI`-compatible backend.
    pub fn new(config: &LlmConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        }
    }

    /// Send the context and return the response text.
    async fn complete(&self, context: &[ChatEntry]) -> Result<String, ProviderError> {
        let url = format!("{}/chat/completions", self.api_url);

        let messages: Vec<serde_json::Value> = context
            .iter()
            .map(|entry| {
                serde_json::json!({
                    "role": entry.role.as_str(),
                    "content": entry.content,
                })
            })
            .collect();

        let body = serde_json::json!({
            "model": self.model,
            "messages": messages,
            "temperature": 0.7,
            "max_tokens": 256
        });

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::LlmBackend(format!("OpenAI request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read error body".to_owned());
            return Err(ProviderError::LlmBackend(format!(
                "OpenAI returned {status}: {error_body}"
            )));
        }

        let json: serde_json::Value = response.json().await.map_err(|e| {
            ProviderError::LlmBackend(format!("OpenAI response parse failed: {e}"))
        })?;

        extract_openai_content(&json)
    }
}

/// Extract the text content from an `OpenAI` chat completions response.
fn extract_openai_content(json: &serde_json::Value) -> Result<String, ProviderError> {
    json.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(serde_json::Value::as_str)
        .map(ToOwned::to_owned)
        .ok_or_else(|| {
            ProviderError::LlmBackend(
                "OpenAI response missing choices[0].message.content".to_owned(),
            )
        })
}

// ---------------------------------------------------------------------------
// Anthropic Messages API backend
// ---------------------------------------------------------------------------

/// Backend for the Anthropic Messages API.
///
/// Anthropic uses a different request format from `OpenAI`:
/// - Uses `x-api-key` header instead of `Authorization: Bearer`
/// - System entries go into a top-level `system` field, not the messages
/// - Consecutive same-role messages are rejected, so runs are merged
/// - Response structure differs: `content[0].text`
pub struct AnthropicBackend {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl AnthropicBackend {
    /// Create a new Anthropic Messages API backend.
    pub fn new(config: &LlmConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        }
    }

    /// Send the context and return the response text.
    async fn complete(&self, context: &[ChatEntry]) -> Result<String, ProviderError> {
        let url = format!("{}/messages", self.api_url);
        let (system, messages) = split_for_anthropic(context);

        let body = serde_json::json!({
            "model": self.model,
            "max_tokens": 256,
            "system": system,
            "messages": messages
        });

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                ProviderError::LlmBackend(format!("Anthropic request failed: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read error body".to_owned());
            return Err(ProviderError::LlmBackend(format!(
                "Anthropic returned {status}: {error_body}"
            )));
        }

        let json: serde_json::Value = response.json().await.map_err(|e| {
            ProviderError::LlmBackend(format!("Anthropic response parse failed: {e}"))
        })?;

        extract_anthropic_content(&json)
    }
}

/// Split a context into the Anthropic shape: system entries concatenated
/// into one string, the rest as an alternating messages array with
/// consecutive same-role entries merged. Messages must open with a user
/// turn, so a leading assistant run gets an empty user message in front.
fn split_for_anthropic(context: &[ChatEntry]) -> (String, Vec<serde_json::Value>) {
    let mut system_lines: Vec<&str> = Vec::new();
    let mut turns: Vec<(Role, String)> = Vec::new();

    for entry in context {
        match entry.role {
            Role::System => system_lines.push(&entry.content),
            role => match turns.last_mut() {
                Some((last_role, content)) if *last_role == role => {
                    content.push('\n');
                    content.push_str(&entry.content);
                }
                _ => turns.push((role, entry.content.clone())),
            },
        }
    }

    if turns.first().is_some_and(|(role, _)| *role == Role::Assistant) {
        turns.insert(0, (Role::User, String::new()));
    }
    if turns.is_empty() {
        turns.push((Role::User, String::new()));
    }

    let messages = turns
        .into_iter()
        .map(|(role, content)| {
            serde_json::json!({"role": role.as_str(), "content": content})
        })
        .collect();

    (system_lines.join("\n"), messages)
}

/// Extract the text content from an Anthropic Messages API response.
fn extract_anthropic_content(json: &serde_json::Value) -> Result<String, ProviderError> {
    json.get("content")
        .and_then(|c| c.get(0))
        .and_then(|b| b.get("text"))
        .and_then(serde_json::Value::as_str)
        .map(ToOwned::to_owned)
        .ok_or_else(|| {
            ProviderError::LlmBackend("Anthropic response missing content[0].text".to_owned())
        })
}
