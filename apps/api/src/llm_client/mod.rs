//! Completion client, the single point of entry for every chat-completion call in Tailor.
//!
//! One request per call and NO automatic retry: the remote endpoint does not guarantee
//! idempotency, so a retried request may be billed twice. Callers decide whether to
//! retry after `RateLimited` or `Transport` failures.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::generation::request::ModelParams;

pub mod prompts;
pub mod transport;

use transport::{HttpTransport, ReqwestTransport, TransportError};

pub const DEFAULT_API_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error("No API key is configured for the completion provider")]
    MissingCredentials,

    #[error("Rate limited by the completion provider: {0}")]
    RateLimited(String),

    #[error("Completion quota exhausted: {0}")]
    QuotaExceeded(String),

    #[error("Could not reach the completion provider: {0}")]
    Transport(String),

    #[error("Completion failed: {0}")]
    Unknown(String),
}

impl GenerationError {
    /// Stable machine-readable code for the failure class.
    pub fn code(&self) -> &'static str {
        match self {
            GenerationError::MissingCredentials => "MISSING_CREDENTIALS",
            GenerationError::RateLimited(_) => "RATE_LIMITED",
            GenerationError::QuotaExceeded(_) => "QUOTA_EXCEEDED",
            GenerationError::Transport(_) => "TRANSPORT_ERROR",
            GenerationError::Unknown(_) => "UNKNOWN",
        }
    }
}

impl From<TransportError> for GenerationError {
    fn from(error: TransportError) -> Self {
        GenerationError::Transport(error.to_string())
    }
}

/// Classifies a failed completion call from its status (if any) and failure text.
///
/// Text markers win over status codes, and `rate_limit` is checked before `quota`.
/// A bare 429 without either marker is treated as rate limiting.
pub fn classify_failure(status: Option<u16>, message: &str) -> GenerationError {
    let lower = message.to_lowercase();
    if lower.contains("rate_limit") {
        GenerationError::RateLimited(message.to_string())
    } else if lower.contains("quota") {
        GenerationError::QuotaExceeded(message.to_string())
    } else if status == Some(429) {
        GenerationError::RateLimited(message.to_string())
    } else {
        GenerationError::Unknown(message.to_string())
    }
}

/// A provider API key, stored trimmed. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Returns `None` for blank input.
    pub fn new(key: impl Into<String>) -> Option<Self> {
        let key = key.into().trim().to_string();
        (!key.is_empty()).then_some(Self(key))
    }

    fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    error: ProviderErrorBody,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    message: String,
    #[serde(rename = "type")]
    error_type: Option<String>,
    code: Option<String>,
}

/// Turns an error response body into a message that keeps the provider's type and
/// code markers visible to `classify_failure`.
fn provider_error_message(status: u16, body: &str) -> String {
    match serde_json::from_str::<ProviderError>(body) {
        Ok(ProviderError { error }) => {
            let mut message = error.message;
            if let Some(error_type) = error.error_type {
                message.push_str(&format!(" (type: {error_type})"));
            }
            if let Some(code) = error.code {
                message.push_str(&format!(" (code: {code})"));
            }
            message
        }
        Err(_) if body.trim().is_empty() => format!("HTTP {status} with empty body"),
        Err(_) => body.trim().to_string(),
    }
}

/// The single completion client used by the generation pipeline.
/// Cheap to clone; clones share the underlying transport.
#[derive(Clone)]
pub struct CompletionClient {
    transport: Arc<dyn HttpTransport>,
    api_url: String,
    api_key: Option<ApiKey>,
    timeout: Duration,
}

impl CompletionClient {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        api_url: impl Into<String>,
        api_key: Option<ApiKey>,
        timeout: Duration,
    ) -> Self {
        Self {
            transport,
            api_url: api_url.into(),
            api_key,
            timeout,
        }
    }

    /// Builds the production client from configuration.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let transport = ReqwestTransport::new()?;
        Ok(Self::new(
            Arc::new(transport),
            config.api_url.clone(),
            config.api_key.clone(),
            config.completion_timeout,
        ))
    }

    /// Returns a client that authenticates with `api_key` instead of the configured one.
    pub fn with_api_key(&self, api_key: ApiKey) -> Self {
        Self {
            api_key: Some(api_key),
            ..self.clone()
        }
    }

    pub fn has_credentials(&self) -> bool {
        self.api_key.is_some()
    }

    /// Sends one chat-completion request and returns the trimmed completion text.
    ///
    /// Fails fast with `MissingCredentials` before any network call when no key is set.
    #[tracing::instrument(skip_all, fields(model = %params.model, max_tokens = params.max_tokens))]
    pub async fn generate(
        &self,
        system_role: &str,
        user_prompt: &str,
        params: &ModelParams,
    ) -> Result<String, GenerationError> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or(GenerationError::MissingCredentials)?;

        let request = ChatRequest {
            model: &params.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system_role,
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
            max_tokens: params.max_tokens,
            temperature: params.temperature,
        };
        let body = serde_json::to_value(&request)
            .map_err(|e| GenerationError::Unknown(format!("could not encode request: {e}")))?;

        let response = self
            .transport
            .post_json(&self.api_url, api_key.expose(), &body, self.timeout)
            .await
            .map_err(|e| {
                warn!("Completion transport failure: {e}");
                GenerationError::from(e)
            })?;

        if !response.is_success() {
            let message = provider_error_message(response.status, &response.body);
            let error = classify_failure(Some(response.status), &message);
            warn!(
                "Completion provider returned {} ({}): {}",
                response.status,
                error.code(),
                message
            );
            return Err(error);
        }

        let parsed: ChatResponse = serde_json::from_str(&response.body).map_err(|e| {
            GenerationError::Unknown(format!("unreadable completion response: {e}"))
        })?;

        if let Some(usage) = &parsed.usage {
            debug!(
                "Completion succeeded: prompt_tokens={}, completion_tokens={}",
                usage.prompt_tokens, usage.completion_tokens
            );
        }

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| GenerationError::Unknown("completion contained no text".to_string()))?;

        info!("Completion returned {} chars", text.chars().count());
        Ok(text)
    }
}
