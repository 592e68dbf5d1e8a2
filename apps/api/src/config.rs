use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::generation::builder::DEFAULT_SOFT_LIMIT_CHARS;
use crate::generation::request::{GenerationKind, ModelParams, MAX_TEMPERATURE};
use crate::llm_client::{ApiKey, DEFAULT_API_URL, DEFAULT_MODEL, DEFAULT_TIMEOUT};
use crate::usage::DEFAULT_DAILY_LIMIT;

/// Application configuration loaded from environment variables.
/// Every variable is optional; a missing API key only disables server-billed generation.
#[derive(Clone)]
pub struct Config {
    pub api_key: Option<ApiKey>,
    pub api_url: String,
    pub model: ModelSettings,
    pub completion_timeout: Duration,
    pub daily_request_limit: u32,
    pub prompt_soft_limit_chars: usize,
    pub port: u16,
    pub rust_log: String,
}

/// Model name plus optional overrides of the per-kind output length and temperature.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSettings {
    pub model: String,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_tokens: None,
            temperature: None,
        }
    }
}

impl ModelSettings {
    pub fn params_for(&self, kind: GenerationKind) -> ModelParams {
        ModelParams {
            model: self.model.clone(),
            max_tokens: self.max_tokens.unwrap_or_else(|| kind.default_max_tokens()),
            temperature: self
                .temperature
                .unwrap_or_else(|| kind.default_temperature()),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let max_tokens = parse_optional::<u32>(var("MAX_TOKENS"), "MAX_TOKENS")?;
        if max_tokens == Some(0) {
            bail!("MAX_TOKENS must be greater than zero");
        }

        let temperature = parse_optional::<f32>(var("TEMPERATURE"), "TEMPERATURE")?;
        if let Some(t) = temperature {
            if !(0.0..=MAX_TEMPERATURE).contains(&t) {
                bail!("TEMPERATURE must be between 0.0 and {MAX_TEMPERATURE}, got {t}");
            }
        }

        let timeout_secs =
            parse_optional::<u64>(var("COMPLETION_TIMEOUT_SECS"), "COMPLETION_TIMEOUT_SECS")?;
        if timeout_secs == Some(0) {
            bail!("COMPLETION_TIMEOUT_SECS must be greater than zero");
        }

        Ok(Config {
            api_key: var("OPENAI_API_KEY").and_then(ApiKey::new),
            api_url: var("OPENAI_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            model: ModelSettings {
                model: var("DEFAULT_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                max_tokens,
                temperature,
            },
            completion_timeout: timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_TIMEOUT),
            daily_request_limit: parse_optional(var("DAILY_REQUEST_LIMIT"), "DAILY_REQUEST_LIMIT")?
                .unwrap_or(DEFAULT_DAILY_LIMIT),
            prompt_soft_limit_chars: parse_optional(
                var("PROMPT_SOFT_LIMIT_CHARS"),
                "PROMPT_SOFT_LIMIT_CHARS",
            )?
            .unwrap_or(DEFAULT_SOFT_LIMIT_CHARS),
            port: parse_optional(var("PORT"), "PORT")
                .context("PORT must be a valid port number")?
                .unwrap_or(8080),
            rust_log: var("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("completion_timeout", &self.completion_timeout)
            .field("daily_request_limit", &self.daily_request_limit)
            .field("prompt_soft_limit_chars", &self.prompt_soft_limit_chars)
            .field("port", &self.port)
            .field("rust_log", &self.rust_log)
            .finish()
    }
}

fn parse_optional<T>(value: Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .with_context(|| format!("Environment variable '{key}' has an invalid value '{raw}'"))
        })
        .transpose()
}
