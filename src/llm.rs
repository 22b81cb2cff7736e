//! Text-generation capability: the trait seam the workflow invokes, plus an
//! OpenAI-style Chat Completions client implementing it.
//!
//! The workflow never retries; bounded retry with backoff lives here, inside the
//! capability, which is also where timeout and error mapping happen.

use crate::{Result, TutorError};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

const MAX_RETRY_ATTEMPTS: u32 = 4;
const RETRY_BASE_DELAY_MS: u64 = 200;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

const DEFAULT_MODEL: &str = "gpt-4o";
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_TEMPERATURE: f32 = 0.0;

/// One role-tagged message on the capability wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

/// The text-generation capability: given an ordered list of role-tagged
/// messages, returns one role-tagged message. May fail; latency unbounded by
/// the caller (the implementation enforces its own timeout).
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, messages: &[ChatMessage]) -> Result<ChatMessage>;
}

// ─── Configuration ──────────────────────────────────────────────────

/// Partial config.toml for tutorloop.
#[derive(Debug, Default, Deserialize)]
struct ConfigToml {
    model: Option<String>,
    base_url: Option<String>,
    api_key: Option<String>,
    temperature: Option<f32>,
}

/// Client configuration resolved env-first with an optional config.toml.
///
/// Precedence per field: environment variable, then config file, then default.
/// The config file lives at `{home}/config.toml` where home is
/// `TUTORLOOP_HOME` or `~/.tutorloop`.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub model: String,
    pub base_url: String,
    pub api_key: Option<String>,
    pub temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

impl LlmConfig {
    /// Resolve configuration from the default home directory.
    pub async fn load() -> Result<Self> {
        Self::load_from(&Self::home_dir()?).await
    }

    /// Resolve configuration from `{home}/config.toml` plus the environment.
    pub async fn load_from(home: &Path) -> Result<Self> {
        let mut file_config = ConfigToml::default();
        let config_file = home.join("config.toml");
        if config_file.exists() {
            let content = tokio::fs::read_to_string(&config_file).await?;
            file_config = toml::from_str(&content)
                .map_err(|e| TutorError::Config(format!("invalid config.toml: {e}")))?;
        }

        let config = Self {
            model: std::env::var("TUTORLOOP_MODEL")
                .ok()
                .or(file_config.model)
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: std::env::var("OPENAI_BASE_URL")
                .ok()
                .or(file_config.base_url)
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key: std::env::var("OPENAI_API_KEY").ok().or(file_config.api_key),
            temperature: file_config.temperature.unwrap_or(DEFAULT_TEMPERATURE),
        };

        info!(
            "LLM config resolved: model='{}', base_url='{}', key={}",
            config.model,
            config.base_url,
            if config.api_key.is_some() { "set" } else { "missing" }
        );

        Ok(config)
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Tutorloop home directory: `TUTORLOOP_HOME` or `~/.tutorloop`.
    pub fn home_dir() -> Result<PathBuf> {
        if let Ok(home) = std::env::var("TUTORLOOP_HOME") {
            return Ok(PathBuf::from(home));
        }
        let home = dirs::home_dir()
            .ok_or_else(|| TutorError::Config("could not find home directory".to_string()))?;
        Ok(home.join(".tutorloop"))
    }
}

// ─── Chat Completions API types ─────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

// ─── Client ─────────────────────────────────────────────────────────

/// Chat Completions client over `reqwest`.
#[derive(Debug)]
pub struct OpenAiClient {
    client: Client,
    model: String,
    base_url: String,
    api_key: String,
    temperature: f32,
}

impl OpenAiClient {
    /// Build a client from resolved configuration. A missing API key is a
    /// configuration error here, before any request is made.
    pub fn new(config: LlmConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .ok_or_else(|| TutorError::Config("no API key configured (set OPENAI_API_KEY)".to_string()))?;

        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .connect_timeout(Duration::from_secs(15))
            .user_agent("tutorloop/0.1.0")
            .build()
            .unwrap_or_else(|_| Client::new());

        Ok(Self {
            client,
            model: config.model,
            base_url: config.base_url,
            api_key,
            temperature: config.temperature,
        })
    }

    /// Exponential backoff with jitter.
    fn retry_backoff(attempt: u32) -> Duration {
        let exp = 2u64.saturating_pow(attempt.saturating_sub(1));
        let base_ms = RETRY_BASE_DELAY_MS.saturating_mul(exp);
        let jitter = 1.0 + ((attempt as f64 * 0.37).sin() * 0.1);
        Duration::from_millis((base_ms as f64 * jitter) as u64)
    }

    fn is_retryable_status(status: reqwest::StatusCode) -> bool {
        status.is_server_error()
    }

    fn is_retryable_error(msg: &str) -> bool {
        msg.contains("timeout")
            || msg.contains("network")
            || msg.contains("retryable")
            || msg.contains("error sending request")
            || msg.contains("connection")
    }

    async fn send_request(&self, messages: &[ChatMessage]) -> Result<ChatMessage> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));

        let request = ChatRequest {
            model: self.model.clone(),
            messages: messages.to_vec(),
            max_tokens: 2048,
            temperature: self.temperature,
            stream: false,
        };

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(Self::map_reqwest_error)?;

        let response = Self::check_response_status(response).await?;

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| TutorError::Generation(e.to_string()))?;

        chat_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .ok_or_else(|| TutorError::Generation("response contained no choices".to_string()))
    }

    async fn check_response_status(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let detail = Self::truncate_error_detail(&Self::extract_error_detail(&body), 500);
        let prefix = if Self::is_retryable_status(status) {
            "retryable API error"
        } else {
            "API error"
        };
        if detail.is_empty() {
            Err(TutorError::Generation(format!("{prefix} {status}")))
        } else {
            Err(TutorError::Generation(format!("{prefix} {status}: {detail}")))
        }
    }

    fn extract_error_detail(body: &str) -> String {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            return String::new();
        }

        if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) {
            if let Some(msg) = value
                .get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
            {
                return msg.to_string();
            }
            if let Some(msg) = value.get("message").and_then(|m| m.as_str()) {
                return msg.to_string();
            }
        }

        trimmed.to_string()
    }

    fn truncate_error_detail(detail: &str, max_chars: usize) -> String {
        if detail.chars().count() <= max_chars {
            return detail.to_string();
        }

        let mut truncated = detail.chars().take(max_chars).collect::<String>();
        truncated.push_str("... [truncated]");
        truncated
    }

    fn map_reqwest_error(e: reqwest::Error) -> TutorError {
        if e.is_timeout() {
            TutorError::Generation(format!("timeout: {e}"))
        } else if e.is_connect() {
            TutorError::Generation(format!("network: {e}"))
        } else {
            TutorError::Generation(e.to_string())
        }
    }
}

#[async_trait]
impl TextGenerator for OpenAiClient {
    async fn generate(&self, messages: &[ChatMessage]) -> Result<ChatMessage> {
        debug!("Calling LLM with {} messages", messages.len());

        let mut last_err = None;
        for attempt in 0..MAX_RETRY_ATTEMPTS {
            if attempt > 0 {
                let delay = Self::retry_backoff(attempt);
                warn!(
                    "LLM request failed (attempt {}/{}), retrying in {:?}...",
                    attempt, MAX_RETRY_ATTEMPTS, delay
                );
                tokio::time::sleep(delay).await;
            }

            match self.send_request(messages).await {
                Ok(message) => {
                    debug!("LLM response length: {}", message.content.len());
                    return Ok(message);
                }
                Err(e) => {
                    let msg = e.to_string();
                    if Self::is_retryable_error(&msg) && attempt + 1 < MAX_RETRY_ATTEMPTS {
                        last_err = Some(e);
                        continue;
                    }
                    return Err(e);
                }
            }
        }

        Err(last_err
            .unwrap_or_else(|| TutorError::Generation("all retry attempts exhausted".to_string())))
    }
}
