use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// One completion call. The model is chosen by the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub max_tokens: u32,
    pub temperature: f32,
    pub messages: Vec<Message>,
}

/// Text-completion service. Returns the text of the first content block.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
}

pub struct LlmClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl LlmClient {
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| dotenv::var(key).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_key = var("API_KEY_ANTHROPIC")
            .filter(|k| !k.trim().is_empty())
            .context("API_KEY_ANTHROPIC must be set to an Anthropic API key")?;
        let base_url =
            var("LLM_BASE_URL").unwrap_or_else(|| "https://api.anthropic.com".to_string());
        let model = var("LLM_MODEL").unwrap_or_else(|| "claude-3-5-sonnet-20241022".to_string());
        let timeout_secs = var("LLM_TIMEOUT_SECS")
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(120);

        Self::new(base_url, model, api_key, timeout_secs)
    }

    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            model: model.into(),
            api_key: api_key.into(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Resolve the messages endpoint from the base URL.
    fn endpoint(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        if base.ends_with("/v1/messages") {
            base.to_string()
        } else if base.ends_with("/v1") {
            format!("{}/messages", base)
        } else {
            format!("{}/v1/messages", base)
        }
    }
}

#[async_trait]
impl ChatBackend for LlmClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
            "messages": request.messages,
        });

        let resp = self
            .client
            .post(self.endpoint())
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .context("LLM request failed")?;

        let status = resp.status();
        let text = resp.text().await.context("Failed to read LLM response")?;
        if !status.is_success() {
            anyhow::bail!("LLM returned {}: {}", status, text);
        }

        let parsed: MessagesResponse =
            serde_json::from_str(&text).context("Failed to parse LLM JSON")?;
        debug!(
            stop_reason = parsed.stop_reason.as_deref().unwrap_or("unknown"),
            blocks = parsed.content.len(),
            "LLM response received"
        );

        parsed
            .content
            .into_iter()
            .next()
            .and_then(|block| block.text)
            .context("LLM response had no text content block")
    }
}
