//! OpenAI-compatible chat-completions client.
//!
//! Works against any server exposing `POST <api_base>/chat/completions`
//! (OpenAI, vLLM, LM Studio, llama.cpp server, OpenRouter).

use std::sync::OnceLock;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::llm::{ChatMessage, LlmClient};

/// Connection and sampling settings for [`OpenAiCompatClient`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Bearer token; omitted from requests when empty.
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
}

fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_temperature() -> f64 {
    0.2
}

impl Default for LlmConfig {
    fn default() -> Self {
        LlmConfig {
            api_base: std::env::var("AGENTGRAPH_LLM_API_BASE")
                .unwrap_or_else(|_| default_api_base()),
            api_key: std::env::var("AGENTGRAPH_LLM_API_KEY").unwrap_or_default(),
            model: std::env::var("AGENTGRAPH_LLM_MODEL").unwrap_or_else(|_| default_model()),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

impl LlmConfig {
    /// Create config for a specific endpoint and model
    pub fn new(api_base: &str, model: &str) -> Self {
        LlmConfig {
            api_base: api_base.to_string(),
            api_key: String::new(),
            model: model.to_string(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }

    /// Set authentication token
    pub fn with_api_key(mut self, api_key: &str) -> Self {
        self.api_key = api_key.to_string();
        self
    }
}

/// Chat-completions client with suspending and blocking entry points.
pub struct OpenAiCompatClient {
    config: LlmConfig,
    http_client: reqwest::Client,
    blocking_client: OnceLock<reqwest::blocking::Client>,
}

impl OpenAiCompatClient {
    pub fn new(config: LlmConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("agentgraph/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to create HTTP client for chat completions")?;
        Ok(Self {
            config,
            http_client,
            blocking_client: OnceLock::new(),
        })
    }

    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    fn url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.api_base.trim_end_matches('/')
        )
    }

    fn request_body(&self, messages: &[ChatMessage]) -> serde_json::Value {
        serde_json::json!({
            "model": self.config.model,
            "messages": messages,
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
        })
    }

    fn blocking_client(&self) -> Result<&reqwest::blocking::Client> {
        if let Some(client) = self.blocking_client.get() {
            return Ok(client);
        }
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("agentgraph/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to create blocking HTTP client for chat completions")?;
        Ok(self.blocking_client.get_or_init(|| client))
    }
}

#[async_trait]
impl LlmClient for OpenAiCompatClient {
    fn generate(&self, messages: &[ChatMessage]) -> Result<String> {
        let url = self.url();
        debug!(url = %url, model = %self.config.model, "chat completion (blocking)");
        let mut request = self
            .blocking_client()?
            .post(&url)
            .json(&self.request_body(messages));
        if !self.config.api_key.is_empty() {
            request = request.bearer_auth(&self.config.api_key);
        }
        let response = request
            .send()
            .with_context(|| format!("request to {url} failed"))?;
        let status = response.status();
        let body = response.text()?;
        parse_completion(status, &body)
    }

    async fn generate_async(&self, messages: &[ChatMessage]) -> Result<String> {
        let url = self.url();
        debug!(url = %url, model = %self.config.model, "chat completion");
        let mut request = self
            .http_client
            .post(&url)
            .json(&self.request_body(messages));
        if !self.config.api_key.is_empty() {
            request = request.bearer_auth(&self.config.api_key);
        }
        let response = request
            .send()
            .await
            .with_context(|| format!("request to {url} failed"))?;
        let status = response.status();
        let body = response.text().await?;
        parse_completion(status, &body)
    }
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

fn parse_completion(status: reqwest::StatusCode, body: &str) -> Result<String> {
    if !status.is_success() {
        bail!("chat completion failed with {status}: {body}");
    }
    let parsed: CompletionResponse =
        serde_json::from_str(body).context("unexpected chat completion response")?;
    let choice = parsed
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("chat completion response has no choices"))?;
    Ok(choice.message.content.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    fn client(api_base: &str) -> OpenAiCompatClient {
        OpenAiCompatClient::new(LlmConfig::new(api_base, "test-model")).unwrap()
    }

    #[test]
    fn test_url_trims_trailing_slash() {
        assert_eq!(
            client("http://localhost:8000/v1/").url(),
            "http://localhost:8000/v1/chat/completions"
        );
    }

    #[test]
    fn test_request_body_carries_messages_and_sampling() {
        let body = client("http://localhost").request_body(&[
            ChatMessage::system("constraint"),
            ChatMessage::user("The task is: Q\n"),
        ]);
        assert_eq!(body["model"], "test-model");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "The task is: Q\n");
        assert_eq!(body["max_tokens"].as_u64(), Some(1024));
    }

    #[test]
    fn test_parse_completion_reads_first_choice() {
        let body = r#"{"choices": [{"message": {"role": "assistant", "content": "B"}}, {"message": {"content": "C"}}]}"#;
        assert_eq!(parse_completion(StatusCode::OK, body).unwrap(), "B");
    }

    #[test]
    fn test_parse_completion_null_content_is_empty() {
        let body = r#"{"choices": [{"message": {"content": null}}]}"#;
        assert_eq!(parse_completion(StatusCode::OK, body).unwrap(), "");
    }

    #[test]
    fn test_parse_completion_empty_choices_is_error() {
        let err = parse_completion(StatusCode::OK, r#"{"choices": []}"#).unwrap_err();
        assert!(err.to_string().contains("no choices"));
    }

    #[test]
    fn test_parse_completion_http_error_keeps_body() {
        let err = parse_completion(StatusCode::TOO_MANY_REQUESTS, "slow down").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("429"));
        assert!(msg.contains("slow down"));
    }
}
