use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use fieldwise_core::config::LlmConfig;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Returns the raw content of the model's reply.
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;
}

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("failed to build llm http client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("llm request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("llm endpoint returned status {0}")]
    Status(StatusCode),
    #[error("llm response had no message content")]
    EmptyCompletion,
    #[error("llm reply is not a JSON object: {0}")]
    MalformedReply(String),
}

/// Client for any OpenAI-compatible `/chat/completions` endpoint (Groq, OpenAI, Ollama).
pub struct ChatCompletionsClient {
    http: Client,
    endpoint: String,
    api_key: Option<SecretString>,
    model: String,
    temperature: f32,
}

impl ChatCompletionsClient {
    pub fn from_config(config: &LlmConfig) -> Result<Self, AgentError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(AgentError::Client)?;

        Ok(Self {
            http,
            endpoint: format!("{}/chat/completions", config.endpoint_base()),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn send(&self, request: &CompletionRequest) -> Result<String, AgentError> {
        let body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage { role: "system", content: &request.system },
                ChatMessage { role: "user", content: &request.user },
            ],
            response_format: json!({ "type": "json_object" }),
            temperature: self.temperature,
        };

        let mut builder = self.http.post(&self.endpoint).json(&body);
        if let Some(api_key) = &self.api_key {
            builder = builder.bearer_auth(api_key.expose_secret());
        }

        let response = builder.send().await.map_err(AgentError::Transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(AgentError::Status(status));
        }

        let completion: ChatResponse = response.json().await.map_err(AgentError::Transport)?;
        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(AgentError::EmptyCompletion)
    }
}

#[async_trait]
impl LlmClient for ChatCompletionsClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        Ok(self.send(request).await?)
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    response_format: serde_json::Value,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}
