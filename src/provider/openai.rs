//! OpenAI-compatible HTTP provider (`/v1/chat/completions`, `/v1/embeddings`).

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::{CompletionProvider, CompletionRequest};
use crate::config::ProviderConfig;
use crate::error::ProviderError;

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

pub struct OpenAiProvider {
    base_url: String,
    summary_model: String,
    embedding_model: String,
    dimensions: usize,
    max_tokens: u32,
    api_key: Option<SecretString>,
    http_client: reqwest::Client,
}

impl OpenAiProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            summary_model: config.summary_model.clone(),
            embedding_model: config.embedding_model.clone(),
            dimensions: config.embedding_dim,
            max_tokens: config.summary_max_tokens,
            api_key: config
                .api_key
                .as_deref()
                .filter(|k| !k.trim().is_empty())
                .map(|k| SecretString::from(k.to_string())),
            http_client,
        })
    }

    fn chat_body(&self, request: &CompletionRequest) -> ChatRequest {
        let mut messages = Vec::new();
        if let Some(ref system) = request.system_prompt {
            messages.push(ChatMessage {
                role: "system".to_string(),
                content: system.clone(),
            });
        }
        messages.push(ChatMessage {
            role: "user".to_string(),
            content: request.prompt.clone(),
        });

        ChatRequest {
            model: self.summary_model.clone(),
            messages,
            max_tokens: request.max_tokens.unwrap_or(self.max_tokens),
        }
    }

    /// POST `body` to `path` and return the raw response text on 2xx.
    async fn post<B: Serialize + Sync>(&self, path: &str, body: &B) -> Result<String, ProviderError> {
        let key = self.api_key.as_ref().ok_or(ProviderError::MissingApiKey)?;
        let url = format!("{}{path}", self.base_url);

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(key.expose_secret())
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(ProviderError::Api {
                status: status.as_u16(),
                body: text,
            });
        }
        Ok(text)
    }
}

/// Extract the first choice's message text.
fn parse_chat_response(body: &str) -> Result<String, ProviderError> {
    let response: ChatResponse =
        serde_json::from_str(body).map_err(|e| ProviderError::Malformed(e.to_string()))?;
    response
        .choices
        .into_iter()
        .next()
        .map(|c| c.message.content)
        .ok_or_else(|| ProviderError::Malformed("no choices in completion response".into()))
}

/// Extract the first embedding and check its length.
fn parse_embedding_response(body: &str, expected: usize) -> Result<Vec<f32>, ProviderError> {
    let response: EmbeddingResponse =
        serde_json::from_str(body).map_err(|e| ProviderError::Malformed(e.to_string()))?;
    let embedding = response
        .data
        .into_iter()
        .next()
        .map(|d| d.embedding)
        .ok_or_else(|| ProviderError::Malformed("no data in embedding response".into()))?;

    if embedding.len() != expected {
        return Err(ProviderError::Dimension {
            expected,
            actual: embedding.len(),
        });
    }
    Ok(embedding)
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<String, ProviderError> {
        let body = self.chat_body(&request);
        let text = self.post("/v1/chat/completions", &body).await?;
        parse_chat_response(&text)
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        let body = EmbeddingRequest {
            model: &self.embedding_model,
            input: text,
        };
        let response = self.post("/v1/embeddings", &body).await?;
        parse_embedding_response(&response, self.dimensions)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_name(&self) -> &str {
        &self.embedding_model
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}
