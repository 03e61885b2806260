//! Completion provider seam: short text completions and text embeddings.
//!
//! The pipelines only see [`CompletionProvider`]. [`create_provider`] builds
//! the configured implementation; tests substitute their own.

pub mod openai;

use anyhow::Result;
use async_trait::async_trait;

use crate::config::ProviderConfig;
use crate::error::ProviderError;

/// One completion call: an optional instruction plus the user text.
#[derive(Debug, Clone, Default)]
pub struct CompletionRequest {
    pub system_prompt: Option<String>,
    pub prompt: String,
    pub max_tokens: Option<u32>,
}

#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Return the generated text for `request`.
    async fn complete(&self, request: CompletionRequest) -> Result<String, ProviderError>;

    /// Embed `text` into a vector of [`dimensions`](Self::dimensions) floats.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError>;

    fn dimensions(&self) -> usize;

    /// Identifier of the embedding model, recorded alongside stored vectors.
    fn model_name(&self) -> &str;

    /// False when calls are certain to fail for lack of credentials.
    fn is_configured(&self) -> bool {
        true
    }
}

/// Create the completion provider named in config.
///
/// Currently only `"openai"` (any OpenAI-compatible endpoint) is supported.
pub fn create_provider(config: &ProviderConfig) -> Result<Box<dyn CompletionProvider>> {
    match config.provider.as_str() {
        "openai" => {
            let provider = openai::OpenAiProvider::new(config)?;
            Ok(Box::new(provider))
        }
        other => anyhow::bail!("unknown completion provider: {other}. Supported: openai"),
    }
}
