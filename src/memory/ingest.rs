//! Ingestion pipeline: validate input, derive summary and embedding, persist.
//!
//! Provider calls are best effort. A failed summary falls back to a truncated
//! prefix of the content and a failed embedding is stored as `NULL`; neither
//! is ever surfaced to the caller. Store failures are.

use crate::error::{MemoryError, ProviderError};
use crate::memory::types::{Category, Memory, MemoryInput, MemoryType};
use crate::provider::{CompletionProvider, CompletionRequest};
use crate::store::{MemoryStore, MemoryUpdate, NewMemory};

/// Upper bound on summary length, in characters.
pub const SUMMARY_MAX_CHARS: usize = 150;

/// Instruction sent ahead of the content when asking for a summary.
pub const SUMMARY_INSTRUCTION: &str = "You are a summarization assistant. Create a concise summary \
     (max 150 characters) of the following content.";

/// Input after validation: required fields present, labels parsed.
#[derive(Debug)]
struct ValidInput {
    title: String,
    content: String,
    category: Option<Category>,
    memory_type: Option<MemoryType>,
    tags: Option<Vec<String>>,
    has_reminder: Option<bool>,
    source_url: Option<String>,
}

fn validate(input: MemoryInput) -> Result<ValidInput, MemoryError> {
    if input.title.trim().is_empty() || input.content.trim().is_empty() {
        return Err(MemoryError::Validation(
            "Title and content are required".to_string(),
        ));
    }

    let category = input
        .category
        .as_deref()
        .map(str::parse::<Category>)
        .transpose()
        .map_err(MemoryError::Validation)?;
    let memory_type = input
        .memory_type
        .as_deref()
        .map(str::parse::<MemoryType>)
        .transpose()
        .map_err(MemoryError::Validation)?;

    Ok(ValidInput {
        title: input.title,
        content: input.content,
        category,
        memory_type,
        tags: input.tags.map(|t| t.normalize()),
        has_reminder: input.has_reminder,
        source_url: input.source_url.filter(|u| !u.trim().is_empty()),
    })
}

/// First [`SUMMARY_MAX_CHARS`] characters of `content`, with `...` appended
/// when anything was cut.
pub fn fallback_summary(content: &str) -> String {
    let mut chars = content.chars();
    let head: String = chars.by_ref().take(SUMMARY_MAX_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

/// Unwrap a provider result, or log it at `warn` and substitute `fallback()`.
pub fn degrade<T>(
    result: Result<T, ProviderError>,
    what: &str,
    fallback: impl FnOnce() -> T,
) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(error = %e, what, "provider call failed, using fallback");
            fallback()
        }
    }
}

/// Ask the provider for a summary, clamped to [`SUMMARY_MAX_CHARS`].
pub async fn summarize(
    provider: &dyn CompletionProvider,
    content: &str,
) -> Result<String, ProviderError> {
    let reply = provider
        .complete(CompletionRequest {
            system_prompt: Some(SUMMARY_INSTRUCTION.to_string()),
            prompt: content.to_string(),
            max_tokens: None,
        })
        .await?;

    let reply = reply.trim();
    if reply.is_empty() {
        return Err(ProviderError::Malformed("empty summary".to_string()));
    }
    Ok(reply.chars().take(SUMMARY_MAX_CHARS).collect())
}

/// Summary and embedding for `content`, each falling back independently.
async fn derive(provider: &dyn CompletionProvider, content: &str) -> (String, Option<Vec<f32>>) {
    let (summary, embedding) = tokio::join!(summarize(provider, content), provider.embed(content));

    let summary = degrade(summary, "summary", || fallback_summary(content));
    let embedding = degrade(embedding.map(Some), "embedding", || None);
    (summary, embedding)
}

/// Validate, derive, and insert a new memory. Returns the assigned id.
pub async fn create_memory(
    store: &dyn MemoryStore,
    provider: &dyn CompletionProvider,
    input: MemoryInput,
) -> Result<String, MemoryError> {
    let input = validate(input)?;
    let (summary, embedding) = derive(provider, &input.content).await;

    let memory = NewMemory {
        title: input.title,
        category: input.category.unwrap_or_default(),
        memory_type: input.memory_type.unwrap_or_default(),
        content: input.content,
        summary,
        tags: input.tags.unwrap_or_default(),
        has_reminder: input.has_reminder.unwrap_or(false),
        source_url: input.source_url,
        embedding,
    };
    let has_embedding = memory.embedding.is_some();

    let id = store.insert(memory).await.map_err(|e| {
        tracing::error!(error = %e, "failed to store memory");
        MemoryError::from(e)
    })?;

    tracing::info!(id = %id, has_embedding, "memory created");
    Ok(id)
}

/// Validate, re-derive, and rewrite an existing memory. Optional fields the
/// input omits keep their stored values.
pub async fn update_memory(
    store: &dyn MemoryStore,
    provider: &dyn CompletionProvider,
    id: &str,
    input: MemoryInput,
) -> Result<Memory, MemoryError> {
    let input = validate(input)?;
    let (summary, embedding) = derive(provider, &input.content).await;

    let update = MemoryUpdate {
        title: input.title,
        category: input.category,
        memory_type: input.memory_type,
        content: input.content,
        summary,
        tags: input.tags,
        has_reminder: input.has_reminder,
        source_url: input.source_url,
        embedding,
    };

    let updated = store.update(id, update).await.map_err(|e| {
        tracing::error!(error = %e, id, "failed to update memory");
        MemoryError::from(e)
    })?;

    match updated {
        Some(memory) => {
            tracing::info!(id, "memory updated");
            Ok(memory)
        }
        None => Err(MemoryError::NotFound(id.to_string())),
    }
}
