//! Error taxonomy shared by the store, the completion provider, and the
//! memory pipelines.
//!
//! Provider failures never reach HTTP callers: the ingestion pipeline
//! substitutes a fallback for them. Store and validation failures do.

use thiserror::Error;

/// Failure talking to the completion provider (summaries and embeddings).
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("completion provider API key is not configured")]
    MissingApiKey,

    #[error("provider request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("malformed provider response: {0}")]
    Malformed(String),

    #[error("embedding has {actual} dimensions, expected {expected}")]
    Dimension { expected: usize, actual: usize },
}

/// Failure inside the persistent store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("database lock poisoned")]
    LockPoisoned,

    #[error("store task failed: {0}")]
    Task(String),

    #[error("corrupt row: {0}")]
    Corrupt(String),
}

/// Errors surfaced by the memory pipelines to their callers.
#[derive(Debug, Error)]
pub enum MemoryError {
    /// Missing or malformed input. Nothing downstream was attempted.
    #[error("{0}")]
    Validation(String),

    /// Lookup by id missed.
    #[error("memory not found: {0}")]
    NotFound(String),

    /// Persistence or query failure, reported once and never retried.
    #[error(transparent)]
    Store(#[from] StoreError),
}
