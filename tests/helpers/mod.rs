#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::io;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use memoryos::config::MemoryOsConfig;
use memoryos::db::HealthReport;
use memoryos::error::{ProviderError, StoreError};
use memoryos::memory::types::{Memory, MemoryInput, SearchHit, TagsInput};
use memoryos::provider::{CompletionProvider, CompletionRequest};
use memoryos::server::AppState;
use memoryos::store::{
    CategoryActivity, GroupColumn, MemoryStore, MemoryUpdate, NewMemory, OverallStats,
    SearchQuery, SqliteStore,
};

pub const TEST_DIM: usize = 8;

/// Deterministic provider. Summaries echo a fixed reply; embeddings are a
/// constant vector. `fail` makes every call return an error.
pub struct FakeProvider {
    pub fail: AtomicBool,
    pub summary: String,
    pub complete_calls: AtomicUsize,
    pub embed_calls: AtomicUsize,
    pub last_prompt: Mutex<Option<CompletionRequest>>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::with_summary("A short summary.")
    }

    pub fn with_summary(summary: &str) -> Self {
        Self {
            fail: AtomicBool::new(false),
            summary: summary.to_string(),
            complete_calls: AtomicUsize::new(0),
            embed_calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
        }
    }

    pub fn failing() -> Self {
        let p = Self::new();
        p.fail.store(true, Ordering::SeqCst);
        p
    }

    pub fn calls(&self) -> usize {
        self.complete_calls.load(Ordering::SeqCst) + self.embed_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionProvider for FakeProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<String, ProviderError> {
        self.complete_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_prompt.lock().unwrap() = Some(request);
        if self.fail.load(Ordering::SeqCst) {
            return Err(ProviderError::Api {
                status: 503,
                body: "unavailable".into(),
            });
        }
        Ok(self.summary.clone())
    }

    async fn embed(&self, _text: &str) -> Result<Vec<f32>, ProviderError> {
        self.embed_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(ProviderError::MissingApiKey);
        }
        Ok(test_embedding())
    }

    fn dimensions(&self) -> usize {
        TEST_DIM
    }

    fn model_name(&self) -> &str {
        "fake-embedding"
    }
}

pub fn test_embedding() -> Vec<f32> {
    (0..TEST_DIM).map(|i| i as f32 / 10.0).collect()
}

/// Wraps a store, counting calls and optionally failing every one.
pub struct CountingStore {
    pub inner: SqliteStore,
    pub calls: AtomicUsize,
    pub fail: AtomicBool,
}

impl CountingStore {
    pub fn new(inner: SqliteStore) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    fn enter(&self) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(StoreError::Task("store offline".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl MemoryStore for CountingStore {
    async fn insert(&self, memory: NewMemory) -> Result<String, StoreError> {
        self.enter()?;
        self.inner.insert(memory).await
    }

    async fn update(&self, id: &str, update: MemoryUpdate) -> Result<Option<Memory>, StoreError> {
        self.enter()?;
        self.inner.update(id, update).await
    }

    async fn get(&self, id: &str) -> Result<Option<Memory>, StoreError> {
        self.enter()?;
        self.inner.get(id).await
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        self.enter()?;
        self.inner.delete(id).await
    }

    async fn search(&self, query: SearchQuery) -> Result<Vec<SearchHit>, StoreError> {
        self.enter()?;
        self.inner.search(query).await
    }

    async fn tag_lists(&self) -> Result<Vec<Vec<String>>, StoreError> {
        self.enter()?;
        self.inner.tag_lists().await
    }

    async fn overall_stats(&self, now: DateTime<Utc>) -> Result<OverallStats, StoreError> {
        self.enter()?;
        self.inner.overall_stats(now).await
    }

    async fn count_by(
        &self,
        column: GroupColumn,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<(String, u64)>, StoreError> {
        self.enter()?;
        self.inner.count_by(column, since).await
    }

    async fn created_since(
        &self,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<DateTime<Utc>>, StoreError> {
        self.enter()?;
        self.inner.created_since(since).await
    }

    async fn tag_counts(&self) -> Result<Vec<(String, u64)>, StoreError> {
        self.enter()?;
        self.inner.tag_counts().await
    }

    async fn category_activity(&self) -> Result<Vec<CategoryActivity>, StoreError> {
        self.enter()?;
        self.inner.category_activity().await
    }

    async fn health(&self) -> Result<HealthReport, StoreError> {
        self.enter()?;
        self.inner.health().await
    }
}

/// A counting store over a fresh in-memory database.
pub fn counting_store() -> CountingStore {
    CountingStore::new(SqliteStore::open_in_memory().unwrap())
}

pub fn input(title: &str, content: &str) -> MemoryInput {
    MemoryInput {
        title: title.into(),
        content: content.into(),
        ..Default::default()
    }
}

pub fn tagged_input(title: &str, content: &str, category: &str, tags: &[&str]) -> MemoryInput {
    MemoryInput {
        title: title.into(),
        content: content.into(),
        category: Some(category.into()),
        tags: Some(TagsInput::List(tags.iter().map(|t| t.to_string()).collect())),
        ..Default::default()
    }
}

/// App state over the given store and provider with default config.
pub fn app_state(
    store: Arc<dyn MemoryStore>,
    provider: Arc<dyn CompletionProvider>,
) -> Arc<AppState> {
    Arc::new(AppState::new(store, provider, MemoryOsConfig::default()))
}

/// Shared buffer that collects formatted log lines.
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    /// Lines at `ERROR` level emitted so far.
    pub fn error_lines(&self) -> Vec<String> {
        let bytes = self.0.lock().unwrap();
        String::from_utf8_lossy(&bytes)
            .lines()
            .filter(|l| l.contains("ERROR"))
            .map(str::to_string)
            .collect()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Capture this crate's log output on the current thread until the guard drops.
pub fn capture_logs() -> (LogBuffer, tracing::subscriber::DefaultGuard) {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("memoryos=debug"))
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .finish();
    (buffer, tracing::subscriber::set_default(subscriber))
}
