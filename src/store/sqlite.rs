//! [`MemoryStore`] over a single SQLite connection.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::Connection;

use super::{
    aggregate, rows, CategoryActivity, GroupColumn, MemoryStore, MemoryUpdate, NewMemory,
    OverallStats, SearchQuery,
};
use crate::db::{self, HealthReport};
use crate::error::StoreError;
use crate::memory::types::{Memory, SearchHit};

/// Shared handle to the database. Cloning is cheap; every clone uses the same
/// connection, serialized by the mutex.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Open (or create) the database file, applying schema and migrations.
    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        Ok(Self::new(db::open_database(path)?))
    }

    pub fn open_in_memory() -> anyhow::Result<Self> {
        Ok(Self::new(db::open_memory_database()?))
    }

    /// Run `f` against the connection on the blocking pool.
    async fn with_conn<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock().map_err(|_| StoreError::LockPoisoned)?;
            f(&mut *guard)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

#[async_trait]
impl MemoryStore for SqliteStore {
    async fn insert(&self, memory: NewMemory) -> Result<String, StoreError> {
        self.with_conn(move |conn| rows::insert_memory(conn, &memory))
            .await
    }

    async fn update(&self, id: &str, update: MemoryUpdate) -> Result<Option<Memory>, StoreError> {
        let id = id.to_string();
        self.with_conn(move |conn| rows::update_memory(conn, &id, &update))
            .await
    }

    async fn get(&self, id: &str) -> Result<Option<Memory>, StoreError> {
        let id = id.to_string();
        self.with_conn(move |conn| rows::get_memory(conn, &id)).await
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let id = id.to_string();
        self.with_conn(move |conn| rows::delete_memory(conn, &id))
            .await
    }

    async fn search(&self, query: SearchQuery) -> Result<Vec<SearchHit>, StoreError> {
        let memories = self
            .with_conn(move |conn| rows::search_memories(conn, &query))
            .await?;
        // No vector index here, so no similarity figure either.
        Ok(memories
            .into_iter()
            .map(|memory| SearchHit {
                memory,
                similarity: None,
            })
            .collect())
    }

    async fn tag_lists(&self) -> Result<Vec<Vec<String>>, StoreError> {
        self.with_conn(|conn| rows::tag_lists(conn)).await
    }

    async fn overall_stats(&self, now: DateTime<Utc>) -> Result<OverallStats, StoreError> {
        self.with_conn(move |conn| aggregate::overall_stats(conn, now))
            .await
    }

    async fn count_by(
        &self,
        column: GroupColumn,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<(String, u64)>, StoreError> {
        self.with_conn(move |conn| aggregate::count_by(conn, column, since))
            .await
    }

    async fn created_since(
        &self,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<DateTime<Utc>>, StoreError> {
        self.with_conn(move |conn| aggregate::created_since(conn, since))
            .await
    }

    async fn tag_counts(&self) -> Result<Vec<(String, u64)>, StoreError> {
        self.with_conn(|conn| aggregate::tag_counts(conn)).await
    }

    async fn category_activity(&self) -> Result<Vec<CategoryActivity>, StoreError> {
        self.with_conn(|conn| aggregate::category_activity(conn))
            .await
    }

    async fn health(&self) -> Result<HealthReport, StoreError> {
        self.with_conn(|conn| Ok(db::check_database_health(conn)?))
            .await
    }
}
