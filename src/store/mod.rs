//! Persistence seam.
//!
//! [`MemoryStore`] is the opaque relational store the pipelines talk to: row
//! insert/update/delete/select with filters, plus the grouped counts analytics
//! needs. [`sqlite::SqliteStore`] is the shipped implementation; tests wrap or
//! replace it.

pub mod aggregate;
pub mod rows;
pub mod sqlite;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::db::HealthReport;
use crate::error::StoreError;
use crate::memory::types::{Category, Memory, MemoryType, SearchHit};

pub use sqlite::SqliteStore;

/// A fully derived record ready for insertion. Timestamps and id are assigned
/// by the store.
#[derive(Debug, Clone)]
pub struct NewMemory {
    pub title: String,
    pub category: Category,
    pub memory_type: MemoryType,
    pub content: String,
    pub summary: String,
    pub tags: Vec<String>,
    pub has_reminder: bool,
    pub source_url: Option<String>,
    pub embedding: Option<Vec<f32>>,
}

/// Replacement values for an existing record. `None` on an optional field
/// keeps the stored value; `summary` and `embedding` are always rewritten.
#[derive(Debug, Clone)]
pub struct MemoryUpdate {
    pub title: String,
    pub category: Option<Category>,
    pub memory_type: Option<MemoryType>,
    pub content: String,
    pub summary: String,
    pub tags: Option<Vec<String>>,
    pub has_reminder: Option<bool>,
    pub source_url: Option<String>,
    pub embedding: Option<Vec<f32>>,
}

/// Filters combined into a single store query. All present filters must match.
#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    /// Case-insensitive substring over title, content, and summary.
    pub text: Option<String>,
    pub category: Option<Category>,
    pub memory_type: Option<MemoryType>,
    /// Every listed tag must be present on the record.
    pub tags: Vec<String>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
    pub limit: usize,
}

impl SearchQuery {
    /// True when no filter is set, i.e. the query would scan the whole table.
    pub fn is_unbounded(&self) -> bool {
        self.text.is_none()
            && self.category.is_none()
            && self.memory_type.is_none()
            && self.tags.is_empty()
            && self.created_from.is_none()
            && self.created_to.is_none()
    }
}

/// Whole-table figures; not restricted by the analytics time range.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OverallStats {
    pub total_memories: u64,
    pub total_categories: u64,
    pub newest_memory: Option<DateTime<Utc>>,
    pub oldest_memory: Option<DateTime<Utc>>,
    pub memories_last_week: u64,
    pub memories_last_month: u64,
}

/// Column a histogram groups by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupColumn {
    Category,
    MemoryType,
}

impl GroupColumn {
    pub fn column(&self) -> &'static str {
        match self {
            Self::Category => "category",
            Self::MemoryType => "memory_type",
        }
    }
}

/// Per-category count and most recent modification, for stacks.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryActivity {
    pub category: String,
    pub count: u64,
    pub last_updated: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Insert a record; returns the assigned id.
    async fn insert(&self, memory: NewMemory) -> Result<String, StoreError>;

    /// Rewrite a record. `Ok(None)` when no record has this id.
    async fn update(&self, id: &str, update: MemoryUpdate) -> Result<Option<Memory>, StoreError>;

    async fn get(&self, id: &str) -> Result<Option<Memory>, StoreError>;

    /// Hard delete. `Ok(false)` when no record had this id.
    async fn delete(&self, id: &str) -> Result<bool, StoreError>;

    async fn search(&self, query: SearchQuery) -> Result<Vec<SearchHit>, StoreError>;

    /// The tag list of every record, unmerged.
    async fn tag_lists(&self) -> Result<Vec<Vec<String>>, StoreError>;

    async fn overall_stats(&self, now: DateTime<Utc>) -> Result<OverallStats, StoreError>;

    /// `(label, count)` pairs for records created at or after `since`.
    async fn count_by(
        &self,
        column: GroupColumn,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<(String, u64)>, StoreError>;

    /// Creation timestamps at or after `since`, oldest first.
    async fn created_since(
        &self,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<DateTime<Utc>>, StoreError>;

    /// `(tag, count)` across all records, most frequent first.
    async fn tag_counts(&self) -> Result<Vec<(String, u64)>, StoreError>;

    async fn category_activity(&self) -> Result<Vec<CategoryActivity>, StoreError>;

    /// Connectivity and schema probe for diagnostics.
    async fn health(&self) -> Result<HealthReport, StoreError>;
}
