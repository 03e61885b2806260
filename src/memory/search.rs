//! Retrieval: filtered search, fetch by id, delete, and the tag list.
//!
//! Search issues at most one store query. There is no client-side ranking;
//! results come back in store order (newest first).

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Deserialize;

use crate::config::RetrievalConfig;
use crate::error::MemoryError;
use crate::memory::types::{Category, Memory, MemoryType, SearchHit, TagsInput};
use crate::store::{MemoryStore, SearchQuery};

/// Search request body.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SearchRequest {
    pub query: Option<String>,
    pub category: Option<String>,
    #[serde(alias = "type")]
    pub memory_type: Option<String>,
    pub tags: Option<TagsInput>,
    /// RFC 3339 timestamp or `YYYY-MM-DD` (start of day).
    pub date_from: Option<String>,
    /// RFC 3339 timestamp or `YYYY-MM-DD` (end of day).
    pub date_to: Option<String>,
    pub limit: Option<i64>,
}

/// Blank strings and `all` mean "no filter".
fn label_filter(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("all"))
}

fn parse_date(raw: Option<&str>, end_of_day: bool) -> Result<Option<DateTime<Utc>>, MemoryError> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };

    if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(t.with_timezone(&Utc)));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| MemoryError::Validation(format!("invalid date: {raw}")))?;
    let time = if end_of_day {
        NaiveTime::from_hms_micro_opt(23, 59, 59, 999_999)
    } else {
        NaiveTime::from_hms_opt(0, 0, 0)
    }
    .ok_or_else(|| MemoryError::Validation(format!("invalid date: {raw}")))?;

    Ok(Some(date.and_time(time).and_utc()))
}

/// Turn a request into a store query. `Ok(None)` when no filter is set.
pub fn build_query(
    request: SearchRequest,
    config: &RetrievalConfig,
) -> Result<Option<SearchQuery>, MemoryError> {
    let category = label_filter(request.category.as_deref())
        .map(str::parse::<Category>)
        .transpose()
        .map_err(MemoryError::Validation)?;
    let memory_type = label_filter(request.memory_type.as_deref())
        .map(str::parse::<MemoryType>)
        .transpose()
        .map_err(MemoryError::Validation)?;

    let max = config.max_limit.max(1) as i64;
    let limit = request
        .limit
        .unwrap_or(config.default_limit as i64)
        .clamp(1, max) as usize;

    let query = SearchQuery {
        text: request
            .query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_string),
        category,
        memory_type,
        tags: request
            .tags
            .map(TagsInput::normalize)
            .unwrap_or_default()
            .into_iter()
            .filter(|t| !t.trim().is_empty())
            .collect(),
        created_from: parse_date(request.date_from.as_deref(), false)?,
        created_to: parse_date(request.date_to.as_deref(), true)?,
        limit,
    };

    if query.is_unbounded() {
        return Ok(None);
    }
    Ok(Some(query))
}

/// Run a filtered search. An empty request returns no results without
/// touching the store.
pub async fn search_memories(
    store: &dyn MemoryStore,
    request: SearchRequest,
    config: &RetrievalConfig,
) -> Result<Vec<SearchHit>, MemoryError> {
    let Some(query) = build_query(request, config)? else {
        tracing::debug!("empty search request, skipping store");
        return Ok(Vec::new());
    };

    let hits = store.search(query).await.map_err(|e| {
        tracing::error!(error = %e, "search failed");
        MemoryError::from(e)
    })?;

    tracing::debug!(count = hits.len(), "search complete");
    Ok(hits)
}

pub async fn get_memory(store: &dyn MemoryStore, id: &str) -> Result<Memory, MemoryError> {
    store
        .get(id)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, id, "failed to load memory");
            MemoryError::from(e)
        })?
        .ok_or_else(|| MemoryError::NotFound(id.to_string()))
}

/// Hard delete. `NotFound` when nothing had this id.
pub async fn delete_memory(store: &dyn MemoryStore, id: &str) -> Result<(), MemoryError> {
    let deleted = store.delete(id).await.map_err(|e| {
        tracing::error!(error = %e, id, "failed to delete memory");
        MemoryError::from(e)
    })?;
    if deleted {
        tracing::info!(id, "memory deleted");
        Ok(())
    } else {
        Err(MemoryError::NotFound(id.to_string()))
    }
}

/// Every distinct non-empty tag, sorted.
pub async fn list_tags(store: &dyn MemoryStore) -> Result<Vec<String>, MemoryError> {
    let lists = store.tag_lists().await.map_err(|e| {
        tracing::error!(error = %e, "failed to list tags");
        MemoryError::from(e)
    })?;
    let tags: BTreeSet<String> = lists
        .into_iter()
        .flatten()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();
    Ok(tags.into_iter().collect())
}
