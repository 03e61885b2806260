//! Analytics and stack view.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::ApiError;
use crate::memory::analytics::{self, MemoryAnalytics, MemoryStack, TimeRange};
use crate::server::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsParams {
    pub time_range: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StacksResponse {
    pub stacks: Vec<MemoryStack>,
}

/// `GET /analytics/memories?timeRange=week|month|year|all`
pub async fn memory_analytics(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AnalyticsParams>,
) -> Result<Json<MemoryAnalytics>, ApiError> {
    let range = TimeRange::parse(params.time_range.as_deref());
    let report = analytics::memory_analytics(state.store.as_ref(), range, Utc::now()).await?;
    Ok(Json(report))
}

/// `GET /memory-stack`
pub async fn memory_stacks(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StacksResponse>, ApiError> {
    let stacks = analytics::memory_stacks(state.store.as_ref(), Utc::now()).await?;
    Ok(Json(StacksResponse { stacks }))
}
