//! Operational probes: store and provider connectivity, environment presence.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Serialize;
use serde_json::json;

use super::ApiError;
use crate::config::ENV_OVERRIDES;
use crate::db::HealthReport;
use crate::provider::CompletionRequest;
use crate::server::AppState;

const PROVIDER_PROBE_PROMPT: &str = "Say hello to MemoryOS";

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub version: &'static str,
    pub uptime_seconds: u64,
    pub timestamp: String,
    pub memory_count: u64,
    pub provider_configured: bool,
}

/// `GET /health`. The failure body keeps the `status` field alongside `error`.
pub async fn health(State(state): State<Arc<AppState>>) -> Response {
    match state.store.health().await {
        Ok(report) => Json(HealthResponse {
            status: "healthy",
            message: "Store reachable",
            version: env!("CARGO_PKG_VERSION"),
            uptime_seconds: state.uptime_seconds(),
            timestamp: Utc::now().to_rfc3339(),
            memory_count: report.memory_count,
            provider_configured: state.provider.is_configured(),
        })
        .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "health check failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "status": "error",
                    "message": "Health check failed",
                    "error": e.to_string(),
                })),
            )
                .into_response()
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TableCheckResponse {
    pub exists: bool,
    pub message: &'static str,
    #[serde(flatten)]
    pub report: HealthReport,
}

/// `GET /check-table`
pub async fn check_table(
    State(state): State<Arc<AppState>>,
) -> Result<Json<TableCheckResponse>, ApiError> {
    let report = state.store.health().await.map_err(|e| {
        tracing::error!(error = %e, "table check failed");
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;

    let message = if report.table_exists {
        "Table check completed"
    } else {
        "The memories table does not exist"
    };
    Ok(Json(TableCheckResponse {
        exists: report.table_exists,
        message,
        report,
    }))
}

#[derive(Debug, Serialize)]
pub struct ProviderProbeResponse {
    pub status: &'static str,
    pub response: String,
}

/// `GET /test-openai`. Unlike the pipelines, this reports provider failures.
pub async fn test_provider(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ProviderProbeResponse>, ApiError> {
    let reply = state
        .provider
        .complete(CompletionRequest {
            system_prompt: None,
            prompt: PROVIDER_PROBE_PROMPT.to_string(),
            max_tokens: Some(50),
        })
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, "provider probe failed");
            ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?;

    Ok(Json(ProviderProbeResponse {
        status: "Connected Successfully",
        response: reply,
    }))
}

#[derive(Debug, Serialize)]
pub struct StoreProbeResponse {
    pub connection: &'static str,
    pub time: String,
    pub sqlite_version: String,
}

/// `GET /test-store`
pub async fn test_store(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StoreProbeResponse>, ApiError> {
    let report = state.store.health().await.map_err(|e| {
        tracing::error!(error = %e, "store probe failed");
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;

    Ok(Json(StoreProbeResponse {
        connection: "ok",
        time: Utc::now().to_rfc3339(),
        sqlite_version: report.sqlite_version,
    }))
}

/// Which configuration variables are present. Values are never reported.
pub fn env_presence(lookup: impl Fn(&str) -> Option<String>) -> BTreeMap<&'static str, &'static str> {
    ENV_OVERRIDES
        .iter()
        .map(|&name| {
            let set = lookup(name).is_some_and(|v| !v.trim().is_empty());
            (name, if set { "set" } else { "unset" })
        })
        .collect()
}

/// `GET /test-env`
pub async fn test_env() -> Json<BTreeMap<&'static str, &'static str>> {
    Json(env_presence(|name| std::env::var(name).ok()))
}
