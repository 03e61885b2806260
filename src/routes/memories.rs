//! Memory CRUD, search, and tag listing.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;

use super::{ApiError, ApiJson};
use crate::memory::types::{Memory, MemoryInput, SearchHit};
use crate::memory::{ingest, search};
use crate::server::AppState;

/// Body returned by create, update, and delete.
#[derive(Debug, Serialize)]
pub struct MutationResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub results: Vec<SearchHit>,
}

#[derive(Debug, Serialize)]
pub struct TagsResponse {
    pub tags: Vec<String>,
}

/// `POST /memories`
pub async fn create_memory(
    State(state): State<Arc<AppState>>,
    ApiJson(input): ApiJson<MemoryInput>,
) -> Result<(StatusCode, Json<MutationResponse>), ApiError> {
    let id = ingest::create_memory(state.store.as_ref(), state.provider.as_ref(), input).await?;

    Ok((
        StatusCode::CREATED,
        Json(MutationResponse {
            success: true,
            id: Some(id),
            message: "Memory created successfully",
        }),
    ))
}

/// `GET /memories/{id}`
pub async fn get_memory(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Memory>, ApiError> {
    let memory = search::get_memory(state.store.as_ref(), &id).await?;
    Ok(Json(memory))
}

/// `PUT /memories/{id}`
pub async fn update_memory(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<MemoryInput>,
) -> Result<Json<MutationResponse>, ApiError> {
    let memory =
        ingest::update_memory(state.store.as_ref(), state.provider.as_ref(), &id, input).await?;

    Ok(Json(MutationResponse {
        success: true,
        id: Some(memory.id),
        message: "Memory updated successfully",
    }))
}

/// `DELETE /memories/{id}`
pub async fn delete_memory(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<MutationResponse>, ApiError> {
    search::delete_memory(state.store.as_ref(), &id).await?;

    Ok(Json(MutationResponse {
        success: true,
        id: None,
        message: "Memory deleted successfully",
    }))
}

/// `POST /memories/search`
pub async fn search_memories(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<search::SearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
    let results =
        search::search_memories(state.store.as_ref(), request, &state.config.retrieval).await?;
    Ok(Json(SearchResponse { results }))
}

/// `GET /memories/tags`
pub async fn list_tags(State(state): State<Arc<AppState>>) -> Result<Json<TagsResponse>, ApiError> {
    let tags = search::list_tags(state.store.as_ref()).await?;
    Ok(Json(TagsResponse { tags }))
}
