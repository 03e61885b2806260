//! HTTP server wiring.
//!
//! [`AppState`] holds the store, the completion provider, and config behind
//! `Arc`s. [`router`] mounts every route; [`serve`] opens the database, builds
//! the provider, and runs until Ctrl-C.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::MemoryOsConfig;
use crate::db;
use crate::provider::{self, CompletionProvider};
use crate::routes::{analytics, diagnostics, memories};
use crate::store::{MemoryStore, SqliteStore};

/// Shared, immutable request state.
pub struct AppState {
    pub store: Arc<dyn MemoryStore>,
    pub provider: Arc<dyn CompletionProvider>,
    pub config: Arc<MemoryOsConfig>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        store: Arc<dyn MemoryStore>,
        provider: Arc<dyn CompletionProvider>,
        config: MemoryOsConfig,
    ) -> Self {
        Self {
            store,
            provider,
            config: Arc::new(config),
            started_at: Instant::now(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

/// Build the router with every route, request tracing, and permissive CORS.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Memories
        .route("/memories", post(memories::create_memory))
        .route("/memories/search", post(memories::search_memories))
        .route("/memories/tags", get(memories::list_tags))
        .route(
            "/memories/{id}",
            get(memories::get_memory)
                .put(memories::update_memory)
                .delete(memories::delete_memory),
        )
        // Analytics
        .route("/analytics/memories", get(analytics::memory_analytics))
        .route("/memory-stack", get(analytics::memory_stacks))
        // Diagnostics
        .route("/health", get(diagnostics::health))
        .route("/check-table", get(diagnostics::check_table))
        .route("/test-openai", get(diagnostics::test_provider))
        .route("/test-store", get(diagnostics::test_store))
        .route("/test-env", get(diagnostics::test_env))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Open the store, create the provider, and check that stored vectors match
/// the configured embedding model.
fn setup_shared_state(config: MemoryOsConfig) -> Result<Arc<AppState>> {
    let db_path = config.resolved_db_path();
    let conn = db::open_database(&db_path)?;
    tracing::info!(db = %db_path.display(), "database ready");

    match db::migrations::reconcile_embedding_model(&conn, &config.provider.embedding_model) {
        Ok(Some(stored)) => {
            tracing::warn!(
                stored = %stored,
                configured = %config.provider.embedding_model,
                "embedding model changed, existing vectors were produced by a different model"
            );
        }
        Ok(None) => {}
        Err(e) => tracing::warn!(error = %e, "could not reconcile stored embedding model"),
    }

    let store: Arc<dyn MemoryStore> = Arc::new(SqliteStore::new(conn));

    let provider: Arc<dyn CompletionProvider> = Arc::from(provider::create_provider(&config.provider)?);
    if provider.is_configured() {
        tracing::info!(model = provider.model_name(), "completion provider ready");
    } else {
        tracing::warn!("no provider API key configured, summaries and embeddings will fall back");
    }

    Ok(Arc::new(AppState::new(store, provider, config)))
}

/// Serve the HTTP API until Ctrl-C.
pub async fn serve(config: MemoryOsConfig) -> Result<()> {
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let state = setup_shared_state(config)?;

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "memoryos listening at http://{bind_addr}");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                // Without a signal handler, run until killed.
                tracing::error!(error = %e, "failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
            tracing::info!("shutting down HTTP server");
        })
        .await?;

    Ok(())
}
