//! Personal memory dashboard backend: capture notes, summarize and embed them,
//! then search, tag, and chart them over HTTP.
//!
//! A *memory* is a titled note filed under a category and a type. On ingest,
//! an OpenAI-compatible completion provider produces a short summary and an
//! embedding vector for it. Both are best effort:
//!
//! | Provider call | On failure |
//! |---------------|------------|
//! | Summary | First 150 characters of the content, `...` if cut |
//! | Embedding | Stored as `NULL` |
//!
//! Store failures, by contrast, are reported to the caller once and never retried.
//!
//! # Architecture
//!
//! - **Storage**: SQLite (bundled) behind the [`store::MemoryStore`] trait, with
//!   JSON1 for tag matching. Calls run on the blocking pool.
//! - **Provider**: [`provider::CompletionProvider`] over `reqwest`.
//! - **Transport**: JSON over HTTP via axum, with request tracing and permissive CORS.
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from TOML files and environment variables
//! - [`db`]: SQLite initialization, schema, migrations, and health checks
//! - [`store`]: The persistence seam and its SQLite implementation
//! - [`provider`]: The completion/embedding seam and its HTTP implementation
//! - [`memory`]: Ingestion, search, and analytics pipelines
//! - [`routes`] and [`server`]: HTTP handlers and server wiring
//! - [`cli`]: Terminal commands (`doctor`, `stats`)

pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod memory;
pub mod provider;
pub mod routes;
pub mod server;
pub mod store;
