pub mod analytics;
pub mod ingest;
pub mod search;
pub mod types;
