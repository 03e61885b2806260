//! SQL DDL for the memory store.
//!
//! Defines the `memories` and `schema_meta` tables. All DDL uses
//! `IF NOT EXISTS` for idempotent initialization.

use rusqlite::Connection;

/// Core table DDL. `tags` holds a JSON array of strings; `embedding` holds
/// little-endian f32 values or `NULL` when the provider produced none.
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS memories (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL CHECK(length(trim(title)) > 0),
    category TEXT NOT NULL DEFAULT 'Research',
    memory_type TEXT NOT NULL DEFAULT 'Note',
    content TEXT NOT NULL CHECK(length(trim(content)) > 0),
    summary TEXT NOT NULL,
    tags TEXT NOT NULL DEFAULT '[]' CHECK(json_valid(tags)),
    has_reminder INTEGER NOT NULL DEFAULT 0,
    source_url TEXT,
    embedding BLOB,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL CHECK(updated_at >= created_at)
);

CREATE INDEX IF NOT EXISTS idx_memories_category ON memories(category);
CREATE INDEX IF NOT EXISTS idx_memories_type ON memories(memory_type);
CREATE INDEX IF NOT EXISTS idx_memories_created ON memories(created_at);

-- Schema metadata
CREATE TABLE IF NOT EXISTS schema_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// Initialize all schema tables. Idempotent (uses IF NOT EXISTS).
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;

    // Set initial schema version if not already present
    conn.execute(
        "INSERT OR IGNORE INTO schema_meta (key, value) VALUES ('schema_version', '1')",
        [],
    )?;

    Ok(())
}
