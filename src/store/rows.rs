//! Row-level read and write paths over a SQLite connection.
//!
//! Every function here is synchronous; [`super::SqliteStore`] runs them on the
//! blocking pool. Updates run inside a transaction so a failed write leaves the
//! stored row untouched.

use chrono::{DateTime, Duration, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use super::{MemoryUpdate, NewMemory, SearchQuery};
use crate::db::{db_now, from_db_time, to_db_time};
use crate::error::StoreError;
use crate::memory::types::Memory;

/// Column list shared by every `SELECT` that hydrates a [`Memory`].
const MEMORY_COLUMNS: &str = "id, title, category, memory_type, content, summary, tags, \
     has_reminder, source_url, embedding, created_at, updated_at";

/// Raw row as SQLite hands it back, before label and timestamp parsing.
struct MemoryRow {
    id: String,
    title: String,
    category: String,
    memory_type: String,
    content: String,
    summary: String,
    tags: String,
    has_reminder: bool,
    source_url: Option<String>,
    embedding: Option<Vec<u8>>,
    created_at: String,
    updated_at: String,
}

impl MemoryRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            category: row.get(2)?,
            memory_type: row.get(3)?,
            content: row.get(4)?,
            summary: row.get(5)?,
            tags: row.get(6)?,
            has_reminder: row.get(7)?,
            source_url: row.get(8)?,
            embedding: row.get(9)?,
            created_at: row.get(10)?,
            updated_at: row.get(11)?,
        })
    }

    fn into_memory(self) -> Result<Memory, StoreError> {
        Ok(Memory {
            category: self.category.parse().map_err(StoreError::Corrupt)?,
            memory_type: self.memory_type.parse().map_err(StoreError::Corrupt)?,
            tags: serde_json::from_str(&self.tags)?,
            embedding: self.embedding.as_deref().map(blob_to_embedding).transpose()?,
            created_at: from_db_time(&self.created_at)?,
            updated_at: from_db_time(&self.updated_at)?,
            id: self.id,
            title: self.title,
            content: self.content,
            summary: self.summary,
            has_reminder: self.has_reminder,
            source_url: self.source_url,
        })
    }
}

/// Encode an embedding as little-endian f32 bytes.
pub fn embedding_to_blob(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Decode a little-endian f32 BLOB.
pub fn blob_to_embedding(blob: &[u8]) -> Result<Vec<f32>, StoreError> {
    if blob.len() % 4 != 0 {
        return Err(StoreError::Corrupt(format!(
            "embedding blob length {} is not a multiple of 4",
            blob.len()
        )));
    }
    Ok(blob
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}

/// Next `updated_at` for a row last written at `previous`: the current time,
/// or one microsecond past `previous` if the clock has not moved beyond it.
pub fn next_timestamp(previous: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    if now > previous {
        now
    } else {
        previous + Duration::microseconds(1)
    }
}

/// Insert a new memory row with `created_at = updated_at = now`. Returns the new id.
pub fn insert_memory(conn: &Connection, memory: &NewMemory) -> Result<String, StoreError> {
    let id = uuid::Uuid::now_v7().to_string();
    let now = to_db_time(db_now());
    let tags_json = serde_json::to_string(&memory.tags)?;
    let embedding = memory.embedding.as_deref().map(embedding_to_blob);

    conn.execute(
        "INSERT INTO memories (id, title, category, memory_type, content, summary, tags, \
         has_reminder, source_url, embedding, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)",
        params![
            id,
            memory.title,
            memory.category.as_str(),
            memory.memory_type.as_str(),
            memory.content,
            memory.summary,
            tags_json,
            memory.has_reminder,
            memory.source_url,
            embedding,
            now,
        ],
    )?;

    Ok(id)
}

/// Rewrite an existing row. Returns the updated record, or `None` if the id is unknown.
pub fn update_memory(
    conn: &mut Connection,
    id: &str,
    update: &MemoryUpdate,
) -> Result<Option<Memory>, StoreError> {
    let tx = conn.transaction()?;

    let previous: Option<String> = tx
        .query_row(
            "SELECT updated_at FROM memories WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )
        .optional()?;
    let Some(previous) = previous else {
        return Ok(None);
    };

    let updated_at = next_timestamp(from_db_time(&previous)?, db_now());
    let tags_json = update.tags.as_ref().map(serde_json::to_string).transpose()?;
    let embedding = update.embedding.as_deref().map(embedding_to_blob);

    tx.execute(
        "UPDATE memories SET \
            title = ?1, \
            category = COALESCE(?2, category), \
            memory_type = COALESCE(?3, memory_type), \
            content = ?4, \
            summary = ?5, \
            tags = COALESCE(?6, tags), \
            has_reminder = COALESCE(?7, has_reminder), \
            source_url = COALESCE(?8, source_url), \
            embedding = ?9, \
            updated_at = ?10 \
         WHERE id = ?11",
        params![
            update.title,
            update.category.map(|c| c.as_str()),
            update.memory_type.map(|t| t.as_str()),
            update.content,
            update.summary,
            tags_json,
            update.has_reminder,
            update.source_url,
            embedding,
            to_db_time(updated_at),
            id,
        ],
    )?;

    let memory = get_memory(&tx, id)?;
    tx.commit()?;
    Ok(memory)
}

/// Fetch one memory by id.
pub fn get_memory(conn: &Connection, id: &str) -> Result<Option<Memory>, StoreError> {
    let row = conn
        .query_row(
            &format!("SELECT {MEMORY_COLUMNS} FROM memories WHERE id = ?1"),
            params![id],
            MemoryRow::from_row,
        )
        .optional()?;
    row.map(MemoryRow::into_memory).transpose()
}

/// Hard delete. Returns `false` if nothing matched.
pub fn delete_memory(conn: &Connection, id: &str) -> Result<bool, StoreError> {
    let rows = conn.execute("DELETE FROM memories WHERE id = ?1", params![id])?;
    Ok(rows > 0)
}

/// Escape `%`, `_` and the escape character itself for a `LIKE ... ESCAPE '\'` pattern.
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Run one filtered `SELECT`, newest first.
pub fn search_memories(conn: &Connection, query: &SearchQuery) -> Result<Vec<Memory>, StoreError> {
    let mut clauses: Vec<String> = Vec::new();
    let mut args: Vec<Value> = Vec::new();

    if let Some(ref text) = query.text {
        args.push(Value::Text(format!("%{}%", escape_like(&text.to_lowercase()))));
        let n = args.len();
        clauses.push(format!(
            "(casefold(title) LIKE ?{n} ESCAPE '\\' \
             OR casefold(content) LIKE ?{n} ESCAPE '\\' \
             OR casefold(summary) LIKE ?{n} ESCAPE '\\')"
        ));
    }
    if let Some(category) = query.category {
        args.push(Value::Text(category.as_str().to_string()));
        clauses.push(format!("category = ?{}", args.len()));
    }
    if let Some(memory_type) = query.memory_type {
        args.push(Value::Text(memory_type.as_str().to_string()));
        clauses.push(format!("memory_type = ?{}", args.len()));
    }
    for tag in &query.tags {
        args.push(Value::Text(tag.clone()));
        clauses.push(format!(
            "EXISTS (SELECT 1 FROM json_each(memories.tags) WHERE json_each.value = ?{})",
            args.len()
        ));
    }
    if let Some(from) = query.created_from {
        args.push(Value::Text(to_db_time(from)));
        clauses.push(format!("created_at >= ?{}", args.len()));
    }
    if let Some(to) = query.created_to {
        args.push(Value::Text(to_db_time(to)));
        clauses.push(format!("created_at <= ?{}", args.len()));
    }

    let where_clause = if clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", clauses.join(" AND "))
    };
    args.push(Value::Integer(query.limit as i64));
    let sql = format!(
        "SELECT {MEMORY_COLUMNS} FROM memories {where_clause} \
         ORDER BY created_at DESC, id DESC LIMIT ?{}",
        args.len()
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_from_iter(args.iter()), MemoryRow::from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    rows.into_iter().map(MemoryRow::into_memory).collect()
}

/// The raw tag array of every row.
pub fn tag_lists(conn: &Connection) -> Result<Vec<Vec<String>>, StoreError> {
    let mut stmt = conn.prepare("SELECT tags FROM memories")?;
    let raw = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;

    raw.iter()
        .map(|json| serde_json::from_str(json).map_err(StoreError::from))
        .collect()
}
