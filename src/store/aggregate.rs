//! Grouped counts and time-bounded figures for analytics and stacks.

use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection};

use super::{CategoryActivity, GroupColumn, OverallStats};
use crate::db::{from_db_time, to_db_time};
use crate::error::StoreError;

/// Whole-table totals plus the 7- and 30-day creation windows ending at `now`.
pub fn overall_stats(conn: &Connection, now: DateTime<Utc>) -> Result<OverallStats, StoreError> {
    let week_ago = to_db_time(now - Duration::days(7));
    let month_ago = to_db_time(now - Duration::days(30));

    let (total, categories, newest, oldest, last_week, last_month): (
        i64,
        i64,
        Option<String>,
        Option<String>,
        Option<i64>,
        Option<i64>,
    ) = conn.query_row(
        "SELECT COUNT(*), COUNT(DISTINCT category), MAX(created_at), MIN(created_at), \
                SUM(CASE WHEN created_at >= ?1 THEN 1 ELSE 0 END), \
                SUM(CASE WHEN created_at >= ?2 THEN 1 ELSE 0 END) \
         FROM memories",
        params![week_ago, month_ago],
        |row| {
            Ok((
                row.get(0)?,
                row.get(1)?,
                row.get(2)?,
                row.get(3)?,
                row.get(4)?,
                row.get(5)?,
            ))
        },
    )?;

    Ok(OverallStats {
        total_memories: total as u64,
        total_categories: categories as u64,
        newest_memory: newest.as_deref().map(from_db_time).transpose()?,
        oldest_memory: oldest.as_deref().map(from_db_time).transpose()?,
        memories_last_week: last_week.unwrap_or(0) as u64,
        memories_last_month: last_month.unwrap_or(0) as u64,
    })
}

/// `(label, count)` per distinct value of `column`, largest first.
pub fn count_by(
    conn: &Connection,
    column: GroupColumn,
    since: Option<DateTime<Utc>>,
) -> Result<Vec<(String, u64)>, StoreError> {
    let col = column.column();
    let where_clause = if since.is_some() {
        "WHERE created_at >= ?1"
    } else {
        ""
    };
    let sql = format!(
        "SELECT {col}, COUNT(*) FROM memories {where_clause} \
         GROUP BY {col} ORDER BY COUNT(*) DESC, {col} ASC"
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows: Vec<(String, i64)> = if let Some(since) = since {
        stmt.query_map(params![to_db_time(since)], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?
    } else {
        stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?
    };

    Ok(rows.into_iter().map(|(label, n)| (label, n as u64)).collect())
}

/// Creation timestamps at or after `since`, oldest first.
pub fn created_since(
    conn: &Connection,
    since: Option<DateTime<Utc>>,
) -> Result<Vec<DateTime<Utc>>, StoreError> {
    let mut stmt;
    let raw: Vec<String> = if let Some(since) = since {
        stmt = conn.prepare(
            "SELECT created_at FROM memories WHERE created_at >= ?1 ORDER BY created_at ASC",
        )?;
        stmt.query_map(params![to_db_time(since)], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?
    } else {
        stmt = conn.prepare("SELECT created_at FROM memories ORDER BY created_at ASC")?;
        stmt.query_map([], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?
    };

    raw.iter().map(|t| from_db_time(t)).collect()
}

/// Occurrences of each tag across all records, most frequent first, ties by name.
pub fn tag_counts(conn: &Connection) -> Result<Vec<(String, u64)>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT json_each.value AS tag, COUNT(*) AS n \
         FROM memories, json_each(memories.tags) \
         WHERE json_each.type = 'text' AND json_each.value != '' \
         GROUP BY tag ORDER BY n DESC, tag ASC",
    )?;
    let rows = stmt
        .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(rows.into_iter().map(|(tag, n)| (tag, n as u64)).collect())
}

/// Count and latest `updated_at` per category present in the table.
pub fn category_activity(conn: &Connection) -> Result<Vec<CategoryActivity>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT category, COUNT(*), MAX(updated_at) FROM memories \
         GROUP BY category ORDER BY category ASC",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, Option<String>>(2)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(|(category, count, last)| {
            Ok(CategoryActivity {
                category,
                count: count as u64,
                last_updated: last.as_deref().map(from_db_time).transpose()?,
            })
        })
        .collect()
}
