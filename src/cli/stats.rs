use anyhow::Result;
use chrono::Utc;

use crate::config::MemoryOsConfig;
use crate::memory::analytics::{self, TimeRange};
use crate::store::SqliteStore;

/// Display memory analytics in the terminal.
pub async fn stats(config: &MemoryOsConfig, range: Option<&str>) -> Result<()> {
    let store = SqliteStore::open(config.resolved_db_path())?;
    let range = TimeRange::parse(range);
    let report = analytics::memory_analytics(&store, range, Utc::now()).await?;
    let stats = &report.stats;

    println!("Memory Statistics");
    println!("{}", "=".repeat(40));
    println!("  Total memories:      {}", stats.total_memories);
    println!("  Categories in use:   {}", stats.total_categories);
    println!("  Last 7 days:         {}", stats.memories_last_week);
    println!("  Last 30 days:        {}", stats.memories_last_month);
    if let Some(oldest) = stats.oldest_memory {
        println!("  Oldest memory:       {}", oldest.to_rfc3339());
    }
    if let Some(newest) = stats.newest_memory {
        println!("  Newest memory:       {}", newest.to_rfc3339());
    }
    println!();

    println!("By Category ({}):", range.as_str());
    for c in &report.by_category {
        println!("  {:<12} {}", c.category, c.count);
    }
    println!();

    println!("By Type ({}):", range.as_str());
    for t in &report.by_type {
        println!("  {:<12} {}", t.memory_type, t.count);
    }
    println!();

    println!("Created ({}):", range.as_str());
    for b in &report.by_time {
        println!("  {:<12} {}", b.date, "#".repeat(b.count.min(50) as usize));
    }
    println!();

    if !report.popular_tags.is_empty() {
        println!("Popular tags:");
        for t in &report.popular_tags {
            println!("  {:<20} {}", t.tag, t.count);
        }
    }

    Ok(())
}
