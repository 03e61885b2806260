//! Analytics aggregation and the category stack view.
//!
//! Grouping and counting happen in the store. This module picks the time
//! window, formats bucket labels, attaches colours, and ranks tags.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Duration, Months, Utc};
use serde::Serialize;

use crate::error::MemoryError;
use crate::memory::types::{Category, MemoryType, DEFAULT_COLOR_HEX};
use crate::store::{GroupColumn, MemoryStore, OverallStats};

/// Number of tags reported in `popular_tags`.
pub const POPULAR_TAG_LIMIT: usize = 10;

/// Named colour for stacks whose category has no palette entry.
const DEFAULT_STACK_COLOR: &str = "purple";

/// Window the histograms cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeRange {
    Week,
    #[default]
    Month,
    Year,
    All,
}

impl TimeRange {
    /// Parse a selector. Missing means `Month`; anything unrecognised means `All`.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            None | Some("") | Some("month") => Self::Month,
            Some("week") => Self::Week,
            Some("year") => Self::Year,
            Some(_) => Self::All,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
            Self::All => "all",
        }
    }

    /// Start of the window ending at `now`, or `None` for all time.
    pub fn since(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Self::Week => Some(now - Duration::days(7)),
            Self::Month => Some(now.checked_sub_months(Months::new(1)).unwrap_or(now)),
            Self::Year => Some(now.checked_sub_months(Months::new(12)).unwrap_or(now)),
            Self::All => None,
        }
    }

    /// `strftime` pattern for `by_time` bucket labels.
    pub fn bucket_format(&self) -> &'static str {
        match self {
            Self::Week => "%a",
            Self::Month => "%b %d",
            Self::Year => "%b",
            Self::All => "%Y-%m",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: u64,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeCount {
    #[serde(rename = "type")]
    pub memory_type: String,
    pub count: u64,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeBucket {
    pub date: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagCount {
    pub tag: String,
    pub count: u64,
}

/// Full analytics payload. Whole-table stats are flattened to the top level.
#[derive(Debug, Clone, Serialize)]
pub struct MemoryAnalytics {
    #[serde(flatten)]
    pub stats: OverallStats,
    pub by_category: Vec<CategoryCount>,
    pub by_type: Vec<TypeCount>,
    pub by_time: Vec<TimeBucket>,
    pub popular_tags: Vec<TagCount>,
}

/// One card in the stack view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryStack {
    pub title: String,
    pub description: String,
    pub item_count: u64,
    pub last_updated: String,
    pub color: String,
}

fn category_color(label: &str) -> String {
    label
        .parse::<Category>()
        .map(|c| c.color_hex())
        .unwrap_or(DEFAULT_COLOR_HEX)
        .to_string()
}

fn type_color(label: &str) -> String {
    label
        .parse::<MemoryType>()
        .map(|t| t.color_hex())
        .unwrap_or(DEFAULT_COLOR_HEX)
        .to_string()
}

/// Count timestamps per formatted label, keeping first-appearance order.
pub fn bucket_times(times: &[DateTime<Utc>], range: TimeRange) -> Vec<TimeBucket> {
    let format = range.bucket_format();
    let mut buckets: Vec<TimeBucket> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for t in times {
        let label = t.format(format).to_string();
        match index.get(&label) {
            Some(&i) => buckets[i].count += 1,
            None => {
                index.insert(label.clone(), buckets.len());
                buckets.push(TimeBucket {
                    date: label,
                    count: 1,
                });
            }
        }
    }
    buckets
}

/// Top [`POPULAR_TAG_LIMIT`] tags by count, ties broken alphabetically.
pub fn rank_tags(mut counts: Vec<(String, u64)>) -> Vec<TagCount> {
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    counts
        .into_iter()
        .take(POPULAR_TAG_LIMIT)
        .map(|(tag, count)| TagCount { tag, count })
        .collect()
}

/// Compute the analytics payload for `range`. Any failing aggregate fails the call.
pub async fn memory_analytics(
    store: &dyn MemoryStore,
    range: TimeRange,
    now: DateTime<Utc>,
) -> Result<MemoryAnalytics, MemoryError> {
    let since = range.since(now);

    let result = async {
        let stats = store.overall_stats(now).await?;
        let categories = store.count_by(GroupColumn::Category, since).await?;
        let types = store.count_by(GroupColumn::MemoryType, since).await?;
        let times = store.created_since(since).await?;
        let tags = store.tag_counts().await?;
        Ok::<_, crate::error::StoreError>((stats, categories, types, times, tags))
    }
    .await;

    let (stats, categories, types, times, tags) = result.map_err(|e| {
        tracing::error!(error = %e, range = range.as_str(), "analytics query failed");
        MemoryError::from(e)
    })?;

    Ok(MemoryAnalytics {
        stats,
        by_category: categories
            .into_iter()
            .map(|(category, count)| CategoryCount {
                color: category_color(&category),
                category,
                count,
            })
            .collect(),
        by_type: types
            .into_iter()
            .map(|(memory_type, count)| TypeCount {
                color: type_color(&memory_type),
                memory_type,
                count,
            })
            .collect(),
        by_time: bucket_times(&times, range),
        popular_tags: rank_tags(tags),
    })
}

/// Whole calendar months from `then` to `now`.
fn months_between(then: DateTime<Utc>, now: DateTime<Utc>) -> u32 {
    if now <= then {
        return 0;
    }
    let raw = (now.year() - then.year()) * 12 + now.month() as i32 - then.month() as i32;
    let mut months = raw.max(0) as u32;
    while months > 0 && then.checked_add_months(Months::new(months)).is_none_or(|t| t > now) {
        months -= 1;
    }
    months
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("1 {unit}")
    } else {
        format!("{n} {unit}s")
    }
}

/// Relative description of `then` as seen from `now`, e.g. `3 days ago`.
/// Thresholds and wording follow date-fns `formatDistance`.
pub fn format_time_ago(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    const DAY: i64 = 1440;
    const MONTH: i64 = 43200;

    let secs = (now - then).num_seconds().max(0);
    let minutes = (secs + 30) / 60;

    let distance = match minutes {
        0 => "less than a minute".to_string(),
        1 => "1 minute".to_string(),
        2..=44 => format!("{minutes} minutes"),
        45..=89 => "about 1 hour".to_string(),
        90..=1439 => format!("about {} hours", (minutes + 30) / 60),
        1440..=2519 => "1 day".to_string(),
        2520..=43199 => format!("{} days", (minutes + DAY / 2) / DAY),
        43200..=86399 => format!("about {}", plural((minutes + MONTH / 2) / MONTH, "month")),
        _ => {
            let months = months_between(then, now);
            if months < 12 {
                format!("{} months", (minutes + MONTH / 2) / MONTH)
            } else {
                let years = i64::from(months / 12);
                match months % 12 {
                    0..=2 => format!("about {}", plural(years, "year")),
                    3..=8 => format!("over {}", plural(years, "year")),
                    _ => format!("almost {}", plural(years + 1, "year")),
                }
            }
        }
    };
    format!("{distance} ago")
}

/// One stack per known category, then any other category present in the store.
pub async fn memory_stacks(
    store: &dyn MemoryStore,
    now: DateTime<Utc>,
) -> Result<Vec<MemoryStack>, MemoryError> {
    let activity = store.category_activity().await.map_err(|e| {
        tracing::error!(error = %e, "stack query failed");
        MemoryError::from(e)
    })?;

    let mut by_label: HashMap<&str, _> = activity
        .iter()
        .map(|a| (a.category.as_str(), a))
        .collect();

    let stack = |title: &str, count: u64, last: Option<DateTime<Utc>>, color: &str| MemoryStack {
        title: title.to_string(),
        description: format!("Collection of {title} memories"),
        item_count: count,
        last_updated: last
            .map(|t| format_time_ago(t, now))
            .unwrap_or_else(|| "never".to_string()),
        color: color.to_string(),
    };

    let mut stacks: Vec<MemoryStack> = Category::ALL
        .iter()
        .map(|c| {
            let found = by_label.remove(c.as_str());
            stack(
                c.as_str(),
                found.map_or(0, |a| a.count),
                found.and_then(|a| a.last_updated),
                c.color_name(),
            )
        })
        .collect();

    // Stored labels outside the known set, in store order.
    for a in &activity {
        if by_label.contains_key(a.category.as_str()) {
            stacks.push(stack(&a.category, a.count, a.last_updated, DEFAULT_STACK_COLOR));
        }
    }

    Ok(stacks)
}
