mod helpers;

use chrono::{Duration, Utc};
use helpers::{counting_store, tagged_input, FakeProvider};
use memoryos::error::MemoryError;
use memoryos::memory::analytics::{self, TimeRange};
use memoryos::memory::ingest;
use memoryos::memory::types::Category;

#[tokio::test]
async fn empty_store_reports_zeroes() {
    let store = counting_store();
    let report = analytics::memory_analytics(&store, TimeRange::Month, Utc::now())
        .await
        .unwrap();

    assert_eq!(report.stats.total_memories, 0);
    assert!(report.stats.newest_memory.is_none());
    assert!(report.by_category.is_empty());
    assert!(report.by_time.is_empty());
    assert!(report.popular_tags.is_empty());
}

#[tokio::test]
async fn report_counts_categories_types_and_tags() {
    let store = counting_store();
    let provider = FakeProvider::new();
    for (title, category, tags) in [
        ("a", "Idea", vec!["x", "y"]),
        ("b", "Idea", vec!["x"]),
        ("c", "Task", vec!["x", "z"]),
    ] {
        ingest::create_memory(&store, &provider, tagged_input(title, "body", category, &tags))
            .await
            .unwrap();
    }

    let now = Utc::now() + Duration::seconds(1);
    let report = analytics::memory_analytics(&store, TimeRange::Week, now)
        .await
        .unwrap();

    assert_eq!(report.stats.total_memories, 3);
    assert_eq!(report.stats.total_categories, 2);
    assert_eq!(report.stats.memories_last_week, 3);
    assert_eq!(report.stats.memories_last_month, 3);

    assert_eq!(report.by_category[0].category, "Idea");
    assert_eq!(report.by_category[0].count, 2);
    assert_eq!(report.by_category[0].color, Category::Idea.color_hex());
    assert_eq!(report.by_type.len(), 1);
    assert_eq!(report.by_type[0].memory_type, "Note");
    assert_eq!(report.by_type[0].count, 3);

    let total_bucketed: u64 = report.by_time.iter().map(|b| b.count).sum();
    assert_eq!(total_bucketed, 3);

    let tags: Vec<(&str, u64)> = report
        .popular_tags
        .iter()
        .map(|t| (t.tag.as_str(), t.count))
        .collect();
    assert_eq!(tags, vec![("x", 3), ("y", 1), ("z", 1)]);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["total_memories"], 3);
    assert_eq!(json["by_type"][0]["type"], "Note");
}

#[tokio::test]
async fn window_excludes_records_before_it() {
    let store = counting_store();
    let provider = FakeProvider::new();
    ingest::create_memory(&store, &provider, tagged_input("old", "body", "Task", &[]))
        .await
        .unwrap();

    // Viewed from two weeks ahead, the record is outside the week window but
    // inside the month window.
    let later = Utc::now() + Duration::days(14);
    let week = analytics::memory_analytics(&store, TimeRange::Week, later)
        .await
        .unwrap();
    assert!(week.by_category.is_empty());
    assert!(week.by_time.is_empty());
    assert_eq!(week.stats.total_memories, 1, "overall stats ignore the window");

    let month = analytics::memory_analytics(&store, TimeRange::Month, later)
        .await
        .unwrap();
    assert_eq!(month.by_category.len(), 1);
}

#[tokio::test]
async fn any_failing_aggregate_fails_the_report() {
    let store = counting_store();
    store.set_failing(true);

    let err = analytics::memory_analytics(&store, TimeRange::All, Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, MemoryError::Store(_)));
}

#[tokio::test]
async fn stacks_cover_every_known_category() {
    let store = counting_store();
    let provider = FakeProvider::new();
    ingest::create_memory(&store, &provider, tagged_input("m", "body", "Meeting", &[]))
        .await
        .unwrap();
    ingest::create_memory(&store, &provider, tagged_input("n", "body", "Meeting", &[]))
        .await
        .unwrap();

    let stacks = analytics::memory_stacks(&store, Utc::now()).await.unwrap();
    assert_eq!(stacks.len(), Category::ALL.len());

    let meeting = stacks.iter().find(|s| s.title == "Meeting").unwrap();
    assert_eq!(meeting.item_count, 2);
    assert_eq!(meeting.description, "Collection of Meeting memories");
    assert_eq!(meeting.color, "amber");
    assert_eq!(meeting.last_updated, "less than a minute ago");

    let idea = stacks.iter().find(|s| s.title == "Idea").unwrap();
    assert_eq!(idea.item_count, 0);
    assert_eq!(idea.last_updated, "never");
}

#[tokio::test]
async fn stacks_propagate_store_failure() {
    let store = counting_store();
    store.set_failing(true);
    assert!(analytics::memory_stacks(&store, Utc::now()).await.is_err());
}
