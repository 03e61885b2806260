//! Core memory type definitions.
//!
//! Defines [`Category`] and [`MemoryType`] (the two label enums), [`Memory`]
//! (a full record), [`SearchHit`] (a record as returned by search), and the
//! request-side [`MemoryInput`] with its [`TagsInput`] normalization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fallback colour for labels without an entry in the palette.
pub const DEFAULT_COLOR_HEX: &str = "#64748b";

/// Topic a memory is filed under. Stacks group memories by category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Category {
    #[default]
    Research,
    Product,
    Meeting,
    Learning,
    Idea,
    Task,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Self::Research,
        Self::Product,
        Self::Meeting,
        Self::Learning,
        Self::Idea,
        Self::Task,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Research => "Research",
            Self::Product => "Product",
            Self::Meeting => "Meeting",
            Self::Learning => "Learning",
            Self::Idea => "Idea",
            Self::Task => "Task",
        }
    }

    /// Chart colour used by analytics.
    pub fn color_hex(&self) -> &'static str {
        match self {
            Self::Research => "#3b82f6",
            Self::Product => "#8b5cf6",
            Self::Meeting => "#f59e0b",
            Self::Learning => "#ec4899",
            Self::Idea => "#10b981",
            Self::Task => "#6366f1",
        }
    }

    /// Named colour used by stack cards.
    pub fn color_name(&self) -> &'static str {
        match self {
            Self::Research => "blue",
            Self::Product => "purple",
            Self::Meeting => "amber",
            Self::Learning => "pink",
            Self::Idea => "emerald",
            Self::Task => "indigo",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown category: {s}"))
    }
}

/// Kind of material a memory holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MemoryType {
    #[default]
    Note,
    Link,
    Document,
    Analysis,
    Concept,
    Event,
}

impl MemoryType {
    pub const ALL: [MemoryType; 6] = [
        Self::Note,
        Self::Link,
        Self::Document,
        Self::Analysis,
        Self::Concept,
        Self::Event,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Note => "Note",
            Self::Link => "Link",
            Self::Document => "Document",
            Self::Analysis => "Analysis",
            Self::Concept => "Concept",
            Self::Event => "Event",
        }
    }

    pub fn color_hex(&self) -> &'static str {
        match self {
            Self::Note => "#8b5cf6",
            Self::Link => "#3b82f6",
            Self::Document => "#f59e0b",
            Self::Analysis => "#10b981",
            Self::Concept => "#ec4899",
            Self::Event => "#6366f1",
        }
    }
}

impl std::fmt::Display for MemoryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MemoryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown memory type: {s}"))
    }
}

/// A memory record, matching the `memories` table schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Memory {
    /// UUID v7 primary key, assigned by the store.
    pub id: String,
    pub title: String,
    pub category: Category,
    pub memory_type: MemoryType,
    /// The full text the summary and embedding are derived from.
    pub content: String,
    /// Provider summary (at most 150 characters) or the truncation fallback.
    pub summary: String,
    pub tags: Vec<String>,
    pub has_reminder: bool,
    pub source_url: Option<String>,
    /// `None` when the provider could not produce a vector. That is an expected state.
    pub embedding: Option<Vec<f32>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A search result: the stored record plus a similarity figure in `[0, 1]`
/// when the store reports one.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    #[serde(flatten)]
    pub memory: Memory,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f64>,
}

/// Tags as clients send them: a comma-delimited string or a list.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TagsInput {
    Delimited(String),
    List(Vec<String>),
}

impl TagsInput {
    /// Split a delimited string on commas, trimming and dropping empties. A list
    /// passes through as given. Both forms lose exact duplicates, keeping the
    /// first occurrence.
    pub fn normalize(self) -> Vec<String> {
        let tags: Vec<String> = match self {
            Self::Delimited(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect(),
            Self::List(list) => list,
        };

        let mut seen = std::collections::HashSet::new();
        tags.into_iter().filter(|t| seen.insert(t.clone())).collect()
    }
}

/// Request body for create and update.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MemoryInput {
    pub title: String,
    pub category: Option<String>,
    pub memory_type: Option<String>,
    pub content: String,
    pub tags: Option<TagsInput>,
    pub has_reminder: Option<bool>,
    pub source_url: Option<String>,
}
