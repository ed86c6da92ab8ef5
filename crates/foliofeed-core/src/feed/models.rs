use serde::{Deserialize, Serialize};

/// A post as any source delivered it, before normalization
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawItem {
    pub title: Option<String>,
    pub link: Option<String>,
    pub thumbnail: Option<String>,
    pub pub_date: Option<String>,
    pub categories: Vec<String>,
    pub description: Option<String>,
    pub content: Option<String>,
}

/// Canonical post record handed to the panel. Every field is populated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedItem {
    pub title: String,
    /// Absolute URL, unique within a resolved list
    pub link: String,
    pub thumbnail: String,
    /// Best-effort date string as published by the source
    pub published_at: String,
    pub categories: Vec<String>,
    pub summary: String,
}

/// Result of one source attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Non-empty list of raw items in document order
    Items(Vec<RawItem>),
    /// Any failure: transport, status, parse, or an empty item list
    NoData,
}

impl FetchOutcome {
    pub fn from_items(items: Vec<RawItem>) -> Self {
        if items.is_empty() {
            FetchOutcome::NoData
        } else {
            FetchOutcome::Items(items)
        }
    }
}

/// Outcome of running the whole fallback chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedFeed {
    pub items: Vec<FeedItem>,
    /// Live data could not be obtained; `items` is the built-in dataset
    pub degraded: bool,
    /// A source failed unexpectedly (panicked) rather than reporting no data
    pub error: bool,
    /// Name of the source that produced `items`
    pub source: Option<String>,
}

impl ResolvedFeed {
    pub fn live(items: Vec<FeedItem>, source: &str) -> Self {
        Self {
            items,
            degraded: false,
            error: false,
            source: Some(source.to_string()),
        }
    }

    pub fn fallback(error: bool) -> Self {
        Self {
            items: super::fallback::fallback_items(),
            degraded: true,
            error,
            source: None,
        }
    }
}
