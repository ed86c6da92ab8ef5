use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;
use tokio::sync::{watch, Mutex};

use super::chain::FeedChain;
use super::models::FeedItem;

const MAX_BADGES: usize = 2;
const NOTICE: &str = "Showing sample articles";
const ERROR_NOTICE: &str = "Unable to load latest posts - Showing sample articles";

/// What the blog section currently shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedState {
    Loading,
    Ready {
        items: Vec<FeedItem>,
        degraded: bool,
        error: bool,
    },
}

impl FeedState {
    pub fn is_loading(&self) -> bool {
        matches!(self, FeedState::Loading)
    }

    /// Inline hint shown next to built-in posts
    pub fn notice(&self) -> Option<&'static str> {
        match self {
            FeedState::Ready { error: true, .. } => Some(ERROR_NOTICE),
            FeedState::Ready { degraded: true, .. } => Some(NOTICE),
            _ => None,
        }
    }

    pub fn cards(&self, placeholder_thumbnail: &str) -> Vec<Card> {
        match self {
            FeedState::Loading => Vec::new(),
            FeedState::Ready { items, .. } => items
                .iter()
                .map(|item| Card::new(item, placeholder_thumbnail))
                .collect(),
        }
    }
}

/// Blog section bound to one fallback chain.
///
/// The chain runs at most once per panel. Consumers observe the state through
/// [`BlogPanel::subscribe`]. After [`BlogPanel::teardown`] a late result is
/// dropped instead of published.
pub struct BlogPanel {
    chain: FeedChain,
    state_tx: watch::Sender<FeedState>,
    started: Mutex<bool>,
    mounted: AtomicBool,
}

impl BlogPanel {
    pub fn new(chain: FeedChain) -> Self {
        let (state_tx, _) = watch::channel(FeedState::Loading);
        Self {
            chain,
            state_tx,
            started: Mutex::new(false),
            mounted: AtomicBool::new(true),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<FeedState> {
        self.state_tx.subscribe()
    }

    pub fn state(&self) -> FeedState {
        self.state_tx.borrow().clone()
    }

    /// Resolve the feed if this is the first mount and return the resulting
    /// state. Concurrent and later calls wait for, then reuse, the first run.
    pub async fn mount(&self) -> FeedState {
        let mut started = self.started.lock().await;
        if !*started {
            *started = true;
            let resolved = self.chain.resolve().await;

            if self.mounted.load(Ordering::SeqCst) {
                self.state_tx.send_replace(FeedState::Ready {
                    items: resolved.items,
                    degraded: resolved.degraded,
                    error: resolved.error,
                });
            } else {
                tracing::debug!("Blog panel torn down before the feed resolved, dropping result");
            }
        }
        drop(started);
        self.state()
    }

    /// Start [`mount`](BlogPanel::mount) in the background
    pub fn spawn_mount(self: &Arc<Self>) -> tokio::task::JoinHandle<FeedState> {
        let panel = Arc::clone(self);
        tokio::spawn(async move { panel.mount().await })
    }

    /// Stop publishing; an in-flight resolution finishes but is discarded
    pub fn teardown(&self) {
        self.mounted.store(false, Ordering::SeqCst);
    }
}

/// Render-ready view of one post
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Card {
    pub title: String,
    pub date: String,
    pub summary: String,
    pub badges: Vec<String>,
    pub thumbnail: String,
    /// Substituted by the renderer when `thumbnail` fails to load
    pub fallback_thumbnail: String,
    pub link: String,
}

impl Card {
    pub fn new(item: &FeedItem, placeholder_thumbnail: &str) -> Self {
        Self {
            title: item.title.clone(),
            date: format_date(&item.published_at),
            summary: item.summary.clone(),
            badges: item.categories.iter().take(MAX_BADGES).cloned().collect(),
            thumbnail: item.thumbnail.clone(),
            fallback_thumbnail: placeholder_thumbnail.to_string(),
            link: item.link.clone(),
        }
    }
}

/// Format a feed date as "Dec 15, 2024"; unparseable input is shown as-is
pub fn format_date(raw: &str) -> String {
    let raw = raw.trim();
    let date = DateTime::parse_from_rfc2822(raw)
        .map(|dt| dt.date_naive())
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|dt| dt.date_naive()))
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|dt| dt.date()))
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"));

    match date {
        Ok(date) => date.format("%b %-d, %Y").to_string(),
        Err(_) => raw.to_string(),
    }
}
