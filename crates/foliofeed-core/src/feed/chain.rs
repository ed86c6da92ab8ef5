use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use super::models::{FetchOutcome, ResolvedFeed};
use super::normalize::{normalize_items, NormalizeOptions};
use super::sources::{build_sources, FeedSource};
use crate::config::AppConfig;
use crate::http::HttpFetcher;
use crate::Result;

/// Ordered fallback chain ending in the built-in dataset
pub struct FeedChain {
    sources: Vec<Arc<dyn FeedSource>>,
    options: NormalizeOptions,
    max_items: usize,
    strategy_timeout: Option<Duration>,
}

impl FeedChain {
    pub fn new(sources: Vec<Arc<dyn FeedSource>>, options: NormalizeOptions, max_items: usize) -> Self {
        Self {
            sources,
            options,
            max_items: max_items.max(1),
            strategy_timeout: None,
        }
    }

    /// Build the chain described by the configuration
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let http = HttpFetcher::new(&config.http)?;
        let chain = Self::new(
            build_sources(&config.feed, &http),
            NormalizeOptions::from(&config.feed),
            config.feed.max_items,
        );
        Ok(match config.feed.strategy_timeout_secs {
            0 => chain,
            secs => chain.with_strategy_timeout(Duration::from_secs(secs)),
        })
    }

    /// Bound every attempt; an attempt that runs out of time counts as no data
    pub fn with_strategy_timeout(mut self, timeout: Duration) -> Self {
        self.strategy_timeout = Some(timeout);
        self
    }

    pub fn sources(&self) -> &[Arc<dyn FeedSource>] {
        &self.sources
    }

    /// Run one source attempt in its own task so a panicking source cannot
    /// take the caller down. `Err` means the task panicked or was cancelled.
    async fn run_attempt(&self, source: &Arc<dyn FeedSource>) -> std::result::Result<FetchOutcome, tokio::task::JoinError> {
        let task_source = Arc::clone(source);
        let strategy_timeout = self.strategy_timeout;

        tokio::spawn(async move {
            match strategy_timeout {
                Some(limit) => match tokio::time::timeout(limit, task_source.attempt()).await {
                    Ok(outcome) => outcome,
                    Err(_) => {
                        warn!(
                            source = task_source.name(),
                            timeout_ms = limit.as_millis() as u64,
                            "Source timed out"
                        );
                        FetchOutcome::NoData
                    }
                },
                None => task_source.attempt().await,
            }
        })
        .await
    }

    /// Try each source in order, one at a time, and stop at the first that
    /// yields usable items. Never fails: exhaustion returns the built-in
    /// dataset marked degraded.
    pub async fn resolve(&self) -> ResolvedFeed {
        for source in &self.sources {
            debug!("Trying feed source: {}", source.name());

            let outcome = match self.run_attempt(source).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!("Feed source '{}' failed unexpectedly: {}", source.name(), e);
                    return ResolvedFeed::fallback(true);
                }
            };

            let FetchOutcome::Items(raw) = outcome else {
                continue;
            };

            let items = normalize_items(&raw, &self.options, self.max_items);
            if items.is_empty() {
                warn!(
                    "Feed source '{}' returned {} items but none were usable",
                    source.name(),
                    raw.len()
                );
                continue;
            }

            info!("Loaded {} posts from '{}'", items.len(), source.name());
            return ResolvedFeed::live(items, source.name());
        }

        warn!("All feed sources failed, using built-in posts");
        ResolvedFeed::fallback(false)
    }
}
