//! Remote sources the fallback chain tries in order.
//!
//! A source only has to know how to fetch and adapt its own format into
//! [`RawItem`]s. Turning failures into [`FetchOutcome::NoData`] happens once,
//! in [`FeedSource::attempt`], so the chain never sees an error.

mod json_api;
mod proxy;

pub use json_api::JsonApiSource;
pub use proxy::ProxySource;

use std::sync::Arc;

use super::models::{FetchOutcome, RawItem};
use crate::config::{FeedConfig, SourceConfig};
use crate::http::HttpFetcher;
use crate::Result;

/// One way of obtaining the feed
#[async_trait::async_trait]
pub trait FeedSource: Send + Sync {
    /// Label used in logs and in the resolved feed
    fn name(&self) -> &str;

    /// Fetch and adapt the remote data
    async fn fetch(&self) -> Result<Vec<RawItem>>;

    /// Run [`fetch`](FeedSource::fetch), reporting every failure as `NoData`
    async fn attempt(&self) -> FetchOutcome {
        match self.fetch().await {
            Ok(items) => {
                if items.is_empty() {
                    tracing::warn!(source = self.name(), "Source returned no items");
                }
                FetchOutcome::from_items(items)
            }
            Err(e) => {
                tracing::warn!(source = self.name(), error = %e, "Source unavailable");
                FetchOutcome::NoData
            }
        }
    }
}

/// Build the configured sources in priority order
pub fn build_sources(config: &FeedConfig, http: &HttpFetcher) -> Vec<Arc<dyn FeedSource>> {
    config
        .sources
        .iter()
        .map(|source| -> Arc<dyn FeedSource> {
            match source {
                SourceConfig::JsonApi { name, endpoint } => Arc::new(JsonApiSource::new(
                    name,
                    endpoint,
                    &config.feed_url,
                    http.clone(),
                )),
                SourceConfig::Proxy { name, template } => Arc::new(ProxySource::new(
                    name,
                    template,
                    &config.feed_url,
                    http.clone(),
                )),
            }
        })
        .collect()
}
