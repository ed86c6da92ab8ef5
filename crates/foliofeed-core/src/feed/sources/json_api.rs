use url::Url;

use super::FeedSource;
use crate::feed::models::RawItem;
use crate::feed::parser::parse_json_feed;
use crate::http::{HttpFetcher, ACCEPT_JSON};
use crate::Result;

/// Feed-to-JSON conversion service (rss2json-style API)
pub struct JsonApiSource {
    name: String,
    endpoint: String,
    feed_url: String,
    http: HttpFetcher,
}

impl JsonApiSource {
    pub fn new(name: &str, endpoint: &str, feed_url: &str, http: HttpFetcher) -> Self {
        Self {
            name: name.to_string(),
            endpoint: endpoint.to_string(),
            feed_url: feed_url.to_string(),
            http,
        }
    }

    /// `<endpoint>?rss_url=<percent-encoded feed URL>`
    pub fn request_url(&self) -> Result<Url> {
        Ok(Url::parse_with_params(&self.endpoint, &[("rss_url", self.feed_url.as_str())])?)
    }
}

#[async_trait::async_trait]
impl FeedSource for JsonApiSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self) -> Result<Vec<RawItem>> {
        let url = self.request_url()?;
        tracing::debug!("Requesting feed through {}: {}", self.name, url);

        let body = self.http.get_text(url.as_str(), ACCEPT_JSON).await?;
        parse_json_feed(&body)
    }
}
