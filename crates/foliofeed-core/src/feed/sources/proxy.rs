use url::form_urlencoded::byte_serialize;

use super::FeedSource;
use crate::feed::models::RawItem;
use crate::feed::parser::parse_feed_document;
use crate::http::{HttpFetcher, ACCEPT_FEED};
use crate::Result;

const URL_PLACEHOLDER: &str = "{url}";

/// Raw feed document fetched through a CORS proxy
pub struct ProxySource {
    name: String,
    template: String,
    feed_url: String,
    http: HttpFetcher,
}

impl ProxySource {
    pub fn new(name: &str, template: &str, feed_url: &str, http: HttpFetcher) -> Self {
        Self {
            name: name.to_string(),
            template: template.to_string(),
            feed_url: feed_url.to_string(),
            http,
        }
    }

    /// The template with `{url}` replaced by the encoded feed URL.
    /// Templates without a placeholder get the encoded URL appended.
    pub fn request_url(&self) -> String {
        let encoded: String = byte_serialize(self.feed_url.as_bytes()).collect();
        if self.template.contains(URL_PLACEHOLDER) {
            self.template.replace(URL_PLACEHOLDER, &encoded)
        } else {
            format!("{}{}", self.template, encoded)
        }
    }
}

#[async_trait::async_trait]
impl FeedSource for ProxySource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self) -> Result<Vec<RawItem>> {
        let url = self.request_url();
        tracing::debug!("Requesting feed through {}: {}", self.name, url);

        let body = self.http.get_text(&url, ACCEPT_FEED).await?;
        parse_feed_document(&body)
    }
}
