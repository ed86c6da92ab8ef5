use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_ENCODING, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::{Client, Proxy, Response, StatusCode};

use crate::config::HttpConfig;
use crate::{Error, Result};

const MAX_BODY_BYTES: usize = 5 * 1024 * 1024;
const INITIAL_RETRY_DELAY_MS: u64 = 500;

pub const ACCEPT_FEED: &str =
    "application/rss+xml,application/atom+xml,application/xml;q=0.9,text/xml;q=0.8,*/*;q=0.5";
pub const ACCEPT_JSON: &str = "application/json,*/*;q=0.5";

// Rotating User-Agent pool; some proxies reject non-browser clients
static USER_AGENT_INDEX: AtomicUsize = AtomicUsize::new(0);
const USER_AGENTS: &[&str] = &[
    // Chrome on macOS
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    // Chrome on Windows
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    // Firefox on macOS
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:121.0) Gecko/20100101 Firefox/121.0",
    // Safari on macOS
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Safari/605.1.15",
];

/// Get the next User-Agent in rotation
fn next_user_agent() -> &'static str {
    let index = USER_AGENT_INDEX.fetch_add(1, Ordering::Relaxed) % USER_AGENTS.len();
    USER_AGENTS[index]
}

/// Delay before retry `attempt` (1-based): 500ms, 1s, 2s, ...
fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_millis(INITIAL_RETRY_DELAY_MS * 2u64.pow(attempt.saturating_sub(1)))
}

/// Shared HTTP client used by every remote source
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
    max_attempts: u32,
}

impl HttpFetcher {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let client = Self::build_client(config.request_timeout_secs, &config.proxy_url)?;

        Ok(Self {
            client,
            max_attempts: config.max_attempts.max(1),
        })
    }

    /// Build HTTP client with optional proxy
    fn build_client(timeout_secs: u64, proxy_url: &Option<String>) -> Result<Client> {
        let mut builder = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(10));

        if let Some(ref proxy) = proxy_url {
            let proxy = Proxy::all(proxy)
                .map_err(|e| Error::Config(format!("Invalid proxy URL: {}", e)))?;
            builder = builder.proxy(proxy);
            tracing::info!("Using HTTP proxy for outbound requests");
        }

        builder.build().map_err(Error::Http)
    }

    fn build_headers(accept: &'static str, user_agent: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(accept));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip, deflate, br"));
        if let Ok(ua) = HeaderValue::from_str(user_agent) {
            headers.insert(USER_AGENT, ua);
        }
        headers
    }

    /// Fetch with retry and exponential backoff on 429/503 and transport errors
    async fn fetch_with_retry(&self, url: &str, accept: &'static str) -> Result<(StatusCode, Bytes)> {
        let mut last_error = None;

        for attempt in 0..self.max_attempts {
            if attempt > 0 {
                tokio::time::sleep(backoff_delay(attempt)).await;
            }

            let user_agent = next_user_agent();
            tracing::debug!(url, attempt = attempt + 1, "Sending request");

            match self
                .client
                .get(url)
                .headers(Self::build_headers(accept, user_agent))
                .send()
                .await
            {
                Ok(response) => {
                    let status = response.status();

                    if status == StatusCode::TOO_MANY_REQUESTS
                        || status == StatusCode::SERVICE_UNAVAILABLE
                    {
                        tracing::warn!("Received {} for {}", status, url);
                        last_error = Some(Error::FeedParse(format!("HTTP {} for URL: {}", status, url)));
                        continue;
                    }

                    match read_body(response, url).await {
                        Ok(bytes) => return Ok((status, bytes)),
                        Err(Error::Http(e)) => {
                            tracing::warn!("Failed to read response body: {}", e);
                            last_error = Some(Error::Http(e));
                        }
                        Err(e) => return Err(e),
                    }
                }
                Err(e) => {
                    tracing::warn!("Request failed for {} (attempt {}): {}", url, attempt + 1, e);
                    last_error = Some(Error::Http(e));
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            Error::Other(format!(
                "Failed to fetch URL after {} attempts: {}",
                self.max_attempts, url
            ))
        }))
    }

    /// GET `url` and return the body as text; non-success statuses are errors
    pub async fn get_text(&self, url: &str, accept: &'static str) -> Result<String> {
        let (status, body) = self.fetch_with_retry(url, accept).await?;

        if !status.is_success() {
            return Err(Error::FeedParse(format!("HTTP {} for URL: {}", status, url)));
        }

        if is_challenge_page(&body) {
            return Err(Error::FeedParse(format!(
                "Browser verification page returned for URL: {}",
                url
            )));
        }

        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}

fn too_large(size: u64, url: &str) -> Error {
    Error::FeedParse(format!("Response too large ({} bytes) for URL: {}", size, url))
}

/// Read the body in chunks, giving up as soon as it exceeds the size cap
async fn read_body(mut response: Response, url: &str) -> Result<Bytes> {
    if let Some(len) = response.content_length() {
        if len > MAX_BODY_BYTES as u64 {
            return Err(too_large(len, url));
        }
    }

    let mut body = BytesMut::new();
    while let Some(chunk) = response.chunk().await? {
        if body.len() + chunk.len() > MAX_BODY_BYTES {
            return Err(too_large((body.len() + chunk.len()) as u64, url));
        }
        body.extend_from_slice(&chunk);
    }

    Ok(body.freeze())
}

/// Check if content is a Cloudflare challenge page rather than the payload
fn is_challenge_page(content: &[u8]) -> bool {
    let check_len = content.len().min(2048);
    let preview = String::from_utf8_lossy(&content[..check_len]);

    preview.contains("Just a moment...")
        || preview.contains("cf-browser-verification")
        || preview.contains("_cf_chl_opt")
        || preview.contains("challenge-platform")
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    pub struct Route {
        path: &'static str,
        status: u16,
        body: String,
    }

    pub fn route(path: &'static str, status: u16, body: impl Into<String>) -> Route {
        Route {
            path,
            status,
            body: body.into(),
        }
    }

    /// Serve canned responses on a local port, matched by path without the
    /// query string. Unknown paths get a 404. Returns the base URL.
    pub async fn serve(routes: Vec<Route>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let routes = Arc::new(routes);

        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                let routes = Arc::clone(&routes);
                tokio::spawn(async move {
                    let mut request = Vec::new();
                    let mut buf = [0u8; 1024];
                    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                        match stream.read(&mut buf).await {
                            Ok(0) | Err(_) => return,
                            Ok(n) => request.extend_from_slice(&buf[..n]),
                        }
                    }

                    let request = String::from_utf8_lossy(&request);
                    let target = request.split_whitespace().nth(1).unwrap_or("/");
                    let path = target.split('?').next().unwrap_or("/");
                    let (status, body) = routes
                        .iter()
                        .find(|r| r.path == path)
                        .map(|r| (r.status, r.body.clone()))
                        .unwrap_or((404, String::new()));

                    let head = format!(
                        "HTTP/1.1 {} Canned\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                        status,
                        body.len()
                    );
                    let _ = stream.write_all(head.as_bytes()).await;
                    let _ = stream.write_all(body.as_bytes()).await;
                    let _ = stream.shutdown().await;
                });
            }
        });

        format!("http://{}", addr)
    }

    /// Fetcher that ignores proxy environment variables so requests reach
    /// the local server
    pub fn local_fetcher() -> HttpFetcher {
        HttpFetcher {
            client: Client::builder()
                .no_proxy()
                .timeout(Duration::from_secs(5))
                .build()
                .unwrap(),
            max_attempts: 1,
        }
    }

    #[test]
    fn test_backoff_delay() {
        assert_eq!(backoff_delay(1), Duration::from_millis(500));
        assert_eq!(backoff_delay(2), Duration::from_millis(1000));
        assert_eq!(backoff_delay(3), Duration::from_millis(2000));
    }

    #[test]
    fn test_user_agent_rotation() {
        let distinct: std::collections::HashSet<_> = USER_AGENTS.iter().collect();
        assert_eq!(distinct.len(), USER_AGENTS.len());
        assert!(USER_AGENTS.contains(&next_user_agent()));
        assert!(USER_AGENTS.contains(&next_user_agent()));
    }

    #[test]
    fn test_challenge_detection() {
        assert!(is_challenge_page(b"<html><title>Just a moment...</title></html>"));
        assert!(!is_challenge_page(b"<?xml version=\"1.0\"?><rss></rss>"));
    }

    #[test]
    fn test_zero_attempts_clamped() {
        let config = HttpConfig {
            max_attempts: 0,
            ..HttpConfig::default()
        };
        let fetcher = HttpFetcher::new(&config).unwrap();
        assert_eq!(fetcher.max_attempts, 1);
    }

    #[tokio::test]
    async fn test_get_text_returns_body() {
        let base = serve(vec![route("/feed", 200, "<rss></rss>")]).await;

        let body = local_fetcher()
            .get_text(&format!("{}/feed?url=x", base), ACCEPT_FEED)
            .await
            .unwrap();

        assert_eq!(body, "<rss></rss>");
    }

    #[tokio::test]
    async fn test_error_status_is_rejected() {
        let base = serve(vec![route("/broken", 500, "upstream error")]).await;

        let err = local_fetcher()
            .get_text(&format!("{}/broken", base), ACCEPT_JSON)
            .await
            .unwrap_err();

        match err {
            Error::FeedParse(msg) => assert!(msg.contains("500"), "unexpected message: {}", msg),
            other => panic!("expected FeedParse, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_challenge_page_is_rejected() {
        let page = "<html><head><title>Just a moment...</title></head></html>";
        let base = serve(vec![route("/raw", 200, page)]).await;

        let err = local_fetcher()
            .get_text(&format!("{}/raw", base), ACCEPT_FEED)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::FeedParse(_)));
    }

    #[tokio::test]
    async fn test_oversized_body_is_rejected() {
        let base = serve(vec![route("/huge", 200, "a".repeat(MAX_BODY_BYTES + 1))]).await;

        let err = local_fetcher()
            .get_text(&format!("{}/huge", base), ACCEPT_FEED)
            .await
            .unwrap_err();

        match err {
            Error::FeedParse(msg) => assert!(msg.contains("too large"), "unexpected message: {}", msg),
            other => panic!("expected FeedParse, got {:?}", other),
        }
    }
}
