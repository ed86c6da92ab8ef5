use super::models::{parse_events, Commit};
use crate::config::ActivityConfig;
use crate::http::{HttpFetcher, ACCEPT_JSON};
use crate::Result;

const GITHUB_API: &str = "https://api.github.com";

/// Anything that can produce the current commit list
#[async_trait::async_trait]
pub trait CommitSource: Send + Sync {
    async fn fetch_commits(&self) -> Result<Vec<Commit>>;
}

/// Public events of one GitHub user
pub struct GitHubActivitySource {
    username: String,
    per_page: u32,
    max_commits: usize,
    http: HttpFetcher,
}

impl GitHubActivitySource {
    pub fn new(config: &ActivityConfig, http: HttpFetcher) -> Self {
        Self {
            username: config.username.clone(),
            per_page: config.per_page,
            max_commits: config.max_commits,
            http,
        }
    }

    pub fn request_url(&self) -> String {
        format!(
            "{}/users/{}/events/public?per_page={}",
            GITHUB_API, self.username, self.per_page
        )
    }
}

#[async_trait::async_trait]
impl CommitSource for GitHubActivitySource {
    async fn fetch_commits(&self) -> Result<Vec<Commit>> {
        let url = self.request_url();
        tracing::debug!("Fetching GitHub activity: {}", url);

        let body = self.http.get_text(&url, ACCEPT_JSON).await?;
        parse_events(&body, self.max_commits)
    }
}
