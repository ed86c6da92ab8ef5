use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub activity: ActivityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
    /// Attempts per request; only 429 and 503 responses or transport errors are retried
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// HTTP proxy URL (e.g., "http://127.0.0.1:7890" or "socks5://127.0.0.1:1080")
    #[serde(default)]
    pub proxy_url: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_timeout(),
            max_attempts: default_max_attempts(),
            proxy_url: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// The RSS feed every source ultimately reads
    #[serde(default = "default_feed_url")]
    pub feed_url: String,
    /// Maximum number of posts handed to the panel
    #[serde(default = "default_max_items")]
    pub max_items: usize,
    /// Summary length before the ellipsis is appended
    #[serde(default = "default_summary_max_chars")]
    pub summary_max_chars: usize,
    /// Image used when a post has no usable thumbnail
    #[serde(default = "default_placeholder_thumbnail")]
    pub placeholder_thumbnail: String,
    /// Upper bound for a single source attempt in seconds (0 = no bound)
    #[serde(default = "default_strategy_timeout")]
    pub strategy_timeout_secs: u64,
    /// Sources in priority order
    #[serde(default = "default_sources")]
    pub sources: Vec<SourceConfig>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            feed_url: default_feed_url(),
            max_items: default_max_items(),
            summary_max_chars: default_summary_max_chars(),
            placeholder_thumbnail: default_placeholder_thumbnail(),
            strategy_timeout_secs: default_strategy_timeout(),
            sources: default_sources(),
        }
    }
}

/// One entry of `[[feed.sources]]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceConfig {
    /// Feed-to-JSON conversion service, called as `<endpoint>?rss_url=<feed>`
    JsonApi { name: String, endpoint: String },
    /// CORS proxy returning the raw feed; `{url}` is replaced by the encoded feed URL
    Proxy { name: String, template: String },
}

impl SourceConfig {
    pub fn name(&self) -> &str {
        match self {
            SourceConfig::JsonApi { name, .. } | SourceConfig::Proxy { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityConfig {
    /// GitHub user whose public events are shown
    #[serde(default = "default_github_username")]
    pub username: String,
    /// Events requested per poll
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    /// Maximum commits kept from the events
    #[serde(default = "default_max_commits")]
    pub max_commits: usize,
    /// Poll interval in seconds
    #[serde(default = "default_activity_interval")]
    pub refresh_interval_secs: u64,
}

impl Default for ActivityConfig {
    fn default() -> Self {
        Self {
            username: default_github_username(),
            per_page: default_per_page(),
            max_commits: default_max_commits(),
            refresh_interval_secs: default_activity_interval(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_timeout() -> u64 {
    15
}

fn default_max_attempts() -> u32 {
    1
}

fn default_feed_url() -> String {
    "https://medium.com/feed/@agusain2001".to_string()
}

fn default_max_items() -> usize {
    3
}

fn default_summary_max_chars() -> usize {
    150
}

fn default_placeholder_thumbnail() -> String {
    "https://miro.medium.com/max/1200/1*jfdwtvU6V6g99q3G7gq7dQ.png".to_string()
}

fn default_strategy_timeout() -> u64 {
    10
}

fn default_sources() -> Vec<SourceConfig> {
    vec![
        SourceConfig::JsonApi {
            name: "rss2json".to_string(),
            endpoint: "https://api.rss2json.com/v1/api.json".to_string(),
        },
        SourceConfig::Proxy {
            name: "allorigins".to_string(),
            template: "https://api.allorigins.win/raw?url={url}".to_string(),
        },
        SourceConfig::Proxy {
            name: "corsproxy".to_string(),
            template: "https://corsproxy.io/?url={url}".to_string(),
        },
    ]
}

fn default_github_username() -> String {
    "agusain2001".to_string()
}

fn default_per_page() -> u32 {
    10
}

fn default_max_commits() -> usize {
    6
}

fn default_activity_interval() -> u64 {
    300 // 5 minutes
}

/// Expand tilde (~) in path to user's home directory
fn expand_tilde(path: &Path) -> PathBuf {
    if let Some(path_str) = path.to_str() {
        if let Some(stripped) = path_str.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(stripped);
            }
        } else if path_str == "~" {
            if let Some(home) = dirs::home_dir() {
                return home;
            }
        }
    }
    path.to_path_buf()
}

impl AppConfig {
    /// Load configuration from the default path or return defaults
    pub fn load() -> crate::Result<Self> {
        let config_path = Self::config_path();

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from an explicit file
    pub fn load_from(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(expand_tilde(path))?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration text
    pub fn from_toml(content: &str) -> crate::Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| crate::Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> crate::Result<()> {
        if self.feed.max_items == 0 {
            return Err(crate::Error::Config("feed.max_items must be at least 1".to_string()));
        }
        if self.feed.placeholder_thumbnail.trim().is_empty() {
            return Err(crate::Error::Config(
                "feed.placeholder_thumbnail must not be empty".to_string(),
            ));
        }
        url::Url::parse(&self.feed.feed_url)?;
        Ok(())
    }

    /// Get the configuration file path
    /// Always uses ~/.config/foliofeed/config.toml on all platforms
    pub fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("foliofeed")
            .join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_file() {
        let config = AppConfig::from_toml("").unwrap();
        assert_eq!(config.feed.max_items, 3);
        assert_eq!(config.feed.summary_max_chars, 150);
        assert_eq!(config.feed.sources.len(), 3);
        assert_eq!(config.feed.sources[0].name(), "rss2json");
        assert_eq!(config.activity.refresh_interval_secs, 300);
    }

    #[test]
    fn test_sources_are_data() {
        let config = AppConfig::from_toml(
            r#"
[feed]
feed_url = "https://example.com/feed.xml"

[[feed.sources]]
kind = "proxy"
name = "only-proxy"
template = "https://proxy.example/raw?url={url}"
"#,
        )
        .unwrap();

        assert_eq!(
            config.feed.sources,
            vec![SourceConfig::Proxy {
                name: "only-proxy".to_string(),
                template: "https://proxy.example/raw?url={url}".to_string(),
            }]
        );
        assert_eq!(config.feed.max_items, 3);
    }

    #[test]
    fn test_rejects_zero_max_items() {
        let err = AppConfig::from_toml("[feed]\nmax_items = 0\n").unwrap_err();
        assert!(matches!(err, crate::Error::Config(_)));
    }

    #[test]
    fn test_rejects_relative_feed_url() {
        let err = AppConfig::from_toml("[feed]\nfeed_url = \"feed.xml\"\n").unwrap_err();
        assert!(matches!(err, crate::Error::UrlParse(_)));
    }
}
