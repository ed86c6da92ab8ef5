pub mod activity;
pub mod config;
pub mod error;
pub mod feed;
pub mod http;

pub use config::AppConfig;
pub use error::{Error, Result};
pub use feed::{BlogPanel, FeedChain, FeedItem, FeedState, ResolvedFeed};
