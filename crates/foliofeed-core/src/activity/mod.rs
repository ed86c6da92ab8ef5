//! Recent GitHub push activity, refreshed on a fixed interval.

mod fetcher;
mod models;
mod poller;

pub use fetcher::{CommitSource, GitHubActivitySource};
pub use models::{demo_commits, parse_events, Commit};
pub use poller::{ActivityHandle, ActivityPoller, ActivityState};
