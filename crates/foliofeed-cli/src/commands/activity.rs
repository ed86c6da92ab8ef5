use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::info;

use foliofeed_core::activity::{demo_commits, ActivityPoller, ActivityState, GitHubActivitySource};
use foliofeed_core::http::HttpFetcher;
use foliofeed_core::AppConfig;

fn print_state(state: &ActivityState) {
    let ActivityState::Ready { commits, demo } = state else {
        return;
    };

    if *demo {
        println!("GitHub is unreachable, showing sample activity.\n");
    }
    if commits.is_empty() {
        println!("No recent push activity.");
    }

    for commit in commits {
        println!("  {}  {}", commit.sha, commit.message);
        println!("           {} · {}", commit.repo, commit.date);
    }
    println!();
}

pub async fn run(config: &AppConfig, watch: bool) -> Result<()> {
    let http = HttpFetcher::new(&config.http)?;
    let source = Arc::new(GitHubActivitySource::new(&config.activity, http));
    let poller = ActivityPoller::new(
        source,
        Duration::from_secs(config.activity.refresh_interval_secs),
        demo_commits(&config.activity.username),
    );

    let handle = poller.spawn();
    let mut state_rx = handle.subscribe();

    if !watch {
        state_rx.changed().await?;
        print_state(&state_rx.borrow_and_update());
        handle.teardown().await;
        return Ok(());
    }

    println!(
        "Watching GitHub activity for {} every {} seconds. Press Ctrl+C to stop.\n",
        config.activity.username, config.activity.refresh_interval_secs
    );

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Received shutdown signal");
                break;
            }
            changed = state_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                print_state(&state_rx.borrow_and_update());
            }
        }
    }

    handle.teardown().await;
    println!("Stopped.");

    Ok(())
}
