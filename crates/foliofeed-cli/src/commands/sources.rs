use anyhow::Result;

use foliofeed_core::{config::SourceConfig, AppConfig};

pub fn run(config: &AppConfig) -> Result<()> {
    println!("Feed: {}\n", config.feed.feed_url);

    if config.feed.sources.is_empty() {
        println!("No sources configured; the built-in posts will always be shown.");
        return Ok(());
    }

    println!("Sources ({}), tried in order:\n", config.feed.sources.len());

    for (index, source) in config.feed.sources.iter().enumerate() {
        match source {
            SourceConfig::JsonApi { name, endpoint } => {
                println!("  {}. {} (json api)", index + 1, name);
                println!("     Endpoint: {}", endpoint);
            }
            SourceConfig::Proxy { name, template } => {
                println!("  {}. {} (proxy)", index + 1, name);
                println!("     Template: {}", template);
            }
        }
    }

    match config.feed.strategy_timeout_secs {
        0 => println!("\nNo per-source timeout."),
        secs => println!("\nEach source is given {} seconds.", secs),
    }

    Ok(())
}
