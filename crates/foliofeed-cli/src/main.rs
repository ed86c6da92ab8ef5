use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use foliofeed_core::AppConfig;

mod commands;

#[derive(Parser)]
#[command(name = "foliofeed")]
#[command(author, version, about = "Latest blog posts and GitHub activity for a portfolio site")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to a config file (defaults to ~/.config/foliofeed/config.toml)
    #[arg(short = 'c', long = "config", global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the blog feed once and print the post cards
    Blog {
        /// Print the resolved feed as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show recent GitHub push activity
    Activity {
        /// Keep polling on the configured interval until Ctrl+C
        #[arg(short = 'w', long)]
        watch: bool,
    },
    /// List the configured feed sources in priority order
    Sources,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match cli.config {
        Some(ref path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| config.general.log_level.clone()),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();

    match cli.command {
        Some(Commands::Blog { json }) => commands::blog::run(&config, json).await,
        None => commands::blog::run(&config, false).await,
        Some(Commands::Activity { watch }) => commands::activity::run(&config, watch).await,
        Some(Commands::Sources) => commands::sources::run(&config),
    }
}
