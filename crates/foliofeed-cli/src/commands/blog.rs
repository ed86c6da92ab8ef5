use anyhow::Result;

use foliofeed_core::{AppConfig, BlogPanel, FeedChain, FeedState};

pub async fn run(config: &AppConfig, json: bool) -> Result<()> {
    let panel = BlogPanel::new(FeedChain::from_config(config)?);

    if !json {
        println!("Loading latest posts...\n");
    }

    let state = panel.mount().await;
    let cards = state.cards(&config.feed.placeholder_thumbnail);

    if json {
        let degraded = matches!(state, FeedState::Ready { degraded: true, .. });
        let output = serde_json::json!({
            "degraded": degraded,
            "notice": state.notice(),
            "cards": cards,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if let Some(notice) = state.notice() {
        println!("{}\n", notice);
    }

    for card in &cards {
        println!("  {}", card.title);
        if !card.date.is_empty() {
            println!("    {}", card.date);
        }
        if !card.badges.is_empty() {
            println!("    [{}]", card.badges.join("] ["));
        }
        if !card.summary.is_empty() {
            println!("    {}", card.summary);
        }
        println!("    Read more: {}", card.link);
        println!();
    }

    Ok(())
}
