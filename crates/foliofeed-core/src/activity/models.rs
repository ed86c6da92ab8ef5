use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::feed::truncate;
use crate::Result;

const SHORT_SHA_LEN: usize = 7;
const MESSAGE_MAX_CHARS: usize = 60;

/// One commit as shown in the activity list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Commit {
    pub sha: String,
    pub message: String,
    pub date: String,
    pub repo: String,
    pub url: String,
}

#[derive(Debug, Deserialize)]
struct GitHubEvent {
    #[serde(rename = "type")]
    kind: String,
    repo: EventRepo,
    #[serde(default)]
    payload: EventPayload,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct EventRepo {
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct EventPayload {
    #[serde(default)]
    commits: Option<Vec<EventCommit>>,
}

#[derive(Debug, Deserialize)]
struct EventCommit {
    sha: String,
    message: String,
}

/// Parse the public events endpoint and keep the newest `max` pushed commits
pub fn parse_events(body: &str, max: usize) -> Result<Vec<Commit>> {
    let events: Vec<GitHubEvent> = serde_json::from_str(body)?;
    Ok(extract_commits(events, max))
}

fn extract_commits(events: Vec<GitHubEvent>, max: usize) -> Vec<Commit> {
    events
        .into_iter()
        .filter(|event| event.kind == "PushEvent")
        .flat_map(|event| {
            let repo_name = event.repo.name;
            let date = event.created_at.format("%b %-d, %I:%M %p").to_string();
            event
                .payload
                .commits
                .unwrap_or_default()
                .into_iter()
                .map(move |commit| Commit {
                    sha: commit.sha.chars().take(SHORT_SHA_LEN).collect(),
                    message: truncate(commit.message.lines().next().unwrap_or(""), MESSAGE_MAX_CHARS),
                    date: date.clone(),
                    repo: repo_name
                        .split_once('/')
                        .map(|(_, repo)| repo.to_string())
                        .unwrap_or_else(|| repo_name.clone()),
                    url: format!("https://github.com/{}/commit/{}", repo_name, commit.sha),
                })
        })
        .take(max)
        .collect()
}

/// Sample commits shown when GitHub cannot be reached
pub fn demo_commits(username: &str) -> Vec<Commit> {
    let profile = format!("https://github.com/{}", username);
    [
        ("abc1234", "Add cosmic theme to portfolio", "Jan 3, 10:30 AM", "PortFolio"),
        ("def5678", "Implement dark/light mode toggle", "Jan 3, 09:15 AM", "PortFolio"),
        ("ghi9012", "Add interactive particle background", "Jan 2, 04:45 PM", "PortFolio"),
        ("jkl3456", "Update LangChain agent logic", "Jan 1, 02:30 PM", "ConnectAI"),
        ("mno7890", "Fix API rate limiting issue", "Dec 31, 11:00 AM", "ConnectAI"),
    ]
    .into_iter()
    .map(|(sha, message, date, repo)| Commit {
        sha: sha.to_string(),
        message: message.to_string(),
        date: date.to_string(),
        repo: repo.to_string(),
        url: profile.clone(),
    })
    .collect()
}
