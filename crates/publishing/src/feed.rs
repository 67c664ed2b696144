//! JSON event feed, as produced by the source platform exporter.
//!
//! The feed is an array of objects:
//!
//! ```json
//! [{
//!   "external_id": "42",
//!   "name": "Assemblea",
//!   "description": "Ordine del giorno...",
//!   "begin": "2025-09-10T19:30:00+02:00",
//!   "end": "2025-09-10T21:00:00+02:00",
//!   "location": "Sala Rossa",
//!   "link": "https://events.example.org/e/42"
//! }]
//! ```

use std::path::Path;

use {
    chrono::{DateTime, Utc},
    reshare_common::types::Event,
    serde::Deserialize,
};

use crate::{Context, Result};

/// One entry of the event feed.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedEvent {
    pub external_id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub begin: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub last_update: Option<DateTime<Utc>>,
}

impl TryFrom<FeedEvent> for Event {
    type Error = reshare_common::Error;

    fn try_from(feed: FeedEvent) -> reshare_common::Result<Self> {
        Ok(Event::new(feed.external_id, feed.name, feed.begin, feed.end)?
            .with_description(feed.description.filter(|d| !d.trim().is_empty()))
            .with_location(feed.location)
            .with_thumbnail(feed.thumbnail)
            .with_link(feed.link)
            .with_last_update(feed.last_update))
    }
}

/// Parse a JSON feed into events.
pub fn parse_feed(json: &str) -> Result<Vec<Event>> {
    let entries: Vec<FeedEvent> = serde_json::from_str(json).context("invalid event feed")?;
    entries
        .into_iter()
        .map(|entry| Ok(Event::try_from(entry)?))
        .collect()
}

/// Read and parse a feed file.
pub async fn load_feed(path: &Path) -> Result<Vec<Event>> {
    let json = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_feed(&json)
}
