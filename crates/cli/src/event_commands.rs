use std::path::PathBuf;

use {
    anyhow::{Context, Result},
    clap::Subcommand,
    reshare_common::types::EventPublicationStatus,
    reshare_publishing::{PublicationStore, feed},
    tracing::info,
    uuid::Uuid,
};

#[derive(Subcommand)]
pub enum EventAction {
    /// Import (insert or update) events from a JSON feed file.
    Import {
        /// Path to the feed file.
        file: PathBuf,
    },
    /// List stored events, soonest first.
    List {
        /// Only show events with this status (WAITING, PARTIAL, FAILED, COMPLETED).
        #[arg(long)]
        status: Option<EventPublicationStatus>,
    },
}

#[derive(Subcommand)]
pub enum PublicationAction {
    /// List every recorded publication of an event.
    List {
        /// Internal event id.
        event_id: Uuid,
    },
}

pub async fn handle_events(store: &dyn PublicationStore, action: EventAction) -> Result<()> {
    match action {
        EventAction::Import { file } => {
            let events = feed::load_feed(&file)
                .await
                .with_context(|| format!("failed to import {}", file.display()))?;
            let stored = store.upsert_events(events).await?;
            info!(count = stored.len(), file = %file.display(), "events imported");
            println!("Imported {} event(s).", stored.len());
        },
        EventAction::List { status } => {
            let events: Vec<_> = store
                .list_events()
                .await?
                .into_iter()
                .filter(|e| status.is_none_or(|s| e.status() == s))
                .collect();
            if events.is_empty() {
                println!("No events found.");
            }
            for event in &events {
                println!(
                    "{}  {:<9}  {}  {}",
                    event.id(),
                    event.status(),
                    event.begin().format("%Y-%m-%d %H:%M UTC"),
                    event.name()
                );
            }
        },
    }
    Ok(())
}

pub async fn handle_publications(
    store: &dyn PublicationStore,
    action: PublicationAction,
) -> Result<()> {
    match action {
        PublicationAction::List { event_id } => {
            let event = store
                .get_event(event_id)
                .await?
                .with_context(|| format!("event not found: {event_id}"))?;
            println!("{} ({})", event.name(), event.status());

            let publications = store.list_publications(event_id).await?;
            if publications.is_empty() {
                println!("  never published");
            }
            for p in &publications {
                println!(
                    "  {}  {:<10} {:<9} {}  {}",
                    p.id,
                    p.channel,
                    p.status,
                    p.timestamp
                        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
                        .unwrap_or_default(),
                    p.reason.as_deref().unwrap_or("")
                );
            }
        },
    }
    Ok(())
}
