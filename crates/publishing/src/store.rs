//! Persistence trait for events and publications.

use {
    async_trait::async_trait,
    reshare_common::types::{Event, Publication},
    uuid::Uuid,
};

use crate::{Error, Result, report::EventReport};

/// Persistence backend for events and their publications.
///
/// Events are returned hydrated: their status and publication times are
/// recomputed from the stored publications on every read.
#[async_trait]
pub trait PublicationStore: Send + Sync {
    /// Insert or update events by external id. An existing event keeps its
    /// internal id. Returns the stored events in input order.
    async fn upsert_events(&self, events: Vec<Event>) -> Result<Vec<Event>>;
    async fn get_event(&self, id: Uuid) -> Result<Option<Event>>;
    async fn get_event_by_external_id(&self, external_id: &str) -> Result<Option<Event>>;
    /// Every event, sorted ascending by `begin`.
    async fn list_events(&self) -> Result<Vec<Event>>;
    async fn get_publication(&self, id: Uuid) -> Result<Option<Publication>>;
    /// Publications of one event, oldest first.
    async fn list_publications(&self, event_id: Uuid) -> Result<Vec<Publication>>;
    /// Upsert every publication of `report` atomically.
    async fn save_report(&self, report: &EventReport) -> Result<()>;
}

/// Copy of `event` carrying the internal id `id`.
pub(crate) fn with_internal_id(event: &Event, id: Uuid) -> Result<Event> {
    Ok(
        Event::with_id(id, event.external_id(), event.name(), event.begin(), event.end())?
            .with_description(event.description().map(String::from))
            .with_location(event.location().map(String::from))
            .with_thumbnail(event.thumbnail().map(String::from))
            .with_link(event.link().map(String::from))
            .with_last_update(event.last_update()),
    )
}

/// Concluded publications of a report, rejecting placeholders.
pub(crate) fn concluded_publications(report: &EventReport) -> Result<Vec<&Publication>> {
    report
        .reports()
        .iter()
        .map(|r| &r.publication.publication)
        .map(|p| {
            if p.is_concluded() && p.timestamp.is_some() {
                Ok(p)
            } else {
                Err(Error::invariant(format!(
                    "publication {} has not concluded and cannot be stored",
                    p.id
                )))
            }
        })
        .collect()
}
