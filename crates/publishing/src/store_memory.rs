//! In-memory store for testing.

use std::{collections::HashMap, sync::Mutex};

use {
    async_trait::async_trait,
    reshare_common::types::{Event, Publication},
    uuid::Uuid,
};

use crate::{
    Error, Result,
    report::EventReport,
    status::hydrate_event,
    store::{PublicationStore, concluded_publications, with_internal_id},
};

#[derive(Default)]
struct State {
    events: HashMap<Uuid, Event>,
    publications: Vec<Publication>,
}

impl State {
    fn hydrate(&self, event: &Event) -> Result<Event> {
        let publications: Vec<Publication> = self
            .publications
            .iter()
            .filter(|p| p.event_id == event.id())
            .cloned()
            .collect();
        hydrate_event(event.clone(), &publications)
    }
}

/// In-memory store. No persistence, for tests only.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PublicationStore for InMemoryStore {
    async fn upsert_events(&self, events: Vec<Event>) -> Result<Vec<Event>> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let mut stored = Vec::with_capacity(events.len());
        for event in events {
            let existing = state
                .events
                .values()
                .find(|e| e.external_id() == event.external_id())
                .map(Event::id);
            let event = match existing {
                Some(id) => with_internal_id(&event, id)?,
                None => event,
            };
            state.events.insert(event.id(), event.clone());
            stored.push(state.hydrate(&event)?);
        }
        Ok(stored)
    }

    async fn get_event(&self, id: Uuid) -> Result<Option<Event>> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.events.get(&id).map(|e| state.hydrate(e)).transpose()
    }

    async fn get_event_by_external_id(&self, external_id: &str) -> Result<Option<Event>> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state
            .events
            .values()
            .find(|e| e.external_id() == external_id)
            .map(|e| state.hydrate(e))
            .transpose()
    }

    async fn list_events(&self) -> Result<Vec<Event>> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let mut events = state
            .events
            .values()
            .map(|e| state.hydrate(e))
            .collect::<Result<Vec<_>>>()?;
        events.sort_by(|a, b| {
            a.begin()
                .cmp(&b.begin())
                .then_with(|| a.external_id().cmp(b.external_id()))
        });
        Ok(events)
    }

    async fn get_publication(&self, id: Uuid) -> Result<Option<Publication>> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        Ok(state.publications.iter().find(|p| p.id == id).cloned())
    }

    async fn list_publications(&self, event_id: Uuid) -> Result<Vec<Publication>> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        Ok(state
            .publications
            .iter()
            .filter(|p| p.event_id == event_id)
            .cloned()
            .collect())
    }

    async fn save_report(&self, report: &EventReport) -> Result<()> {
        let publications = concluded_publications(report)?;
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        // Check everything before writing anything.
        if let Some(orphan) = publications
            .iter()
            .find(|p| !state.events.contains_key(&p.event_id))
        {
            return Err(Error::event_not_found(orphan.event_id));
        }
        for publication in publications {
            match state.publications.iter_mut().find(|p| p.id == publication.id) {
                Some(existing) => *existing = publication.clone(),
                None => state.publications.push(publication.clone()),
            }
        }
        Ok(())
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            report::CoordinatorReport,
            testing::{at, event, report},
        },
        reshare_common::types::{EventPublicationStatus, PublicationStatus},
    };

    #[tokio::test]
    async fn upsert_keeps_internal_id() {
        let store = InMemoryStore::new();
        let first = store.upsert_events(vec![event("A")]).await.unwrap().remove(0);

        let renamed = Event::new("ext-A", "A (moved)", at(21, 18), at(21, 20)).unwrap();
        let second = store.upsert_events(vec![renamed]).await.unwrap().remove(0);

        assert_eq!(first.id(), second.id());
        assert_eq!(second.name(), "A (moved)");
        assert_eq!(store.list_events().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn list_is_sorted_by_begin() {
        let store = InMemoryStore::new();
        let late = Event::new("ext-late", "late", at(25, 10), at(25, 12)).unwrap();
        let early = Event::new("ext-early", "early", at(22, 10), at(22, 12)).unwrap();
        store.upsert_events(vec![late, early]).await.unwrap();

        let names: Vec<_> = store
            .list_events()
            .await
            .unwrap()
            .iter()
            .map(|e| e.name().to_string())
            .collect();
        assert_eq!(names, vec!["early", "late"]);
    }

    #[tokio::test]
    async fn saved_report_drives_event_status() {
        let store = InMemoryStore::new();
        let e = store.upsert_events(vec![event("A")]).await.unwrap().remove(0);

        let r = report(
            &e,
            &[
                ("telegram", PublicationStatus::Completed),
                ("zulip", PublicationStatus::Failed),
            ],
            at(1, 9),
        );
        store.save_report(&r).await.unwrap();

        let hydrated = store.get_event(e.id()).await.unwrap().unwrap();
        assert_eq!(hydrated.status(), EventPublicationStatus::Partial);
        assert_eq!(hydrated.publication_time().len(), 2);

        let by_ext = store.get_event_by_external_id("ext-A").await.unwrap().unwrap();
        assert_eq!(by_ext, hydrated);

        let failed_id = r.reports()[1].publication.publication.id;
        let failed = store.get_publication(failed_id).await.unwrap().unwrap();
        assert_eq!(failed.reason.as_deref(), Some("boom"));
        assert_eq!(store.list_publications(e.id()).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn saving_twice_overwrites_by_publication_id() {
        let store = InMemoryStore::new();
        let e = store.upsert_events(vec![event("A")]).await.unwrap().remove(0);
        let r = report(&e, &[("telegram", PublicationStatus::Failed)], at(1, 9));
        store.save_report(&r).await.unwrap();

        let mut retried = r.clone().into_reports();
        retried[0].publication.publication = retried[0]
            .publication
            .publication
            .clone()
            .reopen()
            .conclude(PublicationStatus::Completed, None, at(1, 10));
        store
            .save_report(&CoordinatorReport::new(retried))
            .await
            .unwrap();

        let publications = store.list_publications(e.id()).await.unwrap();
        assert_eq!(publications.len(), 1);
        assert_eq!(publications[0].status, PublicationStatus::Completed);
    }

    #[tokio::test]
    async fn report_for_unknown_event_writes_nothing() {
        let store = InMemoryStore::new();
        let known = store.upsert_events(vec![event("A")]).await.unwrap().remove(0);
        let unknown = event("B");

        let mut reports = report(&known, &[("telegram", PublicationStatus::Completed)], at(1, 9))
            .into_reports();
        reports.extend(report(&unknown, &[("telegram", PublicationStatus::Completed)], at(1, 9)));

        let err = store
            .save_report(&CoordinatorReport::new(reports))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::EventNotFound { .. }));
        assert!(store.list_publications(known.id()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn waiting_publications_are_never_stored() {
        let store = InMemoryStore::new();
        let e = store.upsert_events(vec![event("A")]).await.unwrap().remove(0);
        let mut reports = report(&e, &[("telegram", PublicationStatus::Completed)], at(1, 9))
            .into_reports();
        reports[0].publication.publication = reports[0].publication.publication.clone().reopen();

        let err = store
            .save_report(&CoordinatorReport::new(reports))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvariantViolation { .. }));
        assert!(store.list_publications(e.id()).await.unwrap().is_empty());
    }
}
