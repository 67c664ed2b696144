//! The operations the CLI exposes, wired over a store and the coordinators.

use std::{collections::BTreeMap, sync::Arc, time::Duration};

use {
    reshare_channels::ChannelRegistry,
    reshare_common::types::{Event, EventPublicationStatus, Publication, PublicationStatus},
    tokio_util::sync::CancellationToken,
    tracing::{info, warn},
    uuid::Uuid,
};

use crate::{
    Error, Result,
    builder::PublicationBuilder,
    clock::Clock,
    coordinator::PublicationCoordinator,
    dry_run::DryRunCoordinator,
    notifier::FailureNotifier,
    recap::RecapCoordinator,
    report::{EventPublication, EventReport, RecapPublication, RecapReport},
    selection::SelectionStrategy,
    store::PublicationStore,
};

/// Publishing engine entry point.
pub struct PublishingService {
    store: Arc<dyn PublicationStore>,
    builder: PublicationBuilder,
    strategy: Box<dyn SelectionStrategy>,
    notifier: FailureNotifier,
    clock: Arc<dyn Clock>,
    coordinator: PublicationCoordinator,
    dry_run: DryRunCoordinator,
    recap: RecapCoordinator,
}

impl PublishingService {
    /// `registry` holds the active publishing channels. Every channel call is
    /// bounded by `channel_timeout`.
    pub fn new(
        store: Arc<dyn PublicationStore>,
        registry: ChannelRegistry,
        strategy: Box<dyn SelectionStrategy>,
        notifier: FailureNotifier,
        clock: Arc<dyn Clock>,
        channel_timeout: Duration,
    ) -> Self {
        Self {
            store,
            builder: PublicationBuilder::new(registry),
            strategy,
            notifier,
            coordinator: PublicationCoordinator::new(channel_timeout, clock.clone()),
            dry_run: DryRunCoordinator::new(channel_timeout, clock.clone()),
            recap: RecapCoordinator::new(channel_timeout),
            clock,
        }
    }

    /// Stop dispatching new channel calls once `cancel` fires.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.coordinator = self.coordinator.with_cancellation(cancel);
        self
    }

    pub fn store(&self) -> &Arc<dyn PublicationStore> {
        &self.store
    }

    fn active_channels(&self) -> Vec<String> {
        self.builder
            .registry()
            .list()
            .into_iter()
            .map(String::from)
            .collect()
    }

    fn channels_or_active(&self, channels: Option<&[String]>) -> Vec<String> {
        channels.map_or_else(|| self.active_channels(), <[String]>::to_vec)
    }

    async fn require_event(&self, event_id: Uuid) -> Result<Event> {
        self.store
            .get_event(event_id)
            .await?
            .ok_or_else(|| Error::event_not_found(event_id))
    }

    /// Publish the event the selection strategy picks, on every active
    /// channel. `None` when there is nothing to publish right now.
    pub async fn publish_next(&self) -> Result<Option<EventReport>> {
        let (waiting, published): (Vec<Event>, Vec<Event>) = self
            .store
            .list_events()
            .await?
            .into_iter()
            .partition(|e| e.status() == EventPublicationStatus::Waiting);

        // Events that already started are never announced.
        let now = self.clock.now();
        let unpublished: Vec<Event> = waiting.into_iter().filter(|e| e.begin() > now).collect();

        let Some(event) = self.strategy.select(&published, &unpublished)? else {
            info!(
                unpublished = unpublished.len(),
                "no event selected for publication"
            );
            return Ok(None);
        };

        let channels = self.active_channels();
        if channels.is_empty() {
            warn!(event_id = %event.id(), "no active publishers, nothing to do");
            return Ok(None);
        }

        let publications = self.builder.publications(&event, &channels)?;
        self.run(publications).await.map(Some)
    }

    /// Publish one event on `channels`, or on every active channel.
    pub async fn publish_specific(
        &self,
        event_id: Uuid,
        channels: Option<&[String]>,
    ) -> Result<EventReport> {
        let event = self.require_event(event_id).await?;
        let publications = self
            .builder
            .publications(&event, &self.channels_or_active(channels))?;
        self.run(publications).await
    }

    /// Validate and render without sending or persisting anything.
    pub async fn dry_run(
        &self,
        event_id: Uuid,
        channels: Option<&[String]>,
    ) -> Result<EventReport> {
        let event = self.require_event(event_id).await?;
        let publications = self
            .builder
            .publications(&event, &self.channels_or_active(channels))?;
        Ok(self.dry_run.run(publications).await)
    }

    /// Send a digest of the announced events that have not started yet.
    /// `None` when there is no such event.
    pub async fn recap(&self, channels: Option<&[String]>) -> Result<Option<RecapReport>> {
        let now = self.clock.now();
        let events: Vec<Event> = self
            .store
            .list_events()
            .await?
            .into_iter()
            .filter(|e| {
                matches!(
                    e.status(),
                    EventPublicationStatus::Completed | EventPublicationStatus::Partial
                ) && e.begin() > now
            })
            .collect();
        if events.is_empty() {
            info!("no upcoming published events, skipping recap");
            return Ok(None);
        }

        let recaps = self
            .channels_or_active(channels)
            .iter()
            .map(|name| {
                let channel = self
                    .builder
                    .registry()
                    .get(name)
                    .cloned()
                    .ok_or_else(|| Error::unknown_channel(name))?;
                Ok(RecapPublication {
                    channel,
                    events: events.clone(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let report = self.recap.run(recaps).await;
        info!(
            events = events.len(),
            channels = report.len(),
            successful = report.successful(),
            "recap finished"
        );
        Ok(Some(report))
    }

    /// Re-run one FAILED publication under its original id.
    pub async fn retry_publication(&self, publication_id: Uuid) -> Result<EventReport> {
        let publication = self
            .store
            .get_publication(publication_id)
            .await?
            .ok_or(Error::PublicationNotFound { publication_id })?;
        if publication.status != PublicationStatus::Failed {
            return Err(Error::NotRetryable {
                publication_id,
                status: publication.status,
            });
        }

        let event = self.require_event(publication.event_id).await?;
        let publications = self.builder.bind(&event, vec![publication.reopen()])?;
        self.run(publications).await
    }

    /// Re-run every channel whose latest publication of the event FAILED.
    /// `None` when no channel is in that state.
    pub async fn retry_event(&self, event_id: Uuid) -> Result<Option<EventReport>> {
        let event = self.require_event(event_id).await?;
        let failed = latest_failed(self.store.list_publications(event_id).await?);
        if failed.is_empty() {
            info!(event_id = %event_id, "no failed publications to retry");
            return Ok(None);
        }

        let publications = self
            .builder
            .bind(&event, failed.into_iter().map(Publication::reopen).collect())?;
        self.run(publications).await.map(Some)
    }

    /// Dispatch, persist, then alert operators about each failure.
    async fn run(&self, publications: Vec<EventPublication>) -> Result<EventReport> {
        let report = self.coordinator.run(publications).await;
        self.store.save_report(&report).await?;

        for failed in report.failed() {
            self.notifier.notify(failed).await;
        }

        if let Some(first) = report.reports().first() {
            let event = &first.publication.event;
            if report.successful() {
                info!(
                    event_id = %event.id(),
                    channels = report.len(),
                    "event published"
                );
            } else {
                warn!(
                    event_id = %event.id(),
                    failed = report.failed().count(),
                    channels = report.len(),
                    "event publication had failures"
                );
            }
        }
        Ok(report)
    }
}

/// The latest publication per channel, kept only when it FAILED.
fn latest_failed(publications: Vec<Publication>) -> Vec<Publication> {
    let mut latest: BTreeMap<String, Publication> = BTreeMap::new();
    for publication in publications {
        match latest.get(&publication.channel) {
            Some(current) if current.timestamp >= publication.timestamp => {},
            _ => {
                latest.insert(publication.channel.clone(), publication);
            },
        }
    }
    latest
        .into_values()
        .filter(|p| p.status == PublicationStatus::Failed)
        .collect()
}
