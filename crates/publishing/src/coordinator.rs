//! Validate-then-publish dispatch of one event to its channels.
//!
//! Every publication is validated first. Only once every channel has been
//! checked are the valid ones sent, concurrently, each under its own timeout.
//! Channel errors never escape: they become FAILED report entries.

use std::{future::Future, sync::Arc, time::Duration};

use {
    futures::future::join_all,
    reshare_channels::Error as ChannelError,
    reshare_common::types::PublicationStatus,
    tokio_util::sync::CancellationToken,
    tracing::{info, warn},
};

use crate::{
    clock::Clock,
    report::{CoordinatorReport, EventPublication, PublicationReport},
};

pub(crate) const CANCELLED_REASON: &str = "cancelled before dispatch";

/// Run one channel call, turning an elapsed `limit` into a timeout error.
pub(crate) async fn call_with_timeout<T>(
    limit: Duration,
    call: impl Future<Output = reshare_channels::Result<T>>,
) -> reshare_channels::Result<T> {
    tokio::time::timeout(limit, call)
        .await
        .unwrap_or_else(|_| Err(ChannelError::timeout(limit)))
}

/// Result of the validate phase for one publication.
pub(crate) enum Validated {
    Ready {
        publication: EventPublication,
        message: String,
    },
    Rejected {
        publication: EventPublication,
        reason: String,
    },
}

/// Check credentials, the event and the rendered message, collecting every
/// problem instead of stopping at the first.
pub(crate) async fn validate(
    publication: EventPublication,
    limit: Duration,
    cancel: &CancellationToken,
) -> Validated {
    if cancel.is_cancelled() {
        return Validated::Rejected {
            publication,
            reason: CANCELLED_REASON.into(),
        };
    }

    let channel = &publication.channel;
    let formatter = channel.formatter();
    let mut reasons = Vec::new();

    if let Err(e) = call_with_timeout(limit, channel.publisher().validate_credentials()).await {
        reasons.push(e.to_string());
    }
    if let Err(e) = formatter.validate_event(&publication.event) {
        reasons.push(e.to_string());
    }
    let message = formatter.render(&publication.event);
    if let Err(e) = formatter.validate_message(&message) {
        reasons.push(e.to_string());
    }

    if reasons.is_empty() {
        Validated::Ready {
            publication,
            message,
        }
    } else {
        Validated::Rejected {
            publication,
            reason: reasons.join(", "),
        }
    }
}

/// Validate every publication concurrently, keeping input order.
pub(crate) async fn validate_all(
    publications: Vec<EventPublication>,
    limit: Duration,
    cancel: &CancellationToken,
) -> Vec<Validated> {
    join_all(
        publications
            .into_iter()
            .map(|publication| validate(publication, limit, cancel)),
    )
    .await
}

/// Stamps outcomes on publications and logs them.
#[derive(Clone)]
pub(crate) struct Finalizer {
    pub(crate) clock: Arc<dyn Clock>,
}

impl Finalizer {
    pub(crate) fn completed(
        &self,
        mut publication: EventPublication,
        content: String,
    ) -> PublicationReport<EventPublication> {
        publication.publication =
            publication
                .publication
                .conclude(PublicationStatus::Completed, None, self.clock.now());
        info!(
            channel = publication.channel_name(),
            event_id = %publication.event.id(),
            publication_id = %publication.publication.id,
            status = %PublicationStatus::Completed,
            "publication completed"
        );
        PublicationReport::completed(publication, content)
    }

    pub(crate) fn failed(
        &self,
        mut publication: EventPublication,
        reason: String,
    ) -> PublicationReport<EventPublication> {
        publication.publication = publication.publication.conclude(
            PublicationStatus::Failed,
            Some(reason.clone()),
            self.clock.now(),
        );
        warn!(
            channel = publication.channel_name(),
            event_id = %publication.event.id(),
            publication_id = %publication.publication.id,
            status = %PublicationStatus::Failed,
            error = %reason,
            "publication failed"
        );
        PublicationReport::failed(publication, reason)
    }
}

/// Publishes an event on every bound channel.
#[derive(Clone)]
pub struct PublicationCoordinator {
    timeout: Duration,
    cancel: CancellationToken,
    finalizer: Finalizer,
}

impl PublicationCoordinator {
    pub fn new(timeout: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            timeout,
            cancel: CancellationToken::new(),
            finalizer: Finalizer { clock },
        }
    }

    /// Stop dispatching once `cancel` fires. Sends already in flight still
    /// complete and are reported.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub async fn run(
        &self,
        publications: Vec<EventPublication>,
    ) -> CoordinatorReport<EventPublication> {
        let validated = validate_all(publications, self.timeout, &self.cancel).await;

        let reports = join_all(validated.into_iter().map(|v| self.dispatch(v))).await;
        CoordinatorReport::new(reports)
    }

    async fn dispatch(&self, validated: Validated) -> PublicationReport<EventPublication> {
        let (publication, message) = match validated {
            Validated::Rejected {
                publication,
                reason,
            } => return self.finalizer.failed(publication, reason),
            Validated::Ready {
                publication,
                message,
            } => (publication, message),
        };

        if self.cancel.is_cancelled() {
            return self
                .finalizer
                .failed(publication, CANCELLED_REASON.to_string());
        }

        let sent = call_with_timeout(
            self.timeout,
            publication
                .channel
                .publisher()
                .send(&message, Some(&publication.event)),
        )
        .await;

        match sent {
            Ok(()) => self.finalizer.completed(publication, message),
            Err(e) => self.finalizer.failed(publication, e.to_string()),
        }
    }
}
