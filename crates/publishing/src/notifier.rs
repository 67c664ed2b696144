//! Best-effort operator alerts for failed publications.

use std::{sync::Arc, time::Duration};

use {
    futures::future::join_all,
    reshare_channels::Publisher,
    tracing::{debug, error},
};

use crate::{
    coordinator::call_with_timeout,
    report::{EventPublication, PublicationReport},
};

/// Pushes failure reports to the notification channels.
///
/// Never fails: delivery errors are logged as critical and dropped.
#[derive(Clone, Default)]
pub struct FailureNotifier {
    publishers: Vec<Arc<dyn Publisher>>,
    timeout: Duration,
}

impl FailureNotifier {
    pub fn new(publishers: Vec<Arc<dyn Publisher>>, timeout: Duration) -> Self {
        Self {
            publishers,
            timeout,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.publishers.is_empty()
    }

    pub fn message(report: &PublicationReport<EventPublication>) -> String {
        let publication = &report.publication;
        format!(
            "Publication {id} of \"{event}\" on {channel} ended as {status}.\nReason: {reason}",
            id = publication.publication.id,
            event = publication.event.name(),
            channel = publication.channel_name(),
            status = report.status,
            reason = report.reason.as_deref().unwrap_or("unknown"),
        )
    }

    pub async fn notify(&self, report: &PublicationReport<EventPublication>) {
        if self.publishers.is_empty() {
            debug!("no notifiers configured, skipping failure notification");
            return;
        }

        let message = Self::message(report);
        let results = join_all(
            self.publishers
                .iter()
                .map(|p| call_with_timeout(self.timeout, p.send(&message, None))),
        )
        .await;

        for (publisher, result) in self.publishers.iter().zip(results) {
            if let Err(e) = result {
                error!(
                    critical = true,
                    notifier = publisher.name(),
                    publication_id = %report.publication.publication.id,
                    error = %e,
                    "could not deliver failure notification"
                );
            }
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            builder::PublicationBuilder,
            testing::{MockChannel, event},
        },
        reshare_channels::ChannelRegistry,
    };

    fn failed_report() -> PublicationReport<EventPublication> {
        let mut registry = ChannelRegistry::default();
        registry.register(MockChannel::ok("zulip").channel());
        let e = event("Assemblea");
        let publication = PublicationBuilder::new(registry)
            .publications(&e, &["zulip"])
            .unwrap()
            .remove(0);
        PublicationReport::failed(publication, "Invalid credentials")
    }

    #[test]
    fn message_names_everything_an_operator_needs() {
        let report = failed_report();
        let message = FailureNotifier::message(&report);
        assert!(message.contains(&report.publication.publication.id.to_string()));
        assert!(message.contains("\"Assemblea\""));
        assert!(message.contains("on zulip"));
        assert!(message.contains("FAILED"));
        assert!(message.contains("Reason: Invalid credentials"));
    }

    #[tokio::test]
    async fn notifies_every_channel_and_swallows_errors() {
        let broken = Arc::new(MockChannel::ok("telegram").send_error("Forbidden"));
        let ok = Arc::new(MockChannel::ok("mastodon"));
        let publishers: Vec<Arc<dyn Publisher>> = vec![broken.clone(), ok.clone()];
        let notifier = FailureNotifier::new(publishers, Duration::from_secs(5));

        notifier.notify(&failed_report()).await;

        assert_eq!(broken.sent().len(), 1);
        assert_eq!(ok.sent().len(), 1);
        assert!(ok.sent()[0].contains("Invalid credentials"));
    }

    #[tokio::test]
    async fn without_notifiers_nothing_happens() {
        FailureNotifier::default().notify(&failed_report()).await;
    }
}
