//! Digest of upcoming, already announced events, one message per channel.

use std::time::Duration;

use {
    futures::future::join_all,
    reshare_channels::Formatter,
    reshare_common::types::Event,
    tracing::{info, warn},
};

use crate::{
    coordinator::call_with_timeout,
    report::{CoordinatorReport, PublicationReport, RecapPublication},
};

/// Header and one fragment per event, separated by blank lines.
pub fn build_digest(formatter: &dyn Formatter, events: &[Event]) -> String {
    std::iter::once(formatter.recap_header())
        .chain(events.iter().map(|e| formatter.recap_fragment(e)))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Sends one digest per channel, concurrently.
#[derive(Debug, Clone)]
pub struct RecapCoordinator {
    timeout: Duration,
}

impl RecapCoordinator {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub async fn run(
        &self,
        recaps: Vec<RecapPublication>,
    ) -> CoordinatorReport<RecapPublication> {
        let reports = join_all(recaps.into_iter().map(|recap| self.send(recap))).await;
        CoordinatorReport::new(reports)
    }

    async fn send(&self, recap: RecapPublication) -> PublicationReport<RecapPublication> {
        let digest = build_digest(recap.channel.formatter(), &recap.events);
        let sent =
            call_with_timeout(self.timeout, recap.channel.publisher().send(&digest, None)).await;

        match sent {
            Ok(()) => {
                info!(
                    channel = recap.channel.name(),
                    events = recap.events.len(),
                    "recap sent"
                );
                PublicationReport::completed(recap, digest)
            },
            Err(e) => {
                warn!(channel = recap.channel.name(), error = %e, "recap failed");
                PublicationReport::failed(recap, e.to_string())
            },
        }
    }
}
