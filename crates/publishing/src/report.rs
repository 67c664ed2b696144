//! Outcome of a coordinator run.

use {
    reshare_channels::Channel,
    reshare_common::types::{Event, Publication, PublicationStatus},
};

/// A publication bound to the event it announces and the channel it targets.
#[derive(Debug, Clone)]
pub struct EventPublication {
    pub publication: Publication,
    pub event: Event,
    pub channel: Channel,
}

impl EventPublication {
    pub fn channel_name(&self) -> &str {
        self.channel.name()
    }
}

/// A recap digest for one channel: every event it summarizes.
#[derive(Debug, Clone)]
pub struct RecapPublication {
    pub channel: Channel,
    pub events: Vec<Event>,
}

/// Outcome of one publication.
#[derive(Debug, Clone)]
pub struct PublicationReport<P> {
    pub status: PublicationStatus,
    pub reason: Option<String>,
    pub publication: P,
    /// Rendered message, kept for completed and previewed publications.
    pub published_content: Option<String>,
}

impl<P> PublicationReport<P> {
    pub fn completed(publication: P, content: String) -> Self {
        Self {
            status: PublicationStatus::Completed,
            reason: None,
            publication,
            published_content: Some(content),
        }
    }

    pub fn failed(publication: P, reason: impl Into<String>) -> Self {
        Self {
            status: PublicationStatus::Failed,
            reason: Some(reason.into()),
            publication,
            published_content: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == PublicationStatus::Completed
    }

    pub fn is_failed(&self) -> bool {
        self.status == PublicationStatus::Failed
    }
}

/// Ordered reports, one per input publication, in input order.
#[derive(Debug, Clone)]
pub struct CoordinatorReport<P> {
    reports: Vec<PublicationReport<P>>,
}

pub type EventReport = CoordinatorReport<EventPublication>;
pub type RecapReport = CoordinatorReport<RecapPublication>;

impl<P> CoordinatorReport<P> {
    pub fn new(reports: Vec<PublicationReport<P>>) -> Self {
        Self { reports }
    }

    /// True iff every report is COMPLETED.
    pub fn successful(&self) -> bool {
        self.reports.iter().all(PublicationReport::is_completed)
    }

    pub fn reports(&self) -> &[PublicationReport<P>] {
        &self.reports
    }

    pub fn into_reports(self) -> Vec<PublicationReport<P>> {
        self.reports
    }

    pub fn failed(&self) -> impl Iterator<Item = &PublicationReport<P>> {
        self.reports.iter().filter(|r| r.is_failed())
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }
}

impl<P> IntoIterator for CoordinatorReport<P> {
    type IntoIter = std::vec::IntoIter<PublicationReport<P>>;
    type Item = PublicationReport<P>;

    fn into_iter(self) -> Self::IntoIter {
        self.reports.into_iter()
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn successful_requires_every_entry_completed() {
        let ok = CoordinatorReport::new(vec![
            PublicationReport::completed("a", "msg".into()),
            PublicationReport::completed("b", "msg".into()),
        ]);
        assert!(ok.successful());
        assert_eq!(ok.failed().count(), 0);

        let mixed = CoordinatorReport::new(vec![
            PublicationReport::completed("a", "msg".into()),
            PublicationReport::failed("b", "Invalid credentials"),
        ]);
        assert!(!mixed.successful());
        let failed: Vec<_> = mixed.failed().map(|r| r.publication).collect();
        assert_eq!(failed, vec!["b"]);
    }

    #[test]
    fn failed_entries_carry_no_content() {
        let report = PublicationReport::failed(1, "boom");
        assert_eq!(report.reason.as_deref(), Some("boom"));
        assert!(report.published_content.is_none());
    }
}
