//! Scriptable channel used by the unit tests.

use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use {
    async_trait::async_trait,
    chrono::{DateTime, TimeZone, Utc},
    reshare_channels::{Channel, Error, Formatter, Publisher, Result},
    reshare_common::types::{Event, Publication, PublicationStatus},
};

use crate::report::{CoordinatorReport, EventPublication, EventReport, PublicationReport};

pub(crate) fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, day, hour, 0, 0).unwrap()
}

/// An event on June 20th with a description.
pub(crate) fn event(name: &str) -> Event {
    Event::new(format!("ext-{name}"), name, at(20, 18), at(20, 20))
        .unwrap()
        .with_description(Some("d".into()))
}

/// A report concluding one publication of `event` per `(channel, status)`.
pub(crate) fn report(
    event: &Event,
    outcomes: &[(&str, PublicationStatus)],
    when: DateTime<Utc>,
) -> EventReport {
    let reports = outcomes
        .iter()
        .map(|(channel, status)| {
            let reason = (*status == PublicationStatus::Failed).then(|| "boom".to_string());
            let publication = EventPublication {
                publication: Publication::waiting(event.id(), *channel).conclude(
                    *status,
                    reason.clone(),
                    when,
                ),
                event: event.clone(),
                channel: MockChannel::ok(channel).channel(),
            };
            match reason {
                Some(reason) => PublicationReport::failed(publication, reason),
                None => PublicationReport::completed(publication, "content".into()),
            }
        })
        .collect();
    CoordinatorReport::new(reports)
}

#[derive(Default)]
pub(crate) struct MockChannel {
    name: String,
    credentials_error: Option<String>,
    event_error: Option<String>,
    message_error: Option<String>,
    send_error: Option<String>,
    credentials_delay: Option<Duration>,
    send_delay: Option<Duration>,
    credential_checks: AtomicUsize,
    sent: Mutex<Vec<String>>,
}

impl MockChannel {
    pub(crate) fn ok(name: &str) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub(crate) fn credentials_error(mut self, message: &str) -> Self {
        self.credentials_error = Some(message.into());
        self
    }

    pub(crate) fn event_error(mut self, message: &str) -> Self {
        self.event_error = Some(message.into());
        self
    }

    pub(crate) fn message_error(mut self, message: &str) -> Self {
        self.message_error = Some(message.into());
        self
    }

    pub(crate) fn send_error(mut self, message: &str) -> Self {
        self.send_error = Some(message.into());
        self
    }

    pub(crate) fn credentials_delay(mut self, delay: Duration) -> Self {
        self.credentials_delay = Some(delay);
        self
    }

    pub(crate) fn send_delay(mut self, delay: Duration) -> Self {
        self.send_delay = Some(delay);
        self
    }

    pub(crate) fn channel(self) -> Channel {
        Self::bind(&Arc::new(self))
    }

    pub(crate) fn bind(mock: &Arc<Self>) -> Channel {
        Channel::new(mock.clone(), mock.clone())
    }

    pub(crate) fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    pub(crate) fn credential_checks(&self) -> usize {
        self.credential_checks.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Publisher for MockChannel {
    fn name(&self) -> &str {
        &self.name
    }

    async fn validate_credentials(&self) -> Result<()> {
        self.credential_checks.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.credentials_delay {
            tokio::time::sleep(delay).await;
        }
        match &self.credentials_error {
            Some(message) => Err(Error::invalid_credentials(message)),
            None => Ok(()),
        }
    }

    async fn send(&self, message: &str, _event: Option<&Event>) -> Result<()> {
        if let Some(delay) = self.send_delay {
            tokio::time::sleep(delay).await;
        }
        self.sent.lock().unwrap().push(message.to_string());
        match &self.send_error {
            Some(message) => Err(Error::send(message)),
            None => Ok(()),
        }
    }
}

impl Formatter for MockChannel {
    fn validate_event(&self, _event: &Event) -> Result<()> {
        match &self.event_error {
            Some(message) => Err(Error::invalid_event(message)),
            None => Ok(()),
        }
    }

    fn render(&self, event: &Event) -> String {
        format!("[{}] {}", self.name, event.name())
    }

    fn validate_message(&self, _message: &str) -> Result<()> {
        match &self.message_error {
            Some(message) => Err(Error::invalid_message(message)),
            None => Ok(()),
        }
    }

    fn recap_header(&self) -> String {
        format!("[{}] upcoming", self.name)
    }

    fn recap_fragment(&self, event: &Event) -> String {
        format!("- {}", event.name())
    }
}
