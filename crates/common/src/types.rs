//! Core value types shared by the channels and the publishing engine.

use std::{collections::BTreeMap, fmt, str::FromStr};

use {
    chrono::{DateTime, Utc},
    serde::{Deserialize, Serialize},
    uuid::Uuid,
};

use crate::{Error, Result};

/// Outcome of a single (event, channel) delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PublicationStatus {
    /// Built but not attempted yet. Never persisted.
    Waiting,
    Failed,
    Completed,
}

impl PublicationStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Waiting => "WAITING",
            Self::Failed => "FAILED",
            Self::Completed => "COMPLETED",
        }
    }
}

impl fmt::Display for PublicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for PublicationStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "WAITING" => Ok(Self::Waiting),
            "FAILED" => Ok(Self::Failed),
            "COMPLETED" => Ok(Self::Completed),
            _ => Err(Error::unknown_status(s)),
        }
    }
}

/// Aggregate status of an event, derived from its publications.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventPublicationStatus {
    #[default]
    Waiting,
    Failed,
    Partial,
    Completed,
}

impl EventPublicationStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Waiting => "WAITING",
            Self::Failed => "FAILED",
            Self::Partial => "PARTIAL",
            Self::Completed => "COMPLETED",
        }
    }
}

impl fmt::Display for EventPublicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for EventPublicationStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "WAITING" => Ok(Self::Waiting),
            "FAILED" => Ok(Self::Failed),
            "PARTIAL" => Ok(Self::Partial),
            "COMPLETED" => Ok(Self::Completed),
            _ => Err(Error::unknown_status(s)),
        }
    }
}

/// An event discovered on the source platform.
///
/// Immutable once built: status and publication times are replaced wholesale
/// via [`Event::with_publication_state`] when the publication set changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Event {
    id: Uuid,
    external_id: String,
    name: String,
    description: Option<String>,
    begin: DateTime<Utc>,
    end: DateTime<Utc>,
    location: Option<String>,
    thumbnail: Option<String>,
    link: Option<String>,
    last_update: Option<DateTime<Utc>>,
    publication_time: BTreeMap<String, DateTime<Utc>>,
    status: EventPublicationStatus,
}

impl Event {
    /// Build a new, never published event with a fresh internal id.
    pub fn new(
        external_id: impl Into<String>,
        name: impl Into<String>,
        begin: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Self> {
        Self::with_id(Uuid::new_v4(), external_id, name, begin, end)
    }

    /// Build an event with a known internal id (rehydration from storage).
    pub fn with_id(
        id: Uuid,
        external_id: impl Into<String>,
        name: impl Into<String>,
        begin: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Self> {
        let external_id = external_id.into();
        if begin >= end {
            return Err(Error::InvalidTimeRange {
                external_id,
                begin,
                end,
            });
        }
        Ok(Self {
            id,
            external_id,
            name: name.into(),
            description: None,
            begin,
            end,
            location: None,
            thumbnail: None,
            link: None,
            last_update: None,
            publication_time: BTreeMap::new(),
            status: EventPublicationStatus::Waiting,
        })
    }

    #[must_use]
    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    #[must_use]
    pub fn with_location(mut self, location: Option<String>) -> Self {
        self.location = location;
        self
    }

    #[must_use]
    pub fn with_thumbnail(mut self, thumbnail: Option<String>) -> Self {
        self.thumbnail = thumbnail;
        self
    }

    #[must_use]
    pub fn with_link(mut self, link: Option<String>) -> Self {
        self.link = link;
        self
    }

    #[must_use]
    pub fn with_last_update(mut self, last_update: Option<DateTime<Utc>>) -> Self {
        self.last_update = last_update;
        self
    }

    /// Replace the derived publication state.
    ///
    /// Publication times are dropped while the status is still waiting.
    #[must_use]
    pub fn with_publication_state(
        mut self,
        status: EventPublicationStatus,
        publication_time: BTreeMap<String, DateTime<Utc>>,
    ) -> Self {
        self.publication_time = if status == EventPublicationStatus::Waiting {
            BTreeMap::new()
        } else {
            publication_time
        };
        self.status = status;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn external_id(&self) -> &str {
        &self.external_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn begin(&self) -> DateTime<Utc> {
        self.begin
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn thumbnail(&self) -> Option<&str> {
        self.thumbnail.as_deref()
    }

    pub fn link(&self) -> Option<&str> {
        self.link.as_deref()
    }

    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.last_update
    }

    pub fn publication_time(&self) -> &BTreeMap<String, DateTime<Utc>> {
        &self.publication_time
    }

    pub fn status(&self) -> EventPublicationStatus {
        self.status
    }

    /// Latest instant any channel recorded an attempt for this event.
    pub fn last_publication_time(&self) -> Option<DateTime<Utc>> {
        self.publication_time.values().max().copied()
    }
}

/// One delivery attempt of one event to one channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Publication {
    pub id: Uuid,
    pub event_id: Uuid,
    pub channel: String,
    pub status: PublicationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Publication {
    /// A not yet attempted publication of `event_id` on `channel`.
    pub fn waiting(event_id: Uuid, channel: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_id,
            channel: channel.into(),
            status: PublicationStatus::Waiting,
            timestamp: None,
            reason: None,
        }
    }

    /// Record the outcome of an attempt.
    #[must_use]
    pub fn conclude(
        mut self,
        status: PublicationStatus,
        reason: Option<String>,
        at: DateTime<Utc>,
    ) -> Self {
        self.status = status;
        self.reason = reason;
        self.timestamp = Some(at);
        self
    }

    /// Reset a concluded publication so it can be attempted again under the
    /// same id.
    #[must_use]
    pub fn reopen(mut self) -> Self {
        self.status = PublicationStatus::Waiting;
        self.reason = None;
        self.timestamp = None;
        self
    }

    pub fn is_concluded(&self) -> bool {
        self.status != PublicationStatus::Waiting
    }
}
