use std::error::Error as StdError;

use {reshare_common::types::PublicationStatus, thiserror::Error, uuid::Uuid};

/// Errors that escape the engine.
///
/// Per-channel problems never show up here: they are turned into FAILED
/// report entries at the channel boundary.
#[derive(Debug, Error)]
pub enum Error {
    /// Data that cannot exist if every invariant held (impossible status
    /// mix, publication recorded in the future, ...).
    #[error("invariant violation: {message}")]
    InvariantViolation { message: String },

    #[error("storage error: {context}: {source}")]
    Storage {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    #[error("event not found: {event}")]
    EventNotFound { event: String },

    #[error("publication not found: {publication_id}")]
    PublicationNotFound { publication_id: Uuid },

    #[error("unknown channel: {name}")]
    UnknownChannel { name: String },

    #[error("publication {publication_id} is {status}, only FAILED publications can be retried")]
    NotRetryable {
        publication_id: Uuid,
        status: PublicationStatus,
    },

    #[error(transparent)]
    Event(#[from] reshare_common::Error),

    #[error("{message}")]
    Message { message: String },
}

impl Error {
    #[must_use]
    pub fn invariant(message: impl Into<String>) -> Self {
        Self::InvariantViolation {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn storage(
        context: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::Storage {
            context: context.into(),
            source: Box::new(source),
        }
    }

    #[must_use]
    pub fn event_not_found(event: impl std::fmt::Display) -> Self {
        Self::EventNotFound {
            event: event.to_string(),
        }
    }

    #[must_use]
    pub fn unknown_channel(name: impl Into<String>) -> Self {
        Self::UnknownChannel { name: name.into() }
    }

    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }
}

impl From<sqlx::Error> for Error {
    fn from(source: sqlx::Error) -> Self {
        Self::storage("database", source)
    }
}

impl From<sqlx::migrate::MigrateError> for Error {
    fn from(source: sqlx::migrate::MigrateError) -> Self {
        Self::storage("migration", source)
    }
}

impl reshare_common::FromMessage for Error {
    fn from_message(message: String) -> Self {
        Self::Message { message }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

reshare_common::impl_context!();
