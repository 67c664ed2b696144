use std::{error::Error as StdError, time::Duration};

/// Crate-wide result type for channel operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Typed channel errors.
///
/// The display form of the validation and send variants is the bare message,
/// so it can be shown verbatim as a publication failure reason.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The channel rejected or could not verify its credentials.
    #[error("{message}")]
    InvalidCredentials { message: String },

    /// The event lacks something this channel needs.
    #[error("{message}")]
    InvalidEvent { message: String },

    /// The rendered message is not acceptable for this channel.
    #[error("{message}")]
    InvalidMessage { message: String },

    /// The remote service refused or failed to deliver the message.
    #[error("{message}")]
    Send { message: String },

    /// The channel did not answer in time.
    #[error("timed out after {}s", .elapsed.as_secs())]
    Timeout { elapsed: Duration },

    /// Wrapped source error from an external dependency.
    #[error("{context}: {source}")]
    External {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    /// Channel settings could not be decoded.
    #[error("invalid channel settings: {0}")]
    Settings(#[from] serde_json::Error),
}

impl Error {
    #[must_use]
    pub fn invalid_credentials(message: impl std::fmt::Display) -> Self {
        Self::InvalidCredentials {
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn invalid_event(message: impl std::fmt::Display) -> Self {
        Self::InvalidEvent {
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn invalid_message(message: impl std::fmt::Display) -> Self {
        Self::InvalidMessage {
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn send(message: impl std::fmt::Display) -> Self {
        Self::Send {
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn timeout(elapsed: Duration) -> Self {
        Self::Timeout { elapsed }
    }

    #[must_use]
    pub fn external(
        context: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::External {
            context: context.into(),
            source: Box::new(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_display_bare_message() {
        assert_eq!(
            Error::invalid_credentials("Invalid credentials").to_string(),
            "Invalid credentials"
        );
        assert_eq!(
            Error::invalid_message("Message is too long").to_string(),
            "Message is too long"
        );
    }

    #[test]
    fn timeout_display_in_seconds() {
        assert_eq!(
            Error::timeout(Duration::from_secs(30)).to_string(),
            "timed out after 30s"
        );
    }
}
