use std::{fmt, sync::Arc};

use {async_trait::async_trait, reshare_common::types::Event};

use crate::Result;

/// Sends messages to one outbound platform.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Channel identifier (e.g. "telegram", "zulip").
    fn name(&self) -> &str;

    /// Check that the configured credentials are accepted by the platform.
    async fn validate_credentials(&self) -> Result<()>;

    /// Deliver a rendered message. `event` is `None` for messages that are
    /// not about a single event (recaps, operator notifications).
    async fn send(&self, message: &str, event: Option<&Event>) -> Result<()>;
}

/// Renders events into platform-specific messages.
pub trait Formatter: Send + Sync {
    /// Reject events this channel cannot represent.
    fn validate_event(&self, event: &Event) -> Result<()>;

    /// Render the announcement for a single event.
    fn render(&self, event: &Event) -> String;

    /// Reject rendered messages the platform would refuse.
    fn validate_message(&self, message: &str) -> Result<()>;

    /// Opening fragment of a recap digest.
    fn recap_header(&self) -> String;

    /// One recap line for a single event.
    fn recap_fragment(&self, event: &Event) -> String;
}

/// A publisher and its formatter, selected together per platform.
#[derive(Clone)]
pub struct Channel {
    publisher: Arc<dyn Publisher>,
    formatter: Arc<dyn Formatter>,
}

impl Channel {
    pub fn new(publisher: Arc<dyn Publisher>, formatter: Arc<dyn Formatter>) -> Self {
        Self {
            publisher,
            formatter,
        }
    }

    pub fn name(&self) -> &str {
        self.publisher.name()
    }

    pub fn publisher(&self) -> &Arc<dyn Publisher> {
        &self.publisher
    }

    pub fn formatter(&self) -> &dyn Formatter {
        self.formatter.as_ref()
    }
}

impl fmt::Debug for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("name", &self.name())
            .finish_non_exhaustive()
    }
}
