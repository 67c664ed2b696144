//! Zulip channel: posts events to a stream topic through a bot account.

pub mod config;
pub mod formatter;
pub mod publisher;

use std::sync::Arc;

use reshare_channels::{Channel, Result};

pub use {config::ZulipConfig, formatter::ZulipFormatter, publisher::ZulipPublisher};

/// Channel name used in configuration and reports.
pub const CHANNEL_NAME: &str = "zulip";

/// Build the publisher/formatter pair from a raw config entry.
pub fn channel(settings: &serde_json::Value) -> Result<Channel> {
    let publisher = publisher(settings)?;
    Ok(Channel::new(publisher, Arc::new(ZulipFormatter)))
}

/// Build only the publisher, e.g. for operator notifications.
pub fn publisher(settings: &serde_json::Value) -> Result<Arc<ZulipPublisher>> {
    let config = ZulipConfig::from_value(settings)?;
    Ok(Arc::new(ZulipPublisher::new(config)))
}
