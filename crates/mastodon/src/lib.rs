//! Mastodon channel: posts statuses from an application account.

pub mod config;
pub mod formatter;
pub mod publisher;

use std::sync::Arc;

use reshare_channels::{Channel, Result};

pub use {config::MastodonConfig, formatter::MastodonFormatter, publisher::MastodonPublisher};

/// Channel name used in configuration and reports.
pub const CHANNEL_NAME: &str = "mastodon";

/// Build the publisher/formatter pair from a raw config entry.
pub fn channel(settings: &serde_json::Value) -> Result<Channel> {
    let config = MastodonConfig::from_value(settings)?;
    let formatter = Arc::new(MastodonFormatter::new(config.max_length));
    Ok(Channel::new(Arc::new(MastodonPublisher::new(config)), formatter))
}

/// Build only the publisher, e.g. for operator notifications.
pub fn publisher(settings: &serde_json::Value) -> Result<Arc<MastodonPublisher>> {
    let config = MastodonConfig::from_value(settings)?;
    Ok(Arc::new(MastodonPublisher::new(config)))
}
