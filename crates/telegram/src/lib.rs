//! Telegram channel: announces events in a chat, group or channel through a
//! bot account.

pub mod config;
pub mod formatter;
pub mod publisher;

use std::sync::Arc;

use reshare_channels::{Channel, Result};

pub use {config::TelegramConfig, formatter::TelegramFormatter, publisher::TelegramPublisher};

/// Channel name used in configuration and reports.
pub const CHANNEL_NAME: &str = "telegram";

/// Build the publisher/formatter pair from a raw config entry.
pub fn channel(settings: &serde_json::Value) -> Result<Channel> {
    let publisher = publisher(settings)?;
    Ok(Channel::new(publisher, Arc::new(TelegramFormatter)))
}

/// Build only the publisher, e.g. for operator notifications.
pub fn publisher(settings: &serde_json::Value) -> Result<Arc<TelegramPublisher>> {
    let config = TelegramConfig::from_value(settings)?;
    Ok(Arc::new(TelegramPublisher::new(config)?))
}
