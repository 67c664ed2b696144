//! Channel capability contracts.
//!
//! Each outbound platform (Telegram, Zulip, Mastodon, ...) provides a
//! [`Publisher`] that talks to the remote service and a [`Formatter`] that
//! turns events into messages. The publishing engine only ever sees the pair,
//! bundled as a [`Channel`].

pub mod error;
pub mod plugin;
pub mod registry;
pub mod text;

pub use {
    error::{Error, Result},
    plugin::{Channel, Formatter, Publisher},
    registry::ChannelRegistry,
};
