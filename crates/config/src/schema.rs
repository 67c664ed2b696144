/// Config schema types (publishing policy, storage, publisher and notifier
/// channels).
use std::{collections::BTreeMap, path::PathBuf};

use serde::{Deserialize, Serialize};

/// Channel names the binary knows how to build.
pub const KNOWN_CHANNELS: &[&str] = &["mastodon", "telegram", "zulip"];

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReshareConfig {
    pub publishing: PublishingConfig,
    pub database: DatabaseConfig,
    /// Channels events are published to.
    pub publishers: ChannelsConfig,
    /// Channels that receive operator failure notifications.
    pub notifiers: ChannelsConfig,
}

/// Selection and dispatch policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishingConfig {
    /// Minimum minutes between two published events. Defaults to 60.
    pub cooldown_minutes: u64,
    /// Upper bound on each channel call, in seconds. Defaults to 30.
    pub channel_timeout_secs: u64,
    /// Hours of the day during which `start` may publish.
    pub window: WindowConfig,
}

impl Default for PublishingConfig {
    fn default() -> Self {
        Self {
            cooldown_minutes: 60,
            channel_timeout_secs: 30,
            window: WindowConfig::default(),
        }
    }
}

/// Publishing window, a half-open `[begin, end)` hour range.
///
/// `begin > end` wraps around midnight (e.g. 22 to 6).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// First hour (0-23) inside the window. Defaults to 8.
    pub begin: u32,
    /// First hour (0-23) after the window. Defaults to 22.
    pub end: u32,
    /// IANA timezone (e.g. "Europe/Rome"), "UTC" or "local". Defaults to "local".
    pub timezone: String,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            begin: 8,
            end: 22,
            timezone: "local".into(),
        }
    }
}

/// SQLite storage settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database file. Defaults to `<data dir>/reshare.db`.
    pub path: Option<PathBuf>,
}

/// Channel entries keyed by channel name.
///
/// Each entry is kept as raw JSON: the `active` flag is read here, the rest is
/// decoded by the channel crate itself.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelsConfig {
    entries: BTreeMap<String, serde_json::Value>,
}

impl ChannelsConfig {
    /// Whether `name` is configured with `active = true`.
    pub fn is_active(&self, name: &str) -> bool {
        self.entries.get(name).is_some_and(entry_is_active)
    }

    /// Names of the active channels, in name order.
    pub fn active_names(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(_, v)| entry_is_active(v))
            .map(|(k, _)| k.as_str())
            .collect()
    }

    /// Active channel entries, in name order.
    pub fn active(&self) -> impl Iterator<Item = (&str, &serde_json::Value)> {
        self.entries
            .iter()
            .filter(|(_, v)| entry_is_active(v))
            .map(|(k, v)| (k.as_str(), v))
    }

    pub fn get(&self, name: &str) -> Option<&serde_json::Value> {
        self.entries.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn insert(&mut self, name: impl Into<String>, entry: serde_json::Value) {
        self.entries.insert(name.into(), entry);
    }
}

fn entry_is_active(entry: &serde_json::Value) -> bool {
    entry
        .get("active")
        .and_then(serde_json::Value::as_bool)
        .unwrap_or(false)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = ReshareConfig::default();
        assert_eq!(cfg.publishing.cooldown_minutes, 60);
        assert_eq!(cfg.publishing.channel_timeout_secs, 30);
        assert_eq!(cfg.publishing.window.begin, 8);
        assert_eq!(cfg.publishing.window.end, 22);
        assert!(cfg.publishers.active_names().is_empty());
    }

    #[test]
    fn active_flag_filters_channels() {
        let cfg: ReshareConfig = toml::from_str(
            r#"
            [publishers.zulip]
            active = true
            instance = "https://zulip.example.org"

            [publishers.telegram]
            active = false

            [publishers.mastodon]
            instance = "https://mastodon.example.org"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.publishers.active_names(), vec!["zulip"]);
        assert!(cfg.publishers.is_active("zulip"));
        assert!(!cfg.publishers.is_active("telegram"));
        assert!(!cfg.publishers.is_active("mastodon"));
        assert_eq!(
            cfg.publishers.get("zulip").unwrap()["instance"],
            "https://zulip.example.org"
        );
    }

    #[test]
    fn partial_window_keeps_defaults() {
        let cfg: ReshareConfig = toml::from_str(
            r#"
            [publishing.window]
            begin = 22
            end = 6
            "#,
        )
        .unwrap();
        assert_eq!(cfg.publishing.window.begin, 22);
        assert_eq!(cfg.publishing.window.end, 6);
        assert_eq!(cfg.publishing.window.timezone, "local");
        assert_eq!(cfg.publishing.cooldown_minutes, 60);
    }
}
