//! Turns a loaded configuration into a ready-to-run publishing service.

use std::{path::Path, sync::Arc, time::Duration};

use {
    anyhow::{Context, Result, bail},
    reshare_channels::{Channel, ChannelRegistry, Publisher},
    reshare_config::{ChannelsConfig, ReshareConfig, Severity, WindowConfig},
    reshare_publishing::{
        FailureNotifier, NextEventStrategy, PublishingService, PublishingWindow, SystemClock,
        WindowTimezone, store_sqlite::SqliteStore,
    },
    tokio_util::sync::CancellationToken,
    tracing::{debug, info, warn},
};

/// Load the configuration, refusing to run on a config with errors.
pub fn load_config(explicit: Option<&Path>) -> Result<ReshareConfig> {
    let (config, path) = reshare_config::load_or_discover(explicit)?;
    match &path {
        Some(path) => debug!(path = %path.display(), "configuration loaded"),
        None => warn!("no configuration file found, running with defaults"),
    }

    let result = reshare_config::validate::validate_config(&config);
    for d in &result.diagnostics {
        match d.severity {
            Severity::Error | Severity::Warning => warn!(path = %d.path, "{}", d.message),
            Severity::Info => debug!(path = %d.path, "{}", d.message),
        }
    }
    if result.has_errors() {
        bail!(
            "invalid configuration ({} error(s)), run `reshare config check` for details",
            result.count(Severity::Error)
        );
    }
    Ok(config)
}

/// Build the publishing channel called `name` from its raw settings.
pub fn build_channel(name: &str, settings: &serde_json::Value) -> Result<Channel> {
    let channel = match name {
        reshare_telegram::CHANNEL_NAME => reshare_telegram::channel(settings),
        reshare_zulip::CHANNEL_NAME => reshare_zulip::channel(settings),
        reshare_mastodon::CHANNEL_NAME => reshare_mastodon::channel(settings),
        other => bail!("unknown channel: {other}"),
    };
    channel.with_context(|| format!("invalid settings for publisher {name}"))
}

/// Build the notification publisher called `name` from its raw settings.
pub fn build_notifier(name: &str, settings: &serde_json::Value) -> Result<Arc<dyn Publisher>> {
    let publisher: Arc<dyn Publisher> = match name {
        reshare_telegram::CHANNEL_NAME => reshare_telegram::publisher(settings)
            .with_context(|| format!("invalid settings for notifier {name}"))?,
        reshare_zulip::CHANNEL_NAME => reshare_zulip::publisher(settings)
            .with_context(|| format!("invalid settings for notifier {name}"))?,
        reshare_mastodon::CHANNEL_NAME => reshare_mastodon::publisher(settings)
            .with_context(|| format!("invalid settings for notifier {name}"))?,
        other => bail!("unknown channel: {other}"),
    };
    Ok(publisher)
}

/// Registry holding every active publisher.
pub fn registry(publishers: &ChannelsConfig) -> Result<ChannelRegistry> {
    let mut registry = ChannelRegistry::new();
    for (name, settings) in publishers.active() {
        registry.register(build_channel(name, settings)?);
    }
    Ok(registry)
}

pub fn notifiers(notifiers: &ChannelsConfig) -> Result<Vec<Arc<dyn Publisher>>> {
    notifiers
        .active()
        .map(|(name, settings)| build_notifier(name, settings))
        .collect()
}

pub fn window(config: &WindowConfig) -> Result<PublishingWindow> {
    let timezone: WindowTimezone = config.timezone.parse()?;
    Ok(PublishingWindow::new(config.begin, config.end, timezone)?)
}

pub async fn open_store(config: &ReshareConfig) -> Result<SqliteStore> {
    let path = reshare_config::default_database_path(config);
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    debug!(path = %path.display(), "opening database");
    SqliteStore::new(&format!("sqlite://{}", path.display()))
        .await
        .with_context(|| format!("failed to open database {}", path.display()))
}

fn cooldown(minutes: u64) -> Result<chrono::Duration> {
    i64::try_from(minutes)
        .ok()
        .and_then(chrono::Duration::try_minutes)
        .with_context(|| format!("publishing.cooldown_minutes is too large: {minutes}"))
}

/// Wire store, channels, notifiers and selection policy together.
pub async fn service(config: &ReshareConfig, cancel: CancellationToken) -> Result<PublishingService> {
    let publishing = &config.publishing;
    let timeout = Duration::from_secs(publishing.channel_timeout_secs);
    let clock = Arc::new(SystemClock);

    let registry = registry(&config.publishers)?;
    let notifier = FailureNotifier::new(notifiers(&config.notifiers)?, timeout);
    if notifier.is_empty() {
        warn!("no active notifiers, failures will only be logged");
    }

    let strategy = NextEventStrategy::new(
        cooldown(publishing.cooldown_minutes)?,
        window(&publishing.window)?,
        clock.clone(),
    );
    let store = Arc::new(open_store(config).await?);

    info!(
        publishers = ?registry.list(),
        window = %window(&publishing.window)?,
        cooldown_minutes = publishing.cooldown_minutes,
        "publishing service ready"
    );

    Ok(PublishingService::new(
        store,
        registry,
        Box::new(strategy),
        notifier,
        clock,
        timeout,
    )
    .with_cancellation(cancel))
}
