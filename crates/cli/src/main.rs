mod app;
mod config_commands;
mod event_commands;
mod publish_commands;

use std::{
    path::{Path, PathBuf},
    process::ExitCode,
};

use {
    clap::{Parser, Subcommand},
    reshare_publishing::{PublishingService, store_sqlite::SqliteStore},
    tokio_util::sync::CancellationToken,
    tracing::{error, info, warn},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
    uuid::Uuid,
};

#[derive(Parser)]
#[command(name = "reshare", version, about = "Reshare: relay events to chat and social channels")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (overrides discovery in ./ and ~/.config/reshare/).
    #[arg(long, global = true, env = "RESHARE_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Publish the next scheduled event, if the policy allows one now.
    Start,
    /// Publish one event right away.
    Publish {
        /// Internal event id.
        event_id: Uuid,
        /// Restrict to these channels (repeatable). Defaults to every active one.
        #[arg(long = "channel")]
        channels: Vec<String>,
    },
    /// Preview the message each channel would receive, without sending it.
    Format {
        /// Internal event id.
        event_id: Uuid,
        #[arg(long = "channel")]
        channels: Vec<String>,
    },
    /// Send a digest of upcoming announced events.
    Recap {
        #[arg(long = "channel")]
        channels: Vec<String>,
    },
    /// Retry failed publications.
    Retry {
        #[command(subcommand)]
        action: publish_commands::RetryAction,
    },
    /// Stored events.
    Events {
        #[command(subcommand)]
        action: event_commands::EventAction,
    },
    /// Recorded publications.
    Publications {
        #[command(subcommand)]
        action: event_commands::PublicationAction,
    },
    /// Configuration management.
    Config {
        #[command(subcommand)]
        action: config_commands::ConfigAction,
    },
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr)
                    .with_ansi(true),
            )
            .init();
    }
}

/// Stop dispatching new channel calls on Ctrl-C. Calls already in flight
/// finish (or time out) and are recorded.
fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let child = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, finishing in-flight publications");
            child.cancel();
        }
    });
    token
}

async fn open_store(explicit: Option<&Path>) -> anyhow::Result<SqliteStore> {
    app::open_store(&app::load_config(explicit)?).await
}

async fn service(explicit: Option<&Path>) -> anyhow::Result<PublishingService> {
    app::service(&app::load_config(explicit)?, cancel_on_ctrl_c()).await
}

/// `Ok(true)` when the command succeeded or had nothing to do, `Ok(false)`
/// when a report contains failures.
async fn run(cli: Cli) -> anyhow::Result<bool> {
    let explicit = cli.config.as_deref();

    match cli.command {
        Commands::Start => publish_commands::start(&service(explicit).await?).await,
        Commands::Publish { event_id, channels } => {
            publish_commands::publish(&service(explicit).await?, event_id, &channels).await
        },
        Commands::Format { event_id, channels } => {
            publish_commands::format(&service(explicit).await?, event_id, &channels).await
        },
        Commands::Recap { channels } => {
            publish_commands::recap(&service(explicit).await?, &channels).await
        },
        Commands::Retry { action } => {
            publish_commands::retry(&service(explicit).await?, action).await
        },
        Commands::Events { action } => {
            event_commands::handle_events(&open_store(explicit).await?, action).await?;
            Ok(true)
        },
        Commands::Publications { action } => {
            event_commands::handle_publications(&open_store(explicit).await?, action).await?;
            Ok(true)
        },
        Commands::Config { action } => config_commands::handle_config(action, explicit),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "reshare starting");

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            error!(error = %e, "fatal error");
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        },
    }
}
