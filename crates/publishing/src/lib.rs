//! Event publication engine.
//!
//! Picks stored events, fans each one out to the configured channels, records
//! one publication per channel and alerts operators about failures.
//! Persistent storage in SQLite (see [`store_sqlite::SqliteStore`]).

pub mod builder;
pub mod clock;
pub mod coordinator;
pub mod dry_run;
pub mod error;
pub mod feed;
pub mod notifier;
pub mod recap;
pub mod report;
pub mod selection;
pub mod service;
pub mod status;
pub mod store;
pub mod store_memory;
pub mod store_sqlite;

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod testing;

pub use {
    builder::PublicationBuilder,
    clock::{Clock, FixedClock, SystemClock},
    coordinator::PublicationCoordinator,
    dry_run::DryRunCoordinator,
    error::{Context, Error, Result},
    notifier::FailureNotifier,
    recap::RecapCoordinator,
    report::{
        CoordinatorReport, EventPublication, EventReport, PublicationReport, RecapPublication,
        RecapReport,
    },
    selection::{NextEventStrategy, PublishingWindow, SelectionStrategy, WindowTimezone},
    service::PublishingService,
    store::PublicationStore,
};

/// Run database migrations for the publishing crate.
///
/// Creates the `events` and `publications` tables. Called by
/// [`store_sqlite::SqliteStore::new`]; call it yourself when handing a pool
/// to [`store_sqlite::SqliteStore::with_pool`].
pub async fn run_migrations(pool: &sqlx::SqlitePool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .set_ignore_missing(true)
        .run(pool)
        .await?;
    Ok(())
}
