//! SQLite-backed publication store using sqlx.

use std::{collections::HashMap, str::FromStr};

use {
    async_trait::async_trait,
    chrono::{DateTime, Utc},
    reshare_common::types::{Event, Publication, PublicationStatus},
    sqlx::{
        Row, SqlitePool,
        sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    },
    uuid::Uuid,
};

use crate::{
    Error, Result,
    report::EventReport,
    status::hydrate_event,
    store::{PublicationStore, concluded_publications},
};

const EVENT_COLUMNS: &str = "id, external_id, name, description, begin_at_ms, end_at_ms, \
                             location, thumbnail, link, last_update_ms";
const PUBLICATION_COLUMNS: &str = "id, event_id, channel, status, timestamp_ms, reason";

/// SQLite-backed persistence for events and publications.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `database_url` and run
    /// migrations.
    pub async fn new(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        crate::run_migrations(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a store using an existing pool (migrations must already be run).
    pub fn with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn publications_of(&self, event_id: Uuid) -> Result<Vec<Publication>> {
        let rows = sqlx::query(&format!(
            "SELECT {PUBLICATION_COLUMNS} FROM publications
             WHERE event_id = ?
             ORDER BY timestamp_ms, id"
        ))
        .bind(event_id.to_string())
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(publication_from_row).collect()
    }

    async fn hydrate_row(&self, row: &SqliteRow) -> Result<Event> {
        let event = event_from_row(row)?;
        let publications = self.publications_of(event.id()).await?;
        hydrate_event(event, &publications)
    }
}

#[async_trait]
impl PublicationStore for SqliteStore {
    async fn upsert_events(&self, events: Vec<Event>) -> Result<Vec<Event>> {
        let mut tx = self.pool.begin().await?;
        for event in &events {
            sqlx::query(
                "INSERT INTO events (id, external_id, name, description, begin_at_ms, end_at_ms,
                                     location, thumbnail, link, last_update_ms)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                 ON CONFLICT(external_id) DO UPDATE SET
                     name = excluded.name,
                     description = excluded.description,
                     begin_at_ms = excluded.begin_at_ms,
                     end_at_ms = excluded.end_at_ms,
                     location = excluded.location,
                     thumbnail = excluded.thumbnail,
                     link = excluded.link,
                     last_update_ms = excluded.last_update_ms",
            )
            .bind(event.id().to_string())
            .bind(event.external_id())
            .bind(event.name())
            .bind(event.description())
            .bind(event.begin().timestamp_millis())
            .bind(event.end().timestamp_millis())
            .bind(event.location())
            .bind(event.thumbnail())
            .bind(event.link())
            .bind(event.last_update().map(|t| t.timestamp_millis()))
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        let mut stored = Vec::with_capacity(events.len());
        for event in &events {
            let event = self
                .get_event_by_external_id(event.external_id())
                .await?
                .ok_or_else(|| Error::event_not_found(event.external_id()))?;
            stored.push(event);
        }
        Ok(stored)
    }

    async fn get_event(&self, id: Uuid) -> Result<Option<Event>> {
        let row = sqlx::query(&format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = ?"))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => Ok(Some(self.hydrate_row(&row).await?)),
            None => Ok(None),
        }
    }

    async fn get_event_by_external_id(&self, external_id: &str) -> Result<Option<Event>> {
        let row = sqlx::query(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE external_id = ?"
        ))
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await?;
        match row {
            Some(row) => Ok(Some(self.hydrate_row(&row).await?)),
            None => Ok(None),
        }
    }

    async fn list_events(&self) -> Result<Vec<Event>> {
        let rows = sqlx::query(&format!(
            "SELECT {EVENT_COLUMNS} FROM events ORDER BY begin_at_ms, external_id"
        ))
        .fetch_all(&self.pool)
        .await?;

        let publication_rows = sqlx::query(&format!(
            "SELECT {PUBLICATION_COLUMNS} FROM publications ORDER BY timestamp_ms, id"
        ))
        .fetch_all(&self.pool)
        .await?;
        let mut by_event: HashMap<Uuid, Vec<Publication>> = HashMap::new();
        for row in &publication_rows {
            let publication = publication_from_row(row)?;
            by_event
                .entry(publication.event_id)
                .or_default()
                .push(publication);
        }

        rows.iter()
            .map(|row| {
                let event = event_from_row(row)?;
                let publications = by_event.remove(&event.id()).unwrap_or_default();
                hydrate_event(event, &publications)
            })
            .collect()
    }

    async fn get_publication(&self, id: Uuid) -> Result<Option<Publication>> {
        let row = sqlx::query(&format!(
            "SELECT {PUBLICATION_COLUMNS} FROM publications WHERE id = ?"
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(publication_from_row).transpose()
    }

    async fn list_publications(&self, event_id: Uuid) -> Result<Vec<Publication>> {
        self.publications_of(event_id).await
    }

    async fn save_report(&self, report: &EventReport) -> Result<()> {
        let publications = concluded_publications(report)?;

        let mut tx = self.pool.begin().await?;
        for publication in publications {
            let timestamp = publication
                .timestamp
                .map(|t| t.timestamp_millis())
                .ok_or_else(|| Error::invariant("concluded publication without timestamp"))?;
            sqlx::query(
                "INSERT INTO publications (id, event_id, channel, status, timestamp_ms, reason)
                 VALUES (?, ?, ?, ?, ?, ?)
                 ON CONFLICT(id) DO UPDATE SET
                     status = excluded.status,
                     timestamp_ms = excluded.timestamp_ms,
                     reason = excluded.reason",
            )
            .bind(publication.id.to_string())
            .bind(publication.event_id.to_string())
            .bind(&publication.channel)
            .bind(publication.status.as_str())
            .bind(timestamp)
            .bind(&publication.reason)
            .execute(&mut *tx)
            .await?;
        }
        // Dropping `tx` on an early return rolls everything back.
        tx.commit().await?;
        Ok(())
    }
}

fn parse_uuid(value: &str) -> Result<Uuid> {
    Uuid::parse_str(value).map_err(|e| Error::storage(format!("invalid id {value:?}"), e))
}

fn from_millis(ms: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| Error::invariant(format!("timestamp {ms} is out of range")))
}

fn event_from_row(row: &SqliteRow) -> Result<Event> {
    let id: String = row.try_get("id")?;
    let last_update = row
        .try_get::<Option<i64>, _>("last_update_ms")?
        .map(from_millis)
        .transpose()?;

    Ok(Event::with_id(
        parse_uuid(&id)?,
        row.try_get::<String, _>("external_id")?,
        row.try_get::<String, _>("name")?,
        from_millis(row.try_get("begin_at_ms")?)?,
        from_millis(row.try_get("end_at_ms")?)?,
    )?
    .with_description(row.try_get("description")?)
    .with_location(row.try_get("location")?)
    .with_thumbnail(row.try_get("thumbnail")?)
    .with_link(row.try_get("link")?)
    .with_last_update(last_update))
}

fn publication_from_row(row: &SqliteRow) -> Result<Publication> {
    let id: String = row.try_get("id")?;
    let event_id: String = row.try_get("event_id")?;
    let status: String = row.try_get("status")?;
    Ok(Publication {
        id: parse_uuid(&id)?,
        event_id: parse_uuid(&event_id)?,
        channel: row.try_get("channel")?,
        status: status.parse::<PublicationStatus>()?,
        timestamp: Some(from_millis(row.try_get("timestamp_ms")?)?),
        reason: row.try_get("reason")?,
    })
}
