use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{
    AggregateId, EventEnvelope, EventId, EventQuery, EventStoreError, Result, Version,
    store::{AppendOptions, EventStore, EventStream, validate_events_for_append},
};

const SELECT_EVENTS: &str = "SELECT position, id, event_type, aggregate_id, aggregate_type, version, timestamp, payload, metadata FROM events";

const SELECT_ALL_IN_ORDER: &str = "SELECT position, id, event_type, aggregate_id, aggregate_type, version, timestamp, payload, metadata FROM events ORDER BY position ASC";

const SELECT_AFTER_POSITION: &str = "SELECT position, id, event_type, aggregate_id, aggregate_type, version, timestamp, payload, metadata FROM events WHERE position > $1 ORDER BY position ASC";

/// Advisory lock key held by every append transaction.
///
/// `position` comes from a sequence, and sequence values are handed out
/// before commit. Serializing appends makes positions commit in order, so a
/// reader that has seen position `p` will never later find a smaller one.
pub const APPEND_LOCK_KEY: i64 = 0x6361_6d70_5f65_7673;

/// Name of the unique `(aggregate_id, version)` constraint in the migration.
const STREAM_VERSION_CONSTRAINT: &str = "unique_stream_version";

/// PostgreSQL-backed event store.
#[derive(Clone)]
pub struct PostgresEventStore {
    pool: PgPool,
}

impl PostgresEventStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects to `database_url` and applies pending migrations.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        let store = Self::new(pool);
        store.run_migrations().await?;
        Ok(store)
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_event(row: PgRow) -> Result<EventEnvelope> {
        let metadata_json: serde_json::Value = row.try_get("metadata")?;
        let metadata: HashMap<String, serde_json::Value> = serde_json::from_value(metadata_json)?;

        Ok(EventEnvelope {
            event_id: EventId::from_uuid(row.try_get::<Uuid, _>("id")?),
            event_type: row.try_get("event_type")?,
            aggregate_id: AggregateId::from_uuid(row.try_get::<Uuid, _>("aggregate_id")?),
            aggregate_type: row.try_get("aggregate_type")?,
            version: Version::new(row.try_get("version")?),
            timestamp: row.try_get("timestamp")?,
            payload: row.try_get("payload")?,
            metadata,
            position: row.try_get::<i64, _>("position")? as u64,
        })
    }
}

#[async_trait]
impl EventStore for PostgresEventStore {
    async fn append(&self, events: Vec<EventEnvelope>, options: AppendOptions) -> Result<Version> {
        validate_events_for_append(&events)?;

        let aggregate_id = events[0].aggregate_id;
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(APPEND_LOCK_KEY)
            .execute(&mut *tx)
            .await?;

        if let Some(expected) = options.expected_version {
            let current: Option<i64> =
                sqlx::query_scalar("SELECT MAX(version) FROM events WHERE aggregate_id = $1")
                    .bind(aggregate_id.as_uuid())
                    .fetch_one(&mut *tx)
                    .await?;

            let actual = Version::new(current.unwrap_or(0));
            if actual != expected {
                return Err(EventStoreError::ConcurrencyConflict {
                    aggregate_id,
                    expected,
                    actual,
                });
            }
        }

        let mut last_version = Version::initial();
        for event in &events {
            let metadata_json = serde_json::to_value(&event.metadata)?;

            sqlx::query(
                r#"
                INSERT INTO events (id, event_type, aggregate_id, aggregate_type, version, timestamp, payload, metadata)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(event.event_id.as_uuid())
            .bind(&event.event_type)
            .bind(event.aggregate_id.as_uuid())
            .bind(&event.aggregate_type)
            .bind(event.version.as_i64())
            .bind(event.timestamp)
            .bind(&event.payload)
            .bind(metadata_json)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                // Two writers raced past the version check.
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.constraint() == Some(STREAM_VERSION_CONSTRAINT)
                {
                    return EventStoreError::ConcurrencyConflict {
                        aggregate_id,
                        expected: options.expected_version.unwrap_or(Version::initial()),
                        actual: event.version,
                    };
                }
                EventStoreError::Database(e)
            })?;

            last_version = event.version;
        }

        tx.commit().await?;
        metrics::counter!("events_appended_total").increment(events.len() as u64);
        tracing::debug!(%aggregate_id, version = %last_version, count = events.len(), "Appended events");
        Ok(last_version)
    }

    async fn get_events_for_aggregate(
        &self,
        aggregate_id: AggregateId,
    ) -> Result<Vec<EventEnvelope>> {
        let rows = sqlx::query(&format!(
            "{SELECT_EVENTS} WHERE aggregate_id = $1 ORDER BY version ASC"
        ))
        .bind(aggregate_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_event).collect()
    }

    async fn query_events(&self, query: EventQuery) -> Result<Vec<EventEnvelope>> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(SELECT_EVENTS);
        builder.push(" WHERE TRUE");

        if let Some(id) = query.aggregate_id {
            builder.push(" AND aggregate_id = ").push_bind(id.as_uuid());
        }
        if let Some(aggregate_type) = query.aggregate_type {
            builder.push(" AND aggregate_type = ").push_bind(aggregate_type);
        }
        if let Some(event_types) = query.event_types {
            builder
                .push(" AND event_type = ANY(")
                .push_bind(event_types)
                .push(")");
        }
        if let Some(from) = query.from_timestamp {
            builder.push(" AND timestamp >= ").push_bind(from);
        }
        if let Some(to) = query.to_timestamp {
            builder.push(" AND timestamp <= ").push_bind(to);
        }

        builder.push(" ORDER BY position ASC");

        if let Some(limit) = query.limit {
            builder.push(" LIMIT ").push_bind(limit as i64);
        }

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.into_iter().map(Self::row_to_event).collect()
    }

    async fn stream_all_events(&self) -> Result<EventStream> {
        use futures_util::stream;

        let rows = sqlx::query(SELECT_ALL_IN_ORDER)
            .fetch_all(&self.pool)
            .await?;
        let events: Vec<Result<EventEnvelope>> = rows.into_iter().map(Self::row_to_event).collect();

        Ok(Box::pin(stream::iter(events)))
    }

    async fn stream_events_after(&self, position: u64) -> Result<EventStream> {
        use futures_util::stream;

        let rows = sqlx::query(SELECT_AFTER_POSITION)
            .bind(i64::try_from(position).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await?;
        let events: Vec<Result<EventEnvelope>> = rows.into_iter().map(Self::row_to_event).collect();

        Ok(Box::pin(stream::iter(events)))
    }

    async fn get_aggregate_version(&self, aggregate_id: AggregateId) -> Result<Option<Version>> {
        let version: Option<i64> =
            sqlx::query_scalar("SELECT MAX(version) FROM events WHERE aggregate_id = $1")
                .bind(aggregate_id.as_uuid())
                .fetch_one(&self.pool)
                .await?;

        Ok(version.map(Version::new))
    }
}
