use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    AggregateId, EventEnvelope, EventQuery, EventStoreError, Result, Version,
    store::{AppendOptions, EventStore, EventStream, validate_events_for_append},
};

#[derive(Default)]
struct Log {
    /// Global log in insertion order.
    events: Vec<EventEnvelope>,
    /// Latest version per stream.
    heads: HashMap<AggregateId, Version>,
}

/// Event store held entirely in process memory.
///
/// Behaves like the PostgreSQL store, including the per-stream version
/// uniqueness that the attendance and billing streams rely on.
#[derive(Clone, Default)]
pub struct InMemoryEventStore {
    log: Arc<RwLock<Log>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn event_count(&self) -> usize {
        self.log.read().await.events.len()
    }

    pub async fn clear(&self) {
        let mut log = self.log.write().await;
        log.events.clear();
        log.heads.clear();
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn append(&self, mut events: Vec<EventEnvelope>, options: AppendOptions) -> Result<Version> {
        validate_events_for_append(&events)?;

        let aggregate_id = events[0].aggregate_id;
        let first_version = events[0].version;
        let last_version = events[events.len() - 1].version;

        let mut log = self.log.write().await;
        let current = log
            .heads
            .get(&aggregate_id)
            .copied()
            .unwrap_or(Version::initial());

        if let Some(expected) = options.expected_version
            && current != expected
        {
            return Err(EventStoreError::ConcurrencyConflict {
                aggregate_id,
                expected,
                actual: current,
            });
        }

        // Same rule as the unique (aggregate_id, version) constraint.
        if first_version <= current {
            return Err(EventStoreError::ConcurrencyConflict {
                aggregate_id,
                expected: options.expected_version.unwrap_or(current),
                actual: current,
            });
        }

        metrics::counter!("events_appended_total").increment(events.len() as u64);
        let mut position = log.events.len() as u64;
        for event in &mut events {
            position += 1;
            event.position = position;
        }
        log.heads.insert(aggregate_id, last_version);
        log.events.extend(events);

        Ok(last_version)
    }

    async fn get_events_for_aggregate(
        &self,
        aggregate_id: AggregateId,
    ) -> Result<Vec<EventEnvelope>> {
        let log = self.log.read().await;
        let mut events: Vec<_> = log
            .events
            .iter()
            .filter(|e| e.aggregate_id == aggregate_id)
            .cloned()
            .collect();
        events.sort_by_key(|e| e.version);
        Ok(events)
    }

    async fn query_events(&self, query: EventQuery) -> Result<Vec<EventEnvelope>> {
        let log = self.log.read().await;
        let matching = log.events.iter().filter(|e| query.matches(e)).cloned();

        Ok(match query.limit {
            Some(limit) => matching.take(limit).collect(),
            None => matching.collect(),
        })
    }

    async fn stream_all_events(&self) -> Result<EventStream> {
        use futures_util::stream;

        let events = self.log.read().await.events.clone();
        Ok(Box::pin(stream::iter(events.into_iter().map(Ok))))
    }

    async fn stream_events_after(&self, position: u64) -> Result<EventStream> {
        use futures_util::stream;

        // Position n is stored at index n - 1.
        let events: Vec<_> = self
            .log
            .read()
            .await
            .events
            .iter()
            .skip(position as usize)
            .cloned()
            .collect();
        Ok(Box::pin(stream::iter(events.into_iter().map(Ok))))
    }

    async fn get_aggregate_version(&self, aggregate_id: AggregateId) -> Result<Option<Version>> {
        Ok(self.log.read().await.heads.get(&aggregate_id).copied())
    }
}
