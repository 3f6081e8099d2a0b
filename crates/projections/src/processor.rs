//! Projection processor for feeding events to projections.

use std::sync::Arc;

use event_store::{EventEnvelope, EventStore};
use futures_util::StreamExt;
use tokio::sync::Mutex;

use crate::Result;
use crate::projection::Projection;

/// Replays the event log into registered projections.
///
/// - Catch-up: delivers every event past a projection's log position
/// - Single event delivery
/// - Rebuild: resets every projection and replays from scratch
///
/// Catch-up runs are serialized, so concurrent queries that each trigger one
/// never deliver the same event twice. Projections are compared against the
/// global position of each event, never against how many events were read,
/// so gaps in the log do not shift anything.
pub struct ProjectionProcessor<S: EventStore> {
    store: S,
    projections: Vec<Arc<dyn Projection>>,
    catch_up: Mutex<()>,
}

impl<S: EventStore> ProjectionProcessor<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            projections: Vec::new(),
            catch_up: Mutex::new(()),
        }
    }

    pub fn register(&mut self, projection: Arc<dyn Projection>) {
        self.projections.push(projection);
    }

    pub fn projection_count(&self) -> usize {
        self.projections.len()
    }

    #[tracing::instrument(skip(self))]
    pub async fn run_catch_up(&self) -> Result<()> {
        let _guard = self.catch_up.lock().await;
        self.deliver_missing().await
    }

    #[tracing::instrument(skip(self, event), fields(event_type = %event.event_type))]
    pub async fn process_event(&self, event: &EventEnvelope) -> Result<()> {
        for projection in &self.projections {
            projection.handle(event).await?;
        }
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub async fn rebuild_all(&self) -> Result<()> {
        let _guard = self.catch_up.lock().await;
        for projection in &self.projections {
            projection.reset().await?;
        }
        self.deliver_missing().await
    }

    async fn deliver_missing(&self) -> Result<()> {
        let mut from = u64::MAX;
        for projection in &self.projections {
            from = from.min(projection.position().await.last_position);
        }
        if from == u64::MAX {
            return Ok(());
        }

        let mut stream = self.store.stream_events_after(from).await?;
        let mut read: u64 = 0;
        let mut delivered: u64 = 0;

        while let Some(result) = stream.next().await {
            let event = result?;
            read += 1;

            for projection in &self.projections {
                if !projection.position().await.has_seen(&event) {
                    projection.handle(&event).await?;
                    delivered += 1;
                    metrics::counter!("projections_events_processed").increment(1);
                }
            }
        }

        tracing::debug!(from, read, delivered, "catch-up complete");
        Ok(())
    }
}
