//! Projection trait and position tracking.

use async_trait::async_trait;
use event_store::EventEnvelope;

use crate::Result;

/// Global log position of the last event a projection has handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct ProjectionPosition {
    pub last_position: u64,
}

impl ProjectionPosition {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn at(last_position: u64) -> Self {
        Self { last_position }
    }

    /// Moves forward to `event`; never moves back.
    pub fn advance_to(&self, event: &EventEnvelope) -> Self {
        Self {
            last_position: self.last_position.max(event.position),
        }
    }

    pub fn has_seen(&self, event: &EventEnvelope) -> bool {
        event.position <= self.last_position
    }
}

impl std::fmt::Display for ProjectionPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "position({})", self.last_position)
    }
}

/// Folds events from the log into a read model.
///
/// `handle` is called for every event in log order, including events of
/// aggregate types the projection ignores; it must advance its position
/// either way.
#[async_trait]
pub trait Projection: Send + Sync {
    fn name(&self) -> &'static str;

    async fn handle(&self, event: &EventEnvelope) -> Result<()>;

    async fn position(&self) -> ProjectionPosition;

    async fn reset(&self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(position: u64) -> EventEnvelope {
        let mut event = EventEnvelope::builder()
            .aggregate_id(common::AggregateId::new())
            .aggregate_type("Registration")
            .event_type("RegistrationCreated")
            .version(event_store::Version::first())
            .payload_raw(serde_json::json!({}))
            .build()
            .unwrap();
        event.position = position;
        event
    }

    #[test]
    fn position_follows_the_log_across_gaps() {
        let pos = ProjectionPosition::zero()
            .advance_to(&at(3))
            .advance_to(&at(7));
        assert_eq!(pos, ProjectionPosition::at(7));
        assert_eq!(pos.to_string(), "position(7)");

        assert!(pos.has_seen(&at(5)));
        assert!(!pos.has_seen(&at(8)));
        assert_eq!(pos.advance_to(&at(2)), pos);
    }
}
