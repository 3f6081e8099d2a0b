use chrono::{DateTime, Utc};

use crate::{AggregateId, EventEnvelope};

/// Filter over the global event log.
///
/// Unset fields match everything. Results are returned in insertion order.
#[derive(Debug, Clone, Default)]
pub struct EventQuery {
    pub aggregate_id: Option<AggregateId>,
    pub aggregate_type: Option<String>,
    /// Any of these event types.
    pub event_types: Option<Vec<String>>,
    /// Inclusive lower bound on the event timestamp.
    pub from_timestamp: Option<DateTime<Utc>>,
    /// Inclusive upper bound on the event timestamp.
    pub to_timestamp: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
}

impl EventQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_aggregate_type(aggregate_type: impl Into<String>) -> Self {
        Self {
            aggregate_type: Some(aggregate_type.into()),
            ..Default::default()
        }
    }

    pub fn aggregate_id(mut self, id: AggregateId) -> Self {
        self.aggregate_id = Some(id);
        self
    }

    pub fn aggregate_type(mut self, aggregate_type: impl Into<String>) -> Self {
        self.aggregate_type = Some(aggregate_type.into());
        self
    }

    pub fn event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_types = Some(vec![event_type.into()]);
        self
    }

    pub fn event_types(mut self, event_types: Vec<String>) -> Self {
        self.event_types = Some(event_types);
        self
    }

    pub fn from_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.from_timestamp = Some(timestamp);
        self
    }

    pub fn to_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.to_timestamp = Some(timestamp);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Returns true if `event` passes every filter except `limit`.
    pub fn matches(&self, event: &EventEnvelope) -> bool {
        if let Some(id) = self.aggregate_id
            && event.aggregate_id != id
        {
            return false;
        }
        if let Some(kind) = &self.aggregate_type
            && &event.aggregate_type != kind
        {
            return false;
        }
        if let Some(types) = &self.event_types
            && !types.contains(&event.event_type)
        {
            return false;
        }
        if let Some(from) = self.from_timestamp
            && event.timestamp < from
        {
            return false;
        }
        if let Some(to) = self.to_timestamp
            && event.timestamp > to
        {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Version;

    fn envelope(aggregate_type: &str, event_type: &str) -> EventEnvelope {
        EventEnvelope::builder()
            .event_type(event_type)
            .aggregate_id(AggregateId::new())
            .aggregate_type(aggregate_type)
            .version(Version::first())
            .payload_raw(serde_json::json!({}))
            .build()
            .unwrap()
    }

    #[test]
    fn empty_query_matches_everything() {
        assert!(EventQuery::new().matches(&envelope("Registration", "RegistrationCreated")));
    }

    #[test]
    fn filters_by_aggregate_and_event_type() {
        let query = EventQuery::for_aggregate_type("AttendanceRecord").event_types(vec![
            "ChildCheckedIn".to_string(),
            "ChildCheckedOut".to_string(),
        ]);

        assert!(query.matches(&envelope("AttendanceRecord", "ChildCheckedIn")));
        assert!(!query.matches(&envelope("AttendanceRecord", "Unrelated")));
        assert!(!query.matches(&envelope("Registration", "ChildCheckedIn")));
    }

    #[test]
    fn timestamp_bounds_are_inclusive() {
        let event = envelope("Registration", "RegistrationCreated");
        let query = EventQuery::new()
            .from_timestamp(event.timestamp)
            .to_timestamp(event.timestamp);
        assert!(query.matches(&event));

        let later = EventQuery::new().from_timestamp(event.timestamp + chrono::Duration::seconds(1));
        assert!(!later.matches(&event));
    }
}
