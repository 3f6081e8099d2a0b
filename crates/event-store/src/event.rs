use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AggregateId, EventStoreError};

/// Unique identifier for a stored event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(Uuid);

impl EventId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Position of an event inside its stream.
///
/// A stream with no events is at version 0; its first event is version 1.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Version(i64);

impl Version {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Version of a stream that does not exist yet.
    pub fn initial() -> Self {
        Self(0)
    }

    /// Version of the first event in a stream.
    pub fn first() -> Self {
        Self(1)
    }

    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A persisted event with its stream coordinates and metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub event_id: EventId,

    /// Event name, e.g. `"RegistrationCreated"` or `"ChildCheckedIn"`.
    pub event_type: String,

    /// Stream the event belongs to.
    pub aggregate_id: AggregateId,

    /// Kind of stream, e.g. `"Registration"`, `"AttendanceRecord"`.
    pub aggregate_type: String,

    pub version: Version,

    pub timestamp: DateTime<Utc>,

    /// Serialized domain event.
    pub payload: serde_json::Value,

    /// Free-form context such as the acting staff member.
    pub metadata: HashMap<String, serde_json::Value>,

    /// Place in the global log, assigned by the store. Zero until persisted.
    #[serde(default)]
    pub position: u64,
}

impl EventEnvelope {
    pub fn builder() -> EventEnvelopeBuilder {
        EventEnvelopeBuilder::default()
    }
}

/// Builder for [`EventEnvelope`].
#[derive(Debug, Default)]
pub struct EventEnvelopeBuilder {
    event_type: Option<String>,
    aggregate_id: Option<AggregateId>,
    aggregate_type: Option<String>,
    version: Option<Version>,
    payload: Option<serde_json::Value>,
    metadata: HashMap<String, serde_json::Value>,
}

impl EventEnvelopeBuilder {
    pub fn event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = Some(event_type.into());
        self
    }

    pub fn aggregate_id(mut self, id: AggregateId) -> Self {
        self.aggregate_id = Some(id);
        self
    }

    pub fn aggregate_type(mut self, aggregate_type: impl Into<String>) -> Self {
        self.aggregate_type = Some(aggregate_type.into());
        self
    }

    pub fn version(mut self, version: Version) -> Self {
        self.version = Some(version);
        self
    }

    /// Serializes `payload` into the envelope.
    pub fn payload<T: Serialize>(mut self, payload: &T) -> Result<Self, serde_json::Error> {
        self.payload = Some(serde_json::to_value(payload)?);
        Ok(self)
    }

    pub fn payload_raw(mut self, payload: serde_json::Value) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Builds the envelope with a fresh id and the current time, failing if a
    /// required coordinate is missing.
    pub fn build(self) -> Result<EventEnvelope, EventStoreError> {
        let missing = |field: &str| EventStoreError::InvalidAppend(format!("{field} is required"));

        Ok(EventEnvelope {
            event_id: EventId::new(),
            event_type: self.event_type.ok_or_else(|| missing("event_type"))?,
            aggregate_id: self.aggregate_id.ok_or_else(|| missing("aggregate_id"))?,
            aggregate_type: self.aggregate_type.ok_or_else(|| missing("aggregate_type"))?,
            version: self.version.ok_or_else(|| missing("version"))?,
            timestamp: Utc::now(),
            payload: self.payload.ok_or_else(|| missing("payload"))?,
            metadata: self.metadata,
            position: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_ordering_and_successor() {
        assert!(Version::new(1) < Version::new(2));
        assert_eq!(Version::initial().next(), Version::first());
        assert_eq!(Version::first().as_i64(), 1);
    }

    #[test]
    fn builder_sets_all_coordinates() {
        let stream = AggregateId::new();
        let envelope = EventEnvelope::builder()
            .event_type("ChildCheckedIn")
            .aggregate_id(stream)
            .aggregate_type("AttendanceRecord")
            .version(Version::first())
            .payload_raw(serde_json::json!({"child_name": "Amani"}))
            .metadata("marked_by", serde_json::json!("gate-1"))
            .build()
            .unwrap();

        assert_eq!(envelope.event_type, "ChildCheckedIn");
        assert_eq!(envelope.aggregate_id, stream);
        assert_eq!(envelope.aggregate_type, "AttendanceRecord");
        assert_eq!(envelope.version, Version::first());
        assert_eq!(envelope.position, 0);
        assert_eq!(
            envelope.metadata.get("marked_by"),
            Some(&serde_json::json!("gate-1"))
        );
    }

    #[test]
    fn builder_reports_missing_fields() {
        let err = EventEnvelope::builder()
            .event_type("RegistrationCreated")
            .build()
            .unwrap_err();
        assert!(matches!(err, EventStoreError::InvalidAppend(msg) if msg.contains("aggregate_id")));
    }
}
