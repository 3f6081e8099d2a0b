//! Event persistence for the camp booking workspace.
//!
//! Every record kind (registration, attendance record, billing action item)
//! is an append-only stream of events. The pair `(aggregate_id, version)` is
//! unique in every backend, which is the storage-level guarantee the domain
//! relies on for "at most one attendance record per child per day" and
//! "at most one pending billing item per child".

pub mod error;
pub mod event;
pub mod memory;
pub mod postgres;
pub mod query;
pub mod store;

pub use common::AggregateId;
pub use error::{EventStoreError, Result};
pub use event::{EventEnvelope, EventEnvelopeBuilder, EventId, Version};
pub use memory::InMemoryEventStore;
pub use postgres::PostgresEventStore;
pub use query::EventQuery;
pub use store::{AppendOptions, EventStore, EventStoreExt, EventStream};
