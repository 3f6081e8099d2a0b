//! Identifiers shared by every crate in the camp booking workspace.

mod types;

pub use types::AggregateId;
