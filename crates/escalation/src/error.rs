//! Escalation error types.

use common::AggregateId;
use domain::{DomainError, ErrorKind};
use event_store::EventStoreError;
use thiserror::Error;

use crate::state::ActionItemStatus;

#[derive(Debug, Error)]
pub enum EscalationError {
    #[error("Cannot {action} a {current} billing item")]
    InvalidTransition {
        current: ActionItemStatus,
        action: &'static str,
    },

    #[error("Billing item already created")]
    AlreadyCreated,

    #[error("Billing item not found")]
    NotCreated,

    #[error("Billing item not found: {0}")]
    ItemNotFound(AggregateId),

    #[error("Field {0} must not be empty")]
    MissingField(&'static str),

    /// The billing notifier failed. Never surfaced by check-in.
    #[error("Billing notification failed: {0}")]
    Notifier(String),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Event store error: {0}")]
    EventStore(#[from] EventStoreError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EscalationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EscalationError::InvalidTransition { .. } | EscalationError::AlreadyCreated => {
                ErrorKind::Conflict
            }
            EscalationError::NotCreated | EscalationError::ItemNotFound(_) => ErrorKind::NotFound,
            EscalationError::MissingField(_) => ErrorKind::Validation,
            EscalationError::Domain(e) => e.kind(),
            EscalationError::EventStore(e) if e.is_conflict() => ErrorKind::Conflict,
            EscalationError::Notifier(_)
            | EscalationError::EventStore(_)
            | EscalationError::Serialization(_) => ErrorKind::Dependency,
        }
    }
}

pub type Result<T> = std::result::Result<T, EscalationError>;
