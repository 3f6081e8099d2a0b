//! Domain error types.

use event_store::EventStoreError;
use thiserror::Error;

use crate::attendance::AttendanceError;
use crate::pricing::PricingError;
use crate::registration::RegistrationError;

/// How a failure should be reported to whoever triggered it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input; nothing was persisted and the caller can correct it.
    Validation,
    /// The request clashes with existing state (duplicate check-in, terminal status).
    Conflict,
    NotFound,
    /// A collaborator (storage, renderer) failed.
    Dependency,
}

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Event store error: {0}")]
    EventStore(#[from] EventStoreError),

    #[error(transparent)]
    Registration(#[from] RegistrationError),

    #[error(transparent)]
    Pricing(#[from] PricingError),

    #[error(transparent)]
    Attendance(#[from] AttendanceError),

    #[error("{aggregate_type} not found: {aggregate_id}")]
    NotFound {
        aggregate_type: &'static str,
        aggregate_id: String,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DomainError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::EventStore(e) if e.is_conflict() => ErrorKind::Conflict,
            DomainError::EventStore(_) | DomainError::Serialization(_) => ErrorKind::Dependency,
            DomainError::Registration(e) => e.kind(),
            DomainError::Pricing(_) => ErrorKind::Validation,
            DomainError::Attendance(e) => e.kind(),
            DomainError::NotFound { .. } => ErrorKind::NotFound,
        }
    }

    pub fn not_found(aggregate_type: &'static str, aggregate_id: impl ToString) -> Self {
        DomainError::NotFound {
            aggregate_type,
            aggregate_id: aggregate_id.to_string(),
        }
    }
}
