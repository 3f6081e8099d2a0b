//! Billing action item events.

use chrono::{DateTime, Utc};
use common::AggregateId;
use domain::{CampType, DomainEvent, GuardianContact, Money};
use serde::{Deserialize, Serialize};

use crate::state::ActionType;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ActionItemEvent {
    ActionItemCreated(ActionItemCreatedData),

    /// Billing staff picked the item up.
    ActionItemStarted(ActionItemStartedData),

    ActionItemCompleted(ActionItemCompletedData),

    ActionItemCancelled(ActionItemCancelledData),
}

impl DomainEvent for ActionItemEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ActionItemEvent::ActionItemCreated(_) => "ActionItemCreated",
            ActionItemEvent::ActionItemStarted(_) => "ActionItemStarted",
            ActionItemEvent::ActionItemCompleted(_) => "ActionItemCompleted",
            ActionItemEvent::ActionItemCancelled(_) => "ActionItemCancelled",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionItemCreatedData {
    pub item_id: AggregateId,
    pub registration_id: AggregateId,
    pub child_name: String,
    /// Position in the `(registration, child)` sequence, starting at 0.
    pub ordinal: u32,
    /// Guardian contact as it was when the item was raised.
    pub guardian: GuardianContact,
    pub action_type: ActionType,
    pub amount_due: Money,
    pub amount_paid: Money,
    pub camp_type: CampType,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionItemStartedData {
    pub started_by: String,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionItemCompletedData {
    pub completed_by: String,
    pub notes: Option<String>,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionItemCancelledData {
    pub cancelled_by: String,
    pub reason: Option<String>,
    pub cancelled_at: DateTime<Utc>,
}

impl ActionItemEvent {
    pub fn started(started_by: impl Into<String>, started_at: DateTime<Utc>) -> Self {
        ActionItemEvent::ActionItemStarted(ActionItemStartedData {
            started_by: started_by.into(),
            started_at,
        })
    }

    pub fn completed(
        completed_by: impl Into<String>,
        notes: Option<String>,
        completed_at: DateTime<Utc>,
    ) -> Self {
        ActionItemEvent::ActionItemCompleted(ActionItemCompletedData {
            completed_by: completed_by.into(),
            notes,
            completed_at,
        })
    }

    pub fn cancelled(
        cancelled_by: impl Into<String>,
        reason: Option<String>,
        cancelled_at: DateTime<Utc>,
    ) -> Self {
        ActionItemEvent::ActionItemCancelled(ActionItemCancelledData {
            cancelled_by: cancelled_by.into(),
            reason,
            cancelled_at,
        })
    }
}
