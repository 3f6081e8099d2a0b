//! Registration domain events.

use chrono::{DateTime, Utc};
use common::AggregateId;
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;
use crate::catalog::CampType;
use crate::money::Money;

use super::{Child, GuardianContact, PaymentMethod, PaymentStatus, RegistrationType};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum RegistrationEvent {
    RegistrationCreated(RegistrationCreatedData),
    PaymentStatusUpdated(PaymentStatusUpdatedData),
    RegistrationCancelled(RegistrationCancelledData),
    RegistrationCompleted(RegistrationCompletedData),
}

impl DomainEvent for RegistrationEvent {
    fn event_type(&self) -> &'static str {
        match self {
            RegistrationEvent::RegistrationCreated(_) => "RegistrationCreated",
            RegistrationEvent::PaymentStatusUpdated(_) => "PaymentStatusUpdated",
            RegistrationEvent::RegistrationCancelled(_) => "RegistrationCancelled",
            RegistrationEvent::RegistrationCompleted(_) => "RegistrationCompleted",
        }
    }
}

/// The full registration as priced at creation. Prices are never recomputed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationCreatedData {
    pub registration_id: AggregateId,
    pub registration_number: String,
    pub camp_type: CampType,
    pub guardian: GuardianContact,
    pub children: Vec<Child>,
    pub total_amount: Money,
    pub amount_paid: Money,
    pub payment_status: PaymentStatus,
    pub payment_method: PaymentMethod,
    pub payment_reference: Option<String>,
    pub registration_type: RegistrationType,
    pub identity_token: String,
    pub consent_given: bool,
    pub admin_notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentStatusUpdatedData {
    pub payment_status: PaymentStatus,
    pub payment_method: PaymentMethod,
    pub payment_reference: Option<String>,
    pub amount_paid: Money,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationCancelledData {
    pub reason: Option<String>,
    pub cancelled_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationCompletedData {
    pub completed_at: DateTime<Utc>,
}

impl RegistrationEvent {
    pub fn payment_status_updated(
        payment_status: PaymentStatus,
        payment_method: PaymentMethod,
        payment_reference: Option<String>,
        amount_paid: Money,
        updated_at: DateTime<Utc>,
    ) -> Self {
        RegistrationEvent::PaymentStatusUpdated(PaymentStatusUpdatedData {
            payment_status,
            payment_method,
            payment_reference,
            amount_paid,
            updated_at,
        })
    }

    pub fn cancelled(reason: Option<String>, cancelled_at: DateTime<Utc>) -> Self {
        RegistrationEvent::RegistrationCancelled(RegistrationCancelledData {
            reason,
            cancelled_at,
        })
    }

    pub fn completed(completed_at: DateTime<Utc>) -> Self {
        RegistrationEvent::RegistrationCompleted(RegistrationCompletedData { completed_at })
    }
}
