//! Registration commands.

use common::AggregateId;
use serde::Deserialize;

use crate::command::Command;
use crate::money::Money;

use super::{PaymentMethod, PaymentStatus, Registration, RegistrationDraft};

#[derive(Debug, Clone)]
pub struct CreateRegistration {
    pub registration_id: AggregateId,
    pub draft: RegistrationDraft,
}

impl CreateRegistration {
    /// Wraps a draft with a freshly generated id.
    pub fn new(draft: RegistrationDraft) -> Self {
        Self {
            registration_id: AggregateId::new(),
            draft,
        }
    }
}

impl Command for CreateRegistration {
    type Aggregate = Registration;

    fn aggregate_id(&self) -> AggregateId {
        self.registration_id
    }
}

/// Payment reconciliation from an external source.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdatePaymentStatus {
    #[serde(skip, default)]
    pub registration_id: AggregateId,
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub payment_reference: Option<String>,
    #[serde(default)]
    pub amount_paid: Option<Money>,
}

impl UpdatePaymentStatus {
    pub fn new(
        registration_id: AggregateId,
        payment_status: PaymentStatus,
        payment_method: PaymentMethod,
    ) -> Self {
        Self {
            registration_id,
            payment_status,
            payment_method,
            payment_reference: None,
            amount_paid: None,
        }
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.payment_reference = Some(reference.into());
        self
    }

    pub fn with_amount_paid(mut self, amount: Money) -> Self {
        self.amount_paid = Some(amount);
        self
    }

    /// Targets `registration_id`; used after deserializing a request body.
    pub fn for_registration(mut self, registration_id: AggregateId) -> Self {
        self.registration_id = registration_id;
        self
    }
}

impl Command for UpdatePaymentStatus {
    type Aggregate = Registration;

    fn aggregate_id(&self) -> AggregateId {
        self.registration_id
    }
}

#[derive(Debug, Clone)]
pub struct CancelRegistration {
    pub registration_id: AggregateId,
    pub reason: Option<String>,
}

impl CancelRegistration {
    pub fn new(registration_id: AggregateId, reason: Option<String>) -> Self {
        Self {
            registration_id,
            reason,
        }
    }
}

impl Command for CancelRegistration {
    type Aggregate = Registration;

    fn aggregate_id(&self) -> AggregateId {
        self.registration_id
    }
}

#[derive(Debug, Clone)]
pub struct CompleteRegistration {
    pub registration_id: AggregateId,
}

impl CompleteRegistration {
    pub fn new(registration_id: AggregateId) -> Self {
        Self { registration_id }
    }
}

impl Command for CompleteRegistration {
    type Aggregate = Registration;

    fn aggregate_id(&self) -> AggregateId {
        self.registration_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_body_deserializes_without_id() {
        let id = AggregateId::new();
        let cmd: UpdatePaymentStatus = serde_json::from_value(serde_json::json!({
            "payment_status": "partial",
            "payment_method": "mobile_money",
            "amount_paid": 400000
        }))
        .unwrap();
        let cmd = cmd.for_registration(id);

        assert_eq!(cmd.aggregate_id(), id);
        assert_eq!(cmd.payment_status, PaymentStatus::Partial);
        assert_eq!(cmd.amount_paid, Some(Money::from_units(4000)));
    }
}
