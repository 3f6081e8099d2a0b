//! Registration aggregate.

use chrono::{DateTime, Utc};
use common::AggregateId;
use event_store::Version;

use crate::aggregate::Aggregate;
use crate::catalog::{CampCatalog, CampType};
use crate::money::Money;
use crate::pricing::PricedSelection;

use super::events::{PaymentStatusUpdatedData, RegistrationCreatedData};
use super::value_objects::{child_key, registration_number};
use super::{
    Child, GuardianContact, PaymentMethod, PaymentStatus, RegistrationDraft, RegistrationError,
    RegistrationEvent, RegistrationStatus, RegistrationType, token,
};

/// One guardian's booking, owning its children.
#[derive(Debug, Clone, Default)]
pub struct Registration {
    id: Option<AggregateId>,
    version: Version,
    registration_number: String,
    camp_type: Option<CampType>,
    guardian: Option<GuardianContact>,
    children: Vec<Child>,
    total_amount: Money,
    amount_paid: Money,
    payment_status: PaymentStatus,
    payment_method: PaymentMethod,
    payment_reference: Option<String>,
    registration_type: RegistrationType,
    identity_token: String,
    consent_given: bool,
    status: RegistrationStatus,
    admin_notes: Option<String>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

impl Aggregate for Registration {
    type Event = RegistrationEvent;
    type Error = RegistrationError;

    fn aggregate_type() -> &'static str {
        "Registration"
    }

    fn id(&self) -> Option<AggregateId> {
        self.id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    fn apply(&mut self, event: Self::Event) {
        match event {
            RegistrationEvent::RegistrationCreated(data) => self.apply_created(data),
            RegistrationEvent::PaymentStatusUpdated(data) => self.apply_payment(data),
            RegistrationEvent::RegistrationCancelled(data) => {
                self.status = RegistrationStatus::Cancelled;
                self.updated_at = Some(data.cancelled_at);
            }
            RegistrationEvent::RegistrationCompleted(data) => {
                self.status = RegistrationStatus::Completed;
                self.updated_at = Some(data.completed_at);
            }
        }
    }
}

// Query methods
impl Registration {
    pub fn registration_number(&self) -> &str {
        &self.registration_number
    }

    pub fn camp_type(&self) -> Option<CampType> {
        self.camp_type
    }

    pub fn guardian(&self) -> Option<&GuardianContact> {
        self.guardian.as_ref()
    }

    pub fn children(&self) -> &[Child] {
        &self.children
    }

    /// Looks a child up by name, ignoring case and surrounding whitespace.
    pub fn child(&self, child_name: &str) -> Option<&Child> {
        let wanted = child_key(child_name);
        self.children
            .iter()
            .find(|c| child_key(&c.child_name) == wanted)
    }

    pub fn total_amount(&self) -> Money {
        self.total_amount
    }

    pub fn amount_paid(&self) -> Money {
        self.amount_paid
    }

    pub fn amount_due(&self) -> Money {
        self.total_amount.saturating_sub(self.amount_paid)
    }

    pub fn payment_status(&self) -> PaymentStatus {
        self.payment_status
    }

    pub fn payment_method(&self) -> PaymentMethod {
        self.payment_method
    }

    pub fn payment_reference(&self) -> Option<&str> {
        self.payment_reference.as_deref()
    }

    pub fn registration_type(&self) -> RegistrationType {
        self.registration_type
    }

    pub fn identity_token(&self) -> &str {
        &self.identity_token
    }

    pub fn consent_given(&self) -> bool {
        self.consent_given
    }

    pub fn status(&self) -> RegistrationStatus {
        self.status
    }

    pub fn admin_notes(&self) -> Option<&str> {
        self.admin_notes.as_deref()
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }
}

// Command methods (return events)
impl Registration {
    /// Validates and prices a draft, producing the creation event.
    ///
    /// Nothing is returned unless the draft is complete, consented and every
    /// selected date exists in the offering's catalog.
    pub fn create(
        &self,
        registration_id: AggregateId,
        draft: &RegistrationDraft,
        catalog: &CampCatalog,
        now: DateTime<Utc>,
    ) -> Result<Vec<RegistrationEvent>, RegistrationError> {
        if self.id.is_some() {
            return Err(RegistrationError::AlreadyCreated);
        }
        draft.validate()?;

        let sessions = catalog.offering(draft.camp_type)?;
        let mut children = Vec::with_capacity(draft.children.len());
        for child in &draft.children {
            let selection = PricedSelection::price(
                &child.selected_dates,
                &child.session_type_by_date,
                sessions,
            )?;
            children.push(Child::from_priced(child, &selection));
        }
        let total_amount: Money = children.iter().map(|c| c.price).sum();

        let amount_paid =
            draft
                .payment_status
                .amount_paid(total_amount, draft.amount_paid, Money::zero());
        check_amount_paid(amount_paid, total_amount)?;

        Ok(vec![RegistrationEvent::RegistrationCreated(
            RegistrationCreatedData {
                registration_id,
                registration_number: registration_number(registration_id, now),
                camp_type: draft.camp_type,
                guardian: trimmed(&draft.guardian),
                children,
                total_amount,
                amount_paid,
                payment_status: draft.payment_status,
                payment_method: draft.payment_method,
                payment_reference: draft.payment_reference.clone(),
                registration_type: draft.registration_type,
                identity_token: token::encode(registration_id, now),
                consent_given: draft.consent_given,
                admin_notes: draft.admin_notes.clone(),
                created_at: now,
            },
        )])
    }

    /// Records a payment reconciliation. Prices are not touched.
    pub fn update_payment_status(
        &self,
        payment_status: PaymentStatus,
        payment_method: PaymentMethod,
        payment_reference: Option<String>,
        amount_paid: Option<Money>,
        now: DateTime<Utc>,
    ) -> Result<Vec<RegistrationEvent>, RegistrationError> {
        self.ensure_created()?;

        let amount_paid =
            payment_status.amount_paid(self.total_amount, amount_paid, self.amount_paid);
        check_amount_paid(amount_paid, self.total_amount)?;

        Ok(vec![RegistrationEvent::payment_status_updated(
            payment_status,
            payment_method,
            payment_reference,
            amount_paid,
            now,
        )])
    }

    pub fn cancel(
        &self,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Vec<RegistrationEvent>, RegistrationError> {
        self.ensure_created()?;
        if !self.status.can_cancel() {
            return Err(RegistrationError::InvalidStateTransition {
                current: self.status,
                action: "cancel",
            });
        }
        Ok(vec![RegistrationEvent::cancelled(reason, now)])
    }

    pub fn complete(&self, now: DateTime<Utc>) -> Result<Vec<RegistrationEvent>, RegistrationError> {
        self.ensure_created()?;
        if !self.status.can_complete() {
            return Err(RegistrationError::InvalidStateTransition {
                current: self.status,
                action: "complete",
            });
        }
        Ok(vec![RegistrationEvent::completed(now)])
    }

    fn ensure_created(&self) -> Result<(), RegistrationError> {
        if self.id.is_none() {
            return Err(RegistrationError::NotCreated);
        }
        Ok(())
    }
}

// Event application
impl Registration {
    fn apply_created(&mut self, data: RegistrationCreatedData) {
        self.id = Some(data.registration_id);
        self.registration_number = data.registration_number;
        self.camp_type = Some(data.camp_type);
        self.guardian = Some(data.guardian);
        self.children = data.children;
        self.total_amount = data.total_amount;
        self.amount_paid = data.amount_paid;
        self.payment_status = data.payment_status;
        self.payment_method = data.payment_method;
        self.payment_reference = data.payment_reference;
        self.registration_type = data.registration_type;
        self.identity_token = data.identity_token;
        self.consent_given = data.consent_given;
        self.admin_notes = data.admin_notes;
        self.status = RegistrationStatus::Active;
        self.created_at = Some(data.created_at);
        self.updated_at = Some(data.created_at);
    }

    fn apply_payment(&mut self, data: PaymentStatusUpdatedData) {
        self.payment_status = data.payment_status;
        self.payment_method = data.payment_method;
        self.payment_reference = data.payment_reference;
        self.amount_paid = data.amount_paid;
        self.updated_at = Some(data.updated_at);
    }
}

fn check_amount_paid(amount_paid: Money, total: Money) -> Result<(), RegistrationError> {
    if amount_paid.is_negative() || amount_paid > total {
        return Err(RegistrationError::InvalidAmountPaid { amount_paid, total });
    }
    Ok(())
}

fn trimmed(guardian: &GuardianContact) -> GuardianContact {
    GuardianContact {
        parent_name: guardian.parent_name.trim().to_string(),
        email: guardian.email.trim().to_string(),
        phone: guardian.phone.trim().to_string(),
        emergency_contact: guardian.emergency_contact.clone(),
    }
}
